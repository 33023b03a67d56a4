//! Optimistic list cache for one admin resource
//!
//! Mutations rewrite the cached list before the server answers:
//!
//! - **create**: a provisional entity with a negative id is inserted first
//! - **update**: the entity is replaced in place
//! - **delete**: the entity is removed
//!
//! A rejected mutation restores the list it replaced. Either way the list is
//! marked stale and refetched once the request settles, and a notification
//! is shown for [`TOAST_TTL`].

use crate::toast::{TOAST_TTL, ToastKind, Toasts};
use bookflow_client::{BackendFuture, Page, Resource, ResourceBackend};
use bookflow_core::{
    SmallVec, async_effect, delay,
    effect::Effect,
    optimistic::{MutationId, Optimistic},
    reducer::Reducer,
    smallvec,
};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

// ============================================================================
// Actions
// ============================================================================

/// Kind of mutation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Create from a draft
    Create,
    /// Replace an entity
    Update,
    /// Delete by id
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// Server answer to a successful mutation
#[derive(Clone, Debug)]
pub enum Settled<R: Resource> {
    /// The server created `entity` for the provisional one
    Created {
        /// Temporary id shown until now
        provisional: R::Id,
        /// Entity as stored by the server
        entity: R,
    },
    /// The server stored `entity`
    Updated {
        /// Entity as stored by the server
        entity: R,
    },
    /// The server deleted the entity
    Deleted {
        /// Deleted id
        id: R::Id,
    },
}

impl<R: Resource> Settled<R> {
    fn kind(&self) -> MutationKind {
        match self {
            Self::Created { .. } => MutationKind::Create,
            Self::Updated { .. } => MutationKind::Update,
            Self::Deleted { .. } => MutationKind::Delete,
        }
    }
}

/// Actions for a resource cache
#[derive(Clone, Debug)]
pub enum ResourceAction<R: Resource> {
    // ===== Fetching =====
    /// Load the list with new filters
    Fetch {
        /// Filters
        query: R::Query,
    },

    /// Load the list again with the current filters
    Refetch,

    /// A page arrived
    Fetched {
        /// Server page
        page: Page<R>,
    },

    /// The list could not be loaded
    FetchFailed {
        /// Reason
        error: String,
    },

    // ===== Mutations =====
    /// Create an entity
    Create {
        /// Create payload
        draft: R::Draft,
    },

    /// Replace an entity
    Update {
        /// New version
        entity: R,
    },

    /// Delete an entity
    Delete {
        /// Entity id
        id: R::Id,
    },

    /// The server accepted a mutation
    MutationSucceeded {
        /// Mutation
        mutation: MutationId,
        /// Server answer
        outcome: Settled<R>,
    },

    /// The server rejected a mutation
    MutationFailed {
        /// Mutation
        mutation: MutationId,
        /// Kind of mutation
        kind: MutationKind,
        /// Reason
        error: String,
    },

    // ===== Notifications =====
    /// Hide a notification
    DismissToast {
        /// Notification id
        id: u64,
    },
}

// ============================================================================
// State
// ============================================================================

/// Cached list of one resource
#[derive(Clone, Debug)]
pub struct ResourceState<R: Resource> {
    /// Cached entities, possibly speculative
    pub items: Optimistic<Vec<R>>,
    /// Filters of the last fetch
    pub query: R::Query,
    /// Total matching records on the server
    pub count: u64,
    /// Whether the server has another page
    pub has_next: bool,
    /// A fetch is in flight
    pub loading: bool,
    /// Last fetch failure
    pub last_error: Option<String>,
    /// Mutations waiting for a server answer
    pub pending: BTreeMap<MutationId, MutationKind>,
    /// Visible notifications
    pub toasts: Toasts,
    next_provisional: i64,
}

impl<R: Resource> Default for ResourceState<R> {
    fn default() -> Self {
        Self {
            items: Optimistic::new(Vec::new()),
            query: R::Query::default(),
            count: 0,
            has_next: false,
            loading: false,
            last_error: None,
            pending: BTreeMap::new(),
            toasts: Toasts::default(),
            next_provisional: 0,
        }
    }
}

impl<R: Resource> ResourceState<R> {
    /// Cache already holding `items`
    #[must_use]
    pub fn with_items(items: Vec<R>) -> Self {
        Self {
            count: items.len() as u64,
            items: Optimistic::new(items),
            ..Self::default()
        }
    }

    /// Entities to display
    #[must_use]
    pub fn list(&self) -> &[R] {
        self.items.value()
    }

    /// Entity by id
    #[must_use]
    pub fn get(&self, id: R::Id) -> Option<&R> {
        self.list().iter().find(|entity| entity.id() == id)
    }

    /// Temporary id for the next created entity, never a server id
    fn provisional_id(&mut self) -> R::Id {
        self.next_provisional -= 1;
        R::Id::from(self.next_provisional)
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of a resource cache
#[derive(Clone)]
pub struct ResourceEnvironment<R: Resource> {
    /// CRUD backend
    pub backend: Arc<dyn ResourceBackend<R>>,
    /// How long notifications stay visible
    pub toast_ttl: Duration,
}

impl<R: Resource> ResourceEnvironment<R> {
    /// Creates a new `ResourceEnvironment`
    #[must_use]
    pub fn new(backend: Arc<dyn ResourceBackend<R>>) -> Self {
        Self {
            backend,
            toast_ttl: TOAST_TTL,
        }
    }

    /// Override the notification lifetime
    #[must_use]
    pub fn with_toast_ttl(mut self, toast_ttl: Duration) -> Self {
        self.toast_ttl = toast_ttl;
        self
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for a resource cache
pub struct ResourceReducer<R> {
    resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceReducer<R> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for ResourceReducer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceReducer").finish()
    }
}

impl<R> Default for ResourceReducer<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> ResourceReducer<R> {
    /// Creates a new `ResourceReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceReducer<R> {
    fn fetch(env: &ResourceEnvironment<R>, query: R::Query) -> Effect<ResourceAction<R>> {
        let request = env.backend.list(query);
        async_effect! {
            Some(match request.await {
                Ok(page) => ResourceAction::Fetched { page },
                Err(error) => ResourceAction::FetchFailed {
                    error: error.to_string(),
                },
            })
        }
    }

    fn mutate<T, F>(
        mutation: MutationId,
        kind: MutationKind,
        request: BackendFuture<T>,
        on_success: F,
    ) -> Effect<ResourceAction<R>>
    where
        T: Send + 'static,
        F: FnOnce(T) -> Settled<R> + Send + 'static,
    {
        async_effect! {
            Some(match request.await {
                Ok(value) => ResourceAction::MutationSucceeded {
                    mutation,
                    outcome: on_success(value),
                },
                Err(error) => ResourceAction::MutationFailed {
                    mutation,
                    kind,
                    error: error.to_string(),
                },
            })
        }
    }

    /// Stale list, notification and refetch once a mutation settles
    fn settle(
        state: &mut ResourceState<R>,
        env: &ResourceEnvironment<R>,
        kind: ToastKind,
        message: String,
    ) -> SmallVec<[Effect<ResourceAction<R>>; 4]> {
        state.items.invalidate();
        state.loading = true;
        let toast = state.toasts.push(kind, message);

        smallvec![
            Self::fetch(env, state.query.clone()),
            delay! {
                duration: env.toast_ttl,
                action: ResourceAction::DismissToast { id: toast }
            },
        ]
    }
}

impl<R: Resource> Reducer for ResourceReducer<R> {
    type State = ResourceState<R>;
    type Action = ResourceAction<R>;
    type Environment = ResourceEnvironment<R>;

    #[allow(clippy::too_many_lines)] // One arm per cache action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Fetching ==========
            ResourceAction::Fetch { query } => {
                debug!(resource = R::LABEL, ?query, "Fetching");
                state.query = query.clone();
                state.loading = true;
                smallvec![Self::fetch(env, query)]
            },

            ResourceAction::Refetch => {
                state.loading = true;
                smallvec![Self::fetch(env, state.query.clone())]
            },

            ResourceAction::Fetched { page } => {
                state.loading = false;
                state.last_error = None;
                state.count = page.count;
                state.has_next = page.has_next();
                state.items.reconcile(page.results);
                SmallVec::new()
            },

            ResourceAction::FetchFailed { error } => {
                warn!(resource = R::LABEL, %error, "Fetch failed");
                state.loading = false;
                state.last_error = Some(error);
                SmallVec::new()
            },

            // ========== Mutations ==========
            ResourceAction::Create { draft } => {
                let provisional = state.provisional_id();
                let entity = R::provisional(&draft, provisional);
                let mutation = state.items.speculate(|list| list.insert(0, entity));
                state.pending.insert(mutation, MutationKind::Create);
                debug!(resource = R::LABEL, %mutation, %provisional, "Creating");

                smallvec![Self::mutate(
                    mutation,
                    MutationKind::Create,
                    env.backend.create(draft),
                    move |entity| Settled::Created {
                        provisional,
                        entity
                    },
                )]
            },

            ResourceAction::Update { entity } => {
                let id = entity.id();
                let replacement = entity.clone();
                let mutation = state.items.speculate(|list| {
                    if let Some(slot) = list.iter_mut().find(|item| item.id() == id) {
                        *slot = replacement;
                    }
                });
                state.pending.insert(mutation, MutationKind::Update);
                debug!(resource = R::LABEL, %mutation, %id, "Updating");

                smallvec![Self::mutate(
                    mutation,
                    MutationKind::Update,
                    env.backend.update(entity),
                    |entity| Settled::Updated { entity },
                )]
            },

            ResourceAction::Delete { id } => {
                let mutation = state.items.speculate(|list| list.retain(|item| item.id() != id));
                state.pending.insert(mutation, MutationKind::Delete);
                debug!(resource = R::LABEL, %mutation, %id, "Deleting");

                smallvec![Self::mutate(
                    mutation,
                    MutationKind::Delete,
                    env.backend.delete(id),
                    move |()| Settled::Deleted { id },
                )]
            },

            ResourceAction::MutationSucceeded { mutation, outcome } => {
                if state.pending.remove(&mutation).is_none() {
                    debug!(resource = R::LABEL, %mutation, "Ignoring settled mutation");
                    return SmallVec::new();
                }
                state.items.commit(mutation);

                let kind = outcome.kind();
                match outcome {
                    Settled::Created {
                        provisional,
                        entity,
                    } => state.items.apply(|list| {
                        if let Some(slot) = list.iter_mut().find(|item| item.id() == provisional) {
                            *slot = entity;
                        }
                    }),
                    Settled::Updated { entity } => state.items.apply(|list| {
                        let id = entity.id();
                        if let Some(slot) = list.iter_mut().find(|item| item.id() == id) {
                            *slot = entity;
                        }
                    }),
                    Settled::Deleted { .. } => {},
                }

                info!(resource = R::LABEL, %mutation, %kind, "Mutation accepted");
                let message = match kind {
                    MutationKind::Create => format!("{} created", R::LABEL),
                    MutationKind::Update => format!("{} updated", R::LABEL),
                    MutationKind::Delete => format!("{} deleted", R::LABEL),
                };
                Self::settle(state, env, ToastKind::Success, message)
            },

            ResourceAction::MutationFailed {
                mutation,
                kind,
                error,
            } => {
                if state.pending.remove(&mutation).is_none() {
                    debug!(resource = R::LABEL, %mutation, "Ignoring settled mutation");
                    return SmallVec::new();
                }
                state.items.rollback(mutation);

                warn!(resource = R::LABEL, %mutation, %kind, %error, "Mutation rejected, rolled back");
                let message = format!("Could not {kind} {}: {error}", R::LABEL.to_lowercase());
                Self::settle(state, env, ToastKind::Error, message)
            },

            // ========== Notifications ==========
            ResourceAction::DismissToast { id } => {
                state.toasts.dismiss(id);
                SmallVec::new()
            },
        }
    }
}
