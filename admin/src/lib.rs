//! # Bookflow Admin
//!
//! Admin console caches with optimistic updates.
//!
//! One generic [`ResourceReducer`] serves every CRUD resource. The console
//! runs one store per resource:
//!
//! ```ignore
//! use bookflow_admin::{NotesReducer, ResourceAction, ResourceEnvironment, ResourceState};
//! use bookflow_runtime::Store;
//!
//! let client = ApiClient::from_env()?;
//! let notes = Store::new(
//!     ResourceState::default(),
//!     NotesReducer::new(),
//!     ResourceEnvironment::new(Arc::new(client)),
//! );
//!
//! notes.send(ResourceAction::Fetch { query: NoteQuery::default() }).await?;
//! notes.send(ResourceAction::Delete { id: NoteId::new(12) }).await?;
//! ```

pub mod cache;
pub mod toast;

use bookflow_client::{BookingFlowConfig, BookingFlowItem, Note};

pub use cache::{
    MutationKind, ResourceAction, ResourceEnvironment, ResourceReducer, ResourceState, Settled,
};
pub use toast::{TOAST_TTL, Toast, ToastKind, Toasts};

/// Cache of `/bookingflow/configs/`
pub type ConfigsReducer = ResourceReducer<BookingFlowConfig>;

/// Cache of `/bookingflow/items/`
pub type ItemsReducer = ResourceReducer<BookingFlowItem>;

/// Cache of `/notes/`
pub type NotesReducer = ResourceReducer<Note>;
