//! In-memory backends for reducer and store tests
//!
//! - [`MockBackend`]: booking flow, events and payments
//! - [`MockResourceBackend`]: CRUD collection for one admin resource
//!
//! Both record every call and can be told to fail a given endpoint.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use bookflow_client::{
    ApiError, BackendFuture, BookingBackend, BookingFlow, Event, EventId, EventProduct,
    EventProductId, EventResponses, EventStatus, EventTypeId, FlowId, NewEvent, NewEventProduct, Page, PaymentId,
    PaymentRequest, PaymentResult, Resource, ResourceBackend, Step,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Booking endpoints, for failure injection and call counting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /bookingflow/flows/`
    ActiveFlows,
    /// `GET /bookingflow/flows/{id}/steps/`
    FlowSteps,
    /// `POST /events/events/`
    CreateEvent,
    /// `POST /questionnaires/responses/save_event_responses/`
    SaveResponses,
    /// `POST /events/event-products/`
    AddEventProduct,
    /// `POST /payments/process/`
    ProcessPayment,
    /// `POST /events/events/{id}/update-status/`
    UpdateEventStatus,
}

/// A recorded backend call with its payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCall {
    /// Active flows were requested
    ActiveFlows(EventTypeId),
    /// Steps were requested
    FlowSteps(FlowId),
    /// An event was created
    CreateEvent(NewEvent),
    /// Questionnaire answers were saved
    SaveResponses(EventResponses),
    /// A product was attached
    AddEventProduct(NewEventProduct),
    /// A payment was processed
    ProcessPayment(PaymentRequest),
    /// A status change was requested
    UpdateEventStatus(EventId, EventStatus),
}

impl BackendCall {
    /// Endpoint this call hit
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Self::ActiveFlows(_) => Endpoint::ActiveFlows,
            Self::FlowSteps(_) => Endpoint::FlowSteps,
            Self::CreateEvent(_) => Endpoint::CreateEvent,
            Self::SaveResponses(_) => Endpoint::SaveResponses,
            Self::AddEventProduct(_) => Endpoint::AddEventProduct,
            Self::ProcessPayment(_) => Endpoint::ProcessPayment,
            Self::UpdateEventStatus(..) => Endpoint::UpdateEventStatus,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    flows: Vec<BookingFlow>,
    steps: HashMap<FlowId, Vec<Step>>,
    failures: HashMap<Endpoint, ApiError>,
    calls: Vec<BackendCall>,
    next_id: i64,
}

/// In-memory [`BookingBackend`]
///
/// # Example
///
/// ```ignore
/// let backend = MockBackend::new().with_flow(flow, steps);
/// backend.fail(Endpoint::ProcessPayment, ApiError::Validation("declined".into()));
///
/// // ... drive the wizard ...
///
/// assert_eq!(backend.calls_to(Endpoint::UpdateEventStatus), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockBackend {
    state: Arc<RwLock<MockState>>,
}

impl MockBackend {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flow and its steps
    #[must_use]
    pub fn with_flow(self, flow: BookingFlow, steps: Vec<Step>) -> Self {
        {
            let mut state = self.state.write().unwrap();
            state.steps.insert(flow.id, steps);
            state.flows.push(flow);
        }
        self
    }

    /// Make every later call to `endpoint` fail with `error`
    pub fn fail(&self, endpoint: Endpoint, error: ApiError) {
        self.state.write().unwrap().failures.insert(endpoint, error);
    }

    /// Stop failing `endpoint`
    pub fn recover(&self, endpoint: Endpoint) {
        self.state.write().unwrap().failures.remove(&endpoint);
    }

    /// Every call made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.read().unwrap().calls.clone()
    }

    /// Number of calls made to `endpoint`
    #[must_use]
    pub fn calls_to(&self, endpoint: Endpoint) -> usize {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .filter(|call| call.endpoint() == endpoint)
            .count()
    }

    /// Shared handle for a reducer environment
    #[must_use]
    pub fn shared(&self) -> Arc<dyn BookingBackend> {
        Arc::new(self.clone())
    }

    /// Record `call`, then return the injected failure or run `respond`
    fn handle<T, F>(&self, call: BackendCall, respond: F) -> BackendFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut MockState) -> Result<T, ApiError>,
    {
        let result = {
            let mut state = self.state.write().unwrap();
            let endpoint = call.endpoint();
            state.calls.push(call);
            match state.failures.get(&endpoint) {
                Some(error) => Err(error.clone()),
                None => respond(&mut state),
            }
        };
        Box::pin(async move { result })
    }
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl BookingBackend for MockBackend {
    fn active_flows(&self, event_type: EventTypeId) -> BackendFuture<Vec<BookingFlow>> {
        self.handle(BackendCall::ActiveFlows(event_type), |state| {
            Ok(state
                .flows
                .iter()
                .filter(|flow| flow.event_type == event_type && flow.is_active)
                .cloned()
                .collect())
        })
    }

    fn flow_steps(&self, flow: FlowId) -> BackendFuture<Vec<Step>> {
        self.handle(BackendCall::FlowSteps(flow), |state| {
            state
                .steps
                .get(&flow)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("/bookingflow/flows/{flow}/steps/")))
        })
    }

    fn create_event(&self, event: NewEvent) -> BackendFuture<Event> {
        self.handle(BackendCall::CreateEvent(event.clone()), |state| {
            Ok(Event {
                id: EventId::new(state.next_id()),
                name: event.name,
                status: EventStatus::Pending,
                event_type: Some(event.event_type),
                client: Some(event.client),
                start_time: Some(event.start_time),
                end_time: Some(event.end_time),
                total_price: Some(event.total_price),
            })
        })
    }

    fn save_event_responses(&self, responses: EventResponses) -> BackendFuture<()> {
        self.handle(BackendCall::SaveResponses(responses), |_| Ok(()))
    }

    fn add_event_product(&self, item: NewEventProduct) -> BackendFuture<EventProduct> {
        self.handle(BackendCall::AddEventProduct(item.clone()), |state| {
            Ok(EventProduct {
                id: EventProductId::new(state.next_id()),
                event: item.event,
                product: item.product,
                quantity: item.quantity,
            })
        })
    }

    fn process_payment(&self, request: PaymentRequest) -> BackendFuture<PaymentResult> {
        self.handle(BackendCall::ProcessPayment(request.clone()), |state| {
            Ok(PaymentResult {
                id: PaymentId::new(state.next_id()),
                amount: request.amount,
                status: "SUCCEEDED".to_string(),
                transaction_id: Some(format!("mock_txn_{}", request.event)),
            })
        })
    }

    fn update_event_status(&self, event: EventId, status: EventStatus) -> BackendFuture<Event> {
        self.handle(BackendCall::UpdateEventStatus(event, status), |_| {
            Ok(Event {
                id: event,
                name: String::new(),
                status,
                event_type: None,
                client: None,
                start_time: None,
                end_time: None,
                total_price: None,
            })
        })
    }
}

// ============================================================================
// Resource backend
// ============================================================================

/// Resource operations, for failure injection and call counting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceOp {
    /// List
    List,
    /// Create
    Create,
    /// Update
    Update,
    /// Delete
    Delete,
}

#[derive(Debug)]
struct ResourceState<R> {
    items: Vec<R>,
    failures: HashMap<ResourceOp, ApiError>,
    calls: Vec<ResourceOp>,
    next_id: i64,
}

/// In-memory [`ResourceBackend`] for one resource type
///
/// Lists ignore filters and return every stored entity on one page.
#[derive(Debug)]
pub struct MockResourceBackend<R> {
    state: Arc<RwLock<ResourceState<R>>>,
}

impl<R> Clone for MockResourceBackend<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<R: Resource> MockResourceBackend<R> {
    /// Create a backend holding `items`
    ///
    /// Ids assigned by `create` start after the largest id in `items`.
    #[must_use]
    pub fn with_items(items: Vec<R>, next_id: i64) -> Self {
        Self {
            state: Arc::new(RwLock::new(ResourceState {
                items,
                failures: HashMap::new(),
                calls: Vec::new(),
                next_id,
            })),
        }
    }

    /// Make every later `op` fail with `error`
    pub fn fail(&self, op: ResourceOp, error: ApiError) {
        self.state.write().unwrap().failures.insert(op, error);
    }

    /// Stop failing `op`
    pub fn recover(&self, op: ResourceOp) {
        self.state.write().unwrap().failures.remove(&op);
    }

    /// Entities currently stored
    #[must_use]
    pub fn items(&self) -> Vec<R> {
        self.state.read().unwrap().items.clone()
    }

    /// Number of calls made for `op`
    #[must_use]
    pub fn calls_to(&self, op: ResourceOp) -> usize {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .filter(|call| **call == op)
            .count()
    }

    /// Shared handle for a reducer environment
    #[must_use]
    pub fn shared(&self) -> Arc<dyn ResourceBackend<R>> {
        Arc::new(self.clone())
    }

    fn handle<T, F>(&self, op: ResourceOp, respond: F) -> BackendFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ResourceState<R>) -> Result<T, ApiError>,
    {
        let result = {
            let mut state = self.state.write().unwrap();
            state.calls.push(op);
            match state.failures.get(&op) {
                Some(error) => Err(error.clone()),
                None => respond(&mut state),
            }
        };
        Box::pin(async move { result })
    }
}

fn not_found<R: Resource>(id: R::Id) -> ApiError {
    ApiError::NotFound(format!("{}{id}/", R::PATH))
}

impl<R: Resource> ResourceBackend<R> for MockResourceBackend<R> {
    fn list(&self, _query: R::Query) -> BackendFuture<Page<R>> {
        self.handle(ResourceOp::List, |state| Ok(Page::single(state.items.clone())))
    }

    fn create(&self, draft: R::Draft) -> BackendFuture<R> {
        self.handle(ResourceOp::Create, |state| {
            state.next_id += 1;
            let entity = R::provisional(&draft, R::Id::from(state.next_id));
            state.items.push(entity.clone());
            Ok(entity)
        })
    }

    fn update(&self, entity: R) -> BackendFuture<R> {
        self.handle(ResourceOp::Update, |state| {
            let id = entity.id();
            let slot = state
                .items
                .iter_mut()
                .find(|item| item.id() == id)
                .ok_or_else(|| not_found::<R>(id))?;
            *slot = entity.clone();
            Ok(entity)
        })
    }

    fn delete(&self, id: R::Id) -> BackendFuture<()> {
        self.handle(ResourceOp::Delete, |state| {
            let before = state.items.len();
            state.items.retain(|item| item.id() != id);
            if state.items.len() == before {
                Err(not_found::<R>(id))
            } else {
                Ok(())
            }
        })
    }
}
