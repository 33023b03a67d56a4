//! Backend abstractions injected into reducer environments
//!
//! Reducers never hold an [`ApiClient`] directly. They depend on these traits
//! so tests can swap in an in-memory backend.

use crate::{
    booking::{
        Event, EventProduct, EventResponses, EventStatus, NewEvent, NewEventProduct, PaymentRequest,
        PaymentResult,
    },
    client::ApiClient,
    error::ApiError,
    flow::{BookingFlow, Step},
    resources::Resource,
    types::{EventId, EventTypeId, FlowId, Page},
};
use std::future::Future;
use std::pin::Pin;

/// Future returned by backend calls
pub type BackendFuture<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

/// Calls made by the booking wizard
pub trait BookingBackend: Send + Sync {
    /// Active flows for an event type
    fn active_flows(&self, event_type: EventTypeId) -> BackendFuture<Vec<BookingFlow>>;

    /// Steps of a flow
    fn flow_steps(&self, flow: FlowId) -> BackendFuture<Vec<Step>>;

    /// Create the event record
    fn create_event(&self, event: NewEvent) -> BackendFuture<Event>;

    /// Store questionnaire answers for the event
    fn save_event_responses(&self, responses: EventResponses) -> BackendFuture<()>;

    /// Attach one selected product to the event
    fn add_event_product(&self, item: NewEventProduct) -> BackendFuture<EventProduct>;

    /// Charge the client
    fn process_payment(&self, request: PaymentRequest) -> BackendFuture<PaymentResult>;

    /// Change the event's status
    fn update_event_status(&self, event: EventId, status: EventStatus) -> BackendFuture<Event>;
}

/// CRUD calls for one admin resource
pub trait ResourceBackend<R: Resource>: Send + Sync {
    /// List with filters
    fn list(&self, query: R::Query) -> BackendFuture<Page<R>>;

    /// Create from a draft
    fn create(&self, draft: R::Draft) -> BackendFuture<R>;

    /// Replace an entity
    fn update(&self, entity: R) -> BackendFuture<R>;

    /// Delete by id
    fn delete(&self, id: R::Id) -> BackendFuture<()>;
}

impl BookingBackend for ApiClient {
    fn active_flows(&self, event_type: EventTypeId) -> BackendFuture<Vec<BookingFlow>> {
        let client = self.clone();
        Box::pin(async move { client.active_flows(event_type).await })
    }

    fn flow_steps(&self, flow: FlowId) -> BackendFuture<Vec<Step>> {
        let client = self.clone();
        Box::pin(async move { client.flow_steps(flow).await })
    }

    fn create_event(&self, event: NewEvent) -> BackendFuture<Event> {
        let client = self.clone();
        Box::pin(async move { client.create_event(&event).await })
    }

    fn save_event_responses(&self, responses: EventResponses) -> BackendFuture<()> {
        let client = self.clone();
        Box::pin(async move { client.save_event_responses(&responses).await })
    }

    fn add_event_product(&self, item: NewEventProduct) -> BackendFuture<EventProduct> {
        let client = self.clone();
        Box::pin(async move { client.add_event_product(&item).await })
    }

    fn process_payment(&self, request: PaymentRequest) -> BackendFuture<PaymentResult> {
        let client = self.clone();
        Box::pin(async move { client.process_payment(&request).await })
    }

    fn update_event_status(&self, event: EventId, status: EventStatus) -> BackendFuture<Event> {
        let client = self.clone();
        Box::pin(async move { client.update_event_status(event, status).await })
    }
}

impl<R: Resource> ResourceBackend<R> for ApiClient {
    fn list(&self, query: R::Query) -> BackendFuture<Page<R>> {
        let client = self.clone();
        Box::pin(async move { client.list::<R>(&query).await })
    }

    fn create(&self, draft: R::Draft) -> BackendFuture<R> {
        let client = self.clone();
        Box::pin(async move { client.create::<R>(&draft).await })
    }

    fn update(&self, entity: R) -> BackendFuture<R> {
        let client = self.clone();
        Box::pin(async move { client.update(&entity).await })
    }

    fn delete(&self, id: R::Id) -> BackendFuture<()> {
        let client = self.clone();
        Box::pin(async move { client.delete::<R>(id).await })
    }
}
