//! Request and response payloads for events, event products and payments

use crate::types::{
    ClientId, EventId, EventProductId, EventTypeId, Money, PaymentId, ProductId, QuestionId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    /// Created, awaiting confirmation
    Pending,
    /// Paid and confirmed
    Confirmed,
    /// Took place
    Completed,
    /// Called off
    Cancelled,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

/// Answer to one questionnaire question
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
    /// Question answered
    pub question: QuestionId,
    /// Answer text
    pub value: String,
}

/// Payload of `POST /events/events/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewEvent {
    /// Client booking the event
    pub client: ClientId,
    /// Event type
    pub event_type: EventTypeId,
    /// Event name
    pub name: String,
    /// Start timestamp
    pub start_time: DateTime<Utc>,
    /// End timestamp
    pub end_time: DateTime<Utc>,
    /// Total of all selected items
    pub total_price: Money,
    /// Questionnaire answers
    pub questionnaire_responses: Vec<QuestionResponse>,
}

/// An event as returned by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event id
    pub id: EventId,
    /// Event name
    #[serde(default)]
    pub name: String,
    /// Lifecycle status
    pub status: EventStatus,
    /// Event type
    #[serde(default)]
    pub event_type: Option<EventTypeId>,
    /// Booking client
    #[serde(default)]
    pub client: Option<ClientId>,
    /// Start timestamp
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// End timestamp
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Total price
    #[serde(default)]
    pub total_price: Option<Money>,
}

/// Payload of `POST /events/events/{id}/update-status/`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    /// New status
    pub status: EventStatus,
}

/// Payload of `POST /events/event-products/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewEventProduct {
    /// Event the product is attached to
    pub event: EventId,
    /// Catalog product
    pub product: ProductId,
    /// Number of units
    pub quantity: u32,
    /// Unit price agreed in the flow
    pub unit_price: Money,
}

/// An event product row as returned by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventProduct {
    /// Row id
    pub id: EventProductId,
    /// Owning event
    pub event: EventId,
    /// Catalog product
    pub product: ProductId,
    /// Number of units
    pub quantity: u32,
}

/// How the client pays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Credit card
    CreditCard,
    /// Debit card
    DebitCard,
    /// Bank transfer
    BankTransfer,
    /// Cash on site
    Cash,
}

/// Payload of `POST /payments/process/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    /// Event being paid for
    pub event: EventId,
    /// Amount to charge
    pub amount: Money,
    /// Payment method
    pub payment_method: PaymentMethod,
    /// Whether `amount` is a deposit rather than the full total
    pub is_deposit: bool,
}

/// Outcome of `POST /payments/process/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    /// Payment id
    pub id: PaymentId,
    /// Amount charged
    pub amount: Money,
    /// Gateway status string
    #[serde(default)]
    pub status: String,
    /// Gateway transaction reference
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Payload of `POST /questionnaires/responses/save_event_responses/`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventResponses {
    /// Event the answers belong to
    pub event: EventId,
    /// Answers
    pub responses: Vec<QuestionResponse>,
}
