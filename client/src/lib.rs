//! # Bookflow API Client
//!
//! Typed client for the booking backend's REST API: booking flows and their
//! steps, events, payments, the product catalog and the admin resources.
//!
//! ## Example
//!
//! ```no_run
//! use bookflow_client::{ApiClient, EventTypeId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads BOOKFLOW_API_URL, BOOKFLOW_ACCESS_TOKEN, ...
//!     let client = ApiClient::from_env()?;
//!
//!     let flows = client.active_flows(EventTypeId::new(1)).await?;
//!     if let Some(flow) = flows.first() {
//!         let steps = client.flow_steps(flow.id).await?;
//!         println!("{} has {} steps", flow.name, steps.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Bearer-token session with a single refresh-and-retry on `401`
//! - Status codes mapped onto [`ApiError`]
//! - Decimal strings decoded into cent-based [`Money`]
//! - Backend traits ([`BookingBackend`], [`ResourceBackend`]) for reducer environments

pub mod backend;
pub mod booking;
pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod resources;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use backend::{BackendFuture, BookingBackend, ResourceBackend};
pub use booking::{
    Event, EventProduct, EventResponses, EventStatus, NewEvent, NewEventProduct, PaymentMethod,
    PaymentRequest, PaymentResult, QuestionResponse,
};
pub use client::{ApiClient, ProductQuery};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use flow::{
    BookingFlow, CatalogProduct, CustomConfig, DateConfig, ProductConfig, ProductItem, Question,
    QuestionnaireConfig, SelectionMode, Step, StepKind, StepRecord, StepType,
};
pub use resources::{
    BookingFlowConfig, BookingFlowConfigDraft, BookingFlowItem, BookingFlowItemDraft,
    ConfigQuery, ItemQuery, Note, NoteDraft, NoteQuery, Resource,
};
pub use session::Session;
pub use types::{
    ClientId, ConfigId, EventId, EventProductId, EventTypeId, FlowId, ItemId, Money,
    MoneyParseError, NoteId, Page, PaymentId, ProductId, QuestionId, QuestionnaireId, StepId,
};
