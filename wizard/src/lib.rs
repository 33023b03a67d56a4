//! # Bookflow Wizard
//!
//! Step-by-step booking wizard driven by a backend-configured booking flow.
//!
//! ```text
//! LoadFlow ──► FlowLoaded ──► Next/Previous/GoTo + form input ──► Submit
//!                                                                   │
//!   EventCreated ◄──────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   ResponsesSaved ──► ProductsAttached ──► PaymentProcessed ──► EventConfirmed (completed)
//! ```
//!
//! The pieces are usable on their own:
//!
//! - [`StepCursor`]: clamped position in the visible steps
//! - [`validity`]: per-step validity predicate
//! - [`pricing`]: totals, deposit and summary lines
//! - [`submit`]: payloads for the completion saga
//!
//! [`WizardReducer`] ties them together and runs in a
//! `bookflow_runtime::Store`.

pub mod cursor;
pub mod form;
pub mod pricing;
pub mod reducer;
pub mod state;
pub mod submit;
pub mod validity;

pub use cursor::StepCursor;
pub use form::{BookingFormData, ProductKind, Selection};
pub use pricing::{SelectionError, SummaryLine};
pub use reducer::{WizardAction, WizardEnvironment, WizardReducer};
pub use state::WizardState;
pub use submit::SubmitStage;
