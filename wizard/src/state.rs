//! Wizard state

use crate::cursor::StepCursor;
use crate::form::BookingFormData;
use crate::pricing::{self, SummaryLine};
use crate::submit::SubmitStage;
use crate::validity;
use bookflow_client::{BookingFlow, EventId, EventTypeId, PaymentResult, Step, StepType};

/// Everything the booking wizard shows
///
/// Un-initialized until a flow has been loaded; a failed load stores
/// `last_error` and leaves it that way.
#[derive(Clone, Debug, Default)]
pub struct WizardState {
    /// Event type of the most recent load request
    pub requested_event_type: Option<EventTypeId>,
    /// Loaded flow
    pub flow: Option<BookingFlow>,
    /// Visible steps sorted by `order`
    pub steps: Vec<Step>,
    /// Position in `steps`
    pub cursor: StepCursor,
    /// Client-held form data
    pub form: BookingFormData,
    /// A load request is in flight
    pub loading: bool,
    /// Number of the latest submission; survives `Reset` and reloads
    pub submission: u64,
    /// Stage of an in-flight submission
    pub submitting: Option<SubmitStage>,
    /// Event created by the current submission
    pub event_id: Option<EventId>,
    /// Payment made by the current submission
    pub payment: Option<PaymentResult>,
    /// Submission finished and the cursor is on the confirmation step
    pub completed: bool,
    /// Why the last forward move was refused
    pub field_errors: Vec<String>,
    /// Last load or submit failure
    pub last_error: Option<String>,
}

impl WizardState {
    /// Whether a flow with at least one visible step is loaded
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.flow.is_some() && !self.steps.is_empty()
    }

    /// Step under the cursor
    #[must_use]
    pub fn current_step(&self) -> Option<&Step> {
        self.steps.get(self.cursor.index())
    }

    /// Index of the first step of `step_type`
    #[must_use]
    pub fn position_of(&self, step_type: StepType) -> Option<usize> {
        self.steps
            .iter()
            .position(|step| step.step_type() == step_type)
    }

    /// Whether the current step lets the client move forward
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.current_step()
            .is_some_and(|step| validity::is_step_valid(step, &self.form))
    }

    /// Summary lines for the current selections
    #[must_use]
    pub fn summary(&self) -> Vec<SummaryLine> {
        pricing::summary_lines(&self.steps, &self.form)
    }

    /// Deposit percentage of the loaded flow
    #[must_use]
    pub fn deposit_percentage(&self) -> Option<u8> {
        self.flow.as_ref().and_then(|flow| flow.deposit_percentage)
    }
}
