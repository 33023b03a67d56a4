//! Payloads for the completion saga
//!
//! Submission runs its stages in order and stops at the first failure.
//! Nothing already created is rolled back.

use crate::form::BookingFormData;
use crate::pricing;
use bookflow_client::{
    ClientId, EventId, EventResponses, Money, NewEvent, NewEventProduct, PaymentRequest, Step,
};
use std::fmt;

/// Stage of the completion saga
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubmitStage {
    /// `POST /events/events/`
    CreateEvent,
    /// `POST /questionnaires/responses/save_event_responses/`
    SaveResponses,
    /// One `POST /events/event-products/` per selected item
    AttachProducts,
    /// `POST /payments/process/`
    ProcessPayment,
    /// `POST /events/events/{id}/update-status/`
    ConfirmEvent,
}

impl fmt::Display for SubmitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CreateEvent => "Creating event",
            Self::SaveResponses => "Saving answers",
            Self::AttachProducts => "Adding products",
            Self::ProcessPayment => "Processing payment",
            Self::ConfirmEvent => "Confirming event",
        };
        f.write_str(label)
    }
}

/// Event creation payload
///
/// A blank event name falls back to `default_name`.
///
/// # Errors
///
/// Returns a user-facing message when the event type or date is missing.
pub fn build_event(
    form: &BookingFormData,
    client: ClientId,
    default_name: &str,
) -> Result<NewEvent, String> {
    let event_type = form
        .event_type
        .ok_or_else(|| "Please select an event type".to_string())?;
    let start_time = form
        .start_timestamp()
        .ok_or_else(|| "Please select a date".to_string())?;
    let end_time = form.end_timestamp().unwrap_or(start_time);

    let name = match form.event_name.trim() {
        "" => default_name.to_string(),
        name => name.to_string(),
    };

    Ok(NewEvent {
        client,
        event_type,
        name,
        start_time,
        end_time,
        total_price: form.total_amount,
        questionnaire_responses: form.responses(),
    })
}

/// Questionnaire answers to store for `event`, if any were given
#[must_use]
pub fn event_responses(event: EventId, form: &BookingFormData) -> Option<EventResponses> {
    let responses = form.responses();
    if responses.is_empty() {
        return None;
    }
    Some(EventResponses { event, responses })
}

/// One event-product row per selected package and add-on
///
/// Ids that no step offers are skipped.
#[must_use]
pub fn event_products(event: EventId, steps: &[Step], form: &BookingFormData) -> Vec<NewEventProduct> {
    pricing::summary_lines(steps, form)
        .into_iter()
        .map(|line| NewEventProduct {
            event,
            product: line.product,
            quantity: line.quantity,
            unit_price: line.unit_price,
        })
        .collect()
}

/// Payment for the deposit or the full total, if a method was chosen
#[must_use]
pub fn payment_request(event: EventId, form: &BookingFormData) -> Option<PaymentRequest> {
    let payment_method = form.payment_method?;
    let amount: Money = if form.deposit_only {
        form.deposit_amount
    } else {
        form.total_amount
    };

    Some(PaymentRequest {
        event,
        amount,
        payment_method,
        is_deposit: form.deposit_only,
    })
}
