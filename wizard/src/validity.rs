//! Per-step validity predicate
//!
//! Gates forward navigation and submission. Optional steps are always valid;
//! required steps check the slice of form data they own.

use crate::form::{BookingFormData, ProductKind};
use bookflow_client::{Step, StepKind};

/// Reasons `step` is not yet satisfied by `form`; empty when valid
#[must_use]
pub fn validation_errors(step: &Step, form: &BookingFormData) -> Vec<String> {
    if !step.is_required {
        return Vec::new();
    }

    match &step.kind {
        StepKind::EventType => {
            if form.event_type.is_none() {
                return vec!["Please select an event type".to_string()];
            }
            Vec::new()
        },
        StepKind::Date(_) => {
            if form.start_date.is_none() {
                return vec!["Please select a date".to_string()];
            }
            Vec::new()
        },
        StepKind::Questionnaire(config) => config
            .required_questions()
            .filter(|question| !form.has_answer(question.id))
            .map(|question| format!("'{}' requires an answer", question.label))
            .collect(),
        StepKind::Product(config) | StepKind::Addon(config) => {
            let kind = product_kind(&step.kind).unwrap_or(ProductKind::Package);
            let selected = form
                .selection(kind)
                .iter()
                .filter(|(product, quantity)| **quantity > 0 && config.item(**product).is_some())
                .count();
            // A required step needs at least one item even when the config says 0.
            let minimum = config.min_selection.max(1);
            if selected < minimum as usize {
                return vec![format!(
                    "Select at least {minimum} item{}",
                    if minimum == 1 { "" } else { "s" }
                )];
            }
            Vec::new()
        },
        StepKind::Payment => {
            if form.payment_method.is_none() {
                return vec!["Please choose a payment method".to_string()];
            }
            Vec::new()
        },
        StepKind::Intro
        | StepKind::Summary
        | StepKind::Confirmation
        | StepKind::Custom(_) => Vec::new(),
    }
}

/// Whether `form` satisfies `step`
#[must_use]
pub fn is_step_valid(step: &Step, form: &BookingFormData) -> bool {
    validation_errors(step, form).is_empty()
}

/// Index of the first step in `steps` that is not valid
#[must_use]
pub fn first_invalid(steps: &[Step], form: &BookingFormData) -> Option<usize> {
    steps.iter().position(|step| !is_step_valid(step, form))
}

/// Selection a product-bearing step writes to
#[must_use]
pub const fn product_kind(kind: &StepKind) -> Option<ProductKind> {
    match kind {
        StepKind::Product(_) => Some(ProductKind::Package),
        StepKind::Addon(_) => Some(ProductKind::Addon),
        _ => None,
    }
}
