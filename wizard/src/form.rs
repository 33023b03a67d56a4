//! Client-held booking form data
//!
//! Created empty when a flow is loaded, mutated by each step, discarded on
//! reset. Nothing is sent to the backend before the final submit.

use bookflow_client::{EventTypeId, Money, PaymentMethod, ProductId, QuestionId, QuestionResponse};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;

/// Which selection a product step writes to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProductKind {
    /// Items of a PRODUCT step
    Package,
    /// Items of an ADDON step
    Addon,
}

/// Selected product ids and quantities
pub type Selection = BTreeMap<ProductId, u32>;

/// Everything the client has entered so far
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookingFormData {
    /// Selected event type
    pub event_type: Option<EventTypeId>,
    /// Event name
    pub event_name: String,
    /// Event date
    pub start_date: Option<NaiveDate>,
    /// Last day of a multi-day event
    pub end_date: Option<NaiveDate>,
    /// Start time on `start_date`
    pub start_time: Option<NaiveTime>,
    /// End time on `end_date` (or `start_date`)
    pub end_time: Option<NaiveTime>,
    /// Answers by question
    pub questionnaire_responses: BTreeMap<QuestionId, String>,
    /// Packages chosen on PRODUCT steps
    pub selected_packages: Selection,
    /// Add-ons chosen on ADDON steps
    pub selected_addons: Selection,
    /// Payment method
    pub payment_method: Option<PaymentMethod>,
    /// Pay only the deposit now
    pub deposit_only: bool,
    /// Sum of all selected items
    pub total_amount: Money,
    /// Amount due when paying a deposit
    pub deposit_amount: Money,
}

impl BookingFormData {
    /// Empty form with the event type pre-filled
    #[must_use]
    pub fn new(event_type: EventTypeId) -> Self {
        Self {
            event_type: Some(event_type),
            ..Self::default()
        }
    }

    /// Selection written by steps of `kind`
    #[must_use]
    pub const fn selection(&self, kind: ProductKind) -> &Selection {
        match kind {
            ProductKind::Package => &self.selected_packages,
            ProductKind::Addon => &self.selected_addons,
        }
    }

    /// Mutable selection written by steps of `kind`
    pub const fn selection_mut(&mut self, kind: ProductKind) -> &mut Selection {
        match kind {
            ProductKind::Package => &mut self.selected_packages,
            ProductKind::Addon => &mut self.selected_addons,
        }
    }

    /// Start of the event in UTC, midnight when no start time was chosen
    #[must_use]
    pub fn start_timestamp(&self) -> Option<DateTime<Utc>> {
        let date = self.start_date?;
        Some(date.and_time(self.start_time.unwrap_or_default()).and_utc())
    }

    /// End of the event in UTC
    ///
    /// End date (or start date) plus end time; without an end time the
    /// event ends when it starts.
    #[must_use]
    pub fn end_timestamp(&self) -> Option<DateTime<Utc>> {
        let start = self.start_timestamp()?;
        let Some(end_time) = self.end_time else {
            return Some(start);
        };
        let date = self.end_date.or(self.start_date)?;
        Some(date.and_time(end_time).and_utc())
    }

    /// Non-blank answers in question order
    #[must_use]
    pub fn responses(&self) -> Vec<QuestionResponse> {
        self.questionnaire_responses
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(question, value)| QuestionResponse {
                question: *question,
                value: value.clone(),
            })
            .collect()
    }

    /// Whether an answer was given for `question`
    #[must_use]
    pub fn has_answer(&self, question: QuestionId) -> bool {
        self.questionnaire_responses
            .get(&question)
            .is_some_and(|value| !value.trim().is_empty())
    }
}
