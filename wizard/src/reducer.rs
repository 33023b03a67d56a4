//! Booking wizard reducer
//!
//! Drives one client through a backend-configured flow:
//! 1. Load the active flow for an event type and its visible steps
//! 2. Move between steps, forward moves gated by step validity
//! 3. Collect form data, recomputing totals after every selection change
//! 4. Submit: create the event, save answers, attach products, pay, confirm
//!
//! Submission is a saga without compensation. Each stage's response action
//! starts the next stage; the first failure stops it and is stored as
//! `last_error`.

use crate::cursor::StepCursor;
use crate::form::BookingFormData;
use crate::pricing;
use crate::state::WizardState;
use crate::submit::{self, SubmitStage};
use crate::validity;
use bookflow_client::{
    ApiError, BackendFuture, BookingBackend, BookingFlow, ClientId, DateConfig, Event, EventId,
    EventStatus, EventTypeId, PaymentMethod, PaymentResult, ProductId, QuestionId, Step, StepId,
    StepKind, StepType,
};
use bookflow_core::{
    SmallVec, async_effect, effect::Effect, environment::Clock, reducer::Reducer, smallvec,
};
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// Actions
// ============================================================================

/// Actions for the booking wizard
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WizardAction {
    // ===== Loading =====
    /// Load the active flow for an event type, replacing all wizard state
    LoadFlow {
        /// Event type to book
        event_type: EventTypeId,
    },

    /// Flow and steps arrived
    FlowLoaded {
        /// Event type the load was for
        event_type: EventTypeId,
        /// First active flow
        flow: BookingFlow,
        /// Its steps, as returned by the backend
        steps: Vec<Step>,
    },

    /// Flow could not be loaded
    FlowLoadFailed {
        /// Event type the load was for
        event_type: EventTypeId,
        /// Reason
        error: String,
    },

    // ===== Navigation =====
    /// Move to the next step if the current one is valid
    Next,

    /// Move to the previous step
    Previous,

    /// Jump to a step
    GoTo {
        /// Target index in the visible steps
        index: usize,
    },

    // ===== Form input =====
    /// Choose the event type
    SelectEventType {
        /// Event type
        event_type: EventTypeId,
    },

    /// Name the event
    SetEventName {
        /// Event name
        name: String,
    },

    /// Choose the event date
    SelectDate {
        /// Event day
        start_date: NaiveDate,
        /// Last day of a multi-day event
        end_date: Option<NaiveDate>,
    },

    /// Choose start and end times
    SelectTimes {
        /// Start time
        start_time: Option<NaiveTime>,
        /// End time
        end_time: Option<NaiveTime>,
    },

    /// Answer a questionnaire question
    AnswerQuestion {
        /// Question
        question: QuestionId,
        /// Answer text
        value: String,
    },

    /// Set the quantity of an item on a PRODUCT or ADDON step; 0 removes it
    SelectProduct {
        /// Step offering the item
        step: StepId,
        /// Catalog product
        product: ProductId,
        /// Quantity
        quantity: u32,
    },

    /// Choose (or clear) the payment method
    SelectPaymentMethod {
        /// Payment method
        method: Option<PaymentMethod>,
    },

    /// Pay only the deposit
    SetDepositOnly {
        /// Whether to pay the deposit only
        deposit_only: bool,
    },

    // ===== Submission =====
    /// Complete the booking from the payment step
    Submit,

    /// Event record created
    EventCreated {
        /// Submission the response belongs to
        submission: u64,
        /// Created event
        event: Event,
    },

    /// Questionnaire answers were stored
    ResponsesSaved {
        /// Submission the response belongs to
        submission: u64,
        /// Event
        event: EventId,
    },

    /// Every selected item was attached to the event
    ProductsAttached {
        /// Submission the response belongs to
        submission: u64,
        /// Event
        event: EventId,
    },

    /// Payment went through
    PaymentProcessed {
        /// Submission the response belongs to
        submission: u64,
        /// Event
        event: EventId,
        /// Payment
        payment: PaymentResult,
    },

    /// Event status is now CONFIRMED
    EventConfirmed {
        /// Submission the response belongs to
        submission: u64,
        /// Event
        event: EventId,
    },

    /// A submission stage failed; later stages were not run
    SubmitFailed {
        /// Submission the response belongs to
        submission: u64,
        /// Failed stage
        stage: SubmitStage,
        /// Reason
        error: String,
    },

    /// Discard everything
    Reset,
}

impl WizardAction {
    /// Whether the action edits form data
    #[must_use]
    pub const fn is_form_input(&self) -> bool {
        matches!(
            self,
            Self::SelectEventType { .. }
                | Self::SetEventName { .. }
                | Self::SelectDate { .. }
                | Self::SelectTimes { .. }
                | Self::AnswerQuestion { .. }
                | Self::SelectProduct { .. }
                | Self::SelectPaymentMethod { .. }
                | Self::SetDepositOnly { .. }
        )
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the booking wizard
#[derive(Clone)]
pub struct WizardEnvironment {
    /// Booking API
    pub backend: Arc<dyn BookingBackend>,
    /// Clock for date windows
    pub clock: Arc<dyn Clock>,
    /// Client the booking is made for
    pub client: ClientId,
}

impl WizardEnvironment {
    /// Creates a new `WizardEnvironment`
    #[must_use]
    pub fn new(backend: Arc<dyn BookingBackend>, clock: Arc<dyn Clock>, client: ClientId) -> Self {
        Self {
            backend,
            clock,
            client,
        }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the booking wizard
#[derive(Clone, Debug)]
pub struct WizardReducer;

impl WizardReducer {
    /// Creates a new `WizardReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Active flows, then the steps of the first one
    async fn load_flow(
        backend: Arc<dyn BookingBackend>,
        event_type: EventTypeId,
    ) -> Result<(BookingFlow, Vec<Step>), ApiError> {
        let flows = backend.active_flows(event_type).await?;
        if flows.len() > 1 {
            warn!(%event_type, count = flows.len(), "Several active flows, using the first");
        }
        let flow = flows.into_iter().next().ok_or_else(|| {
            ApiError::NotFound(format!("No active booking flow for event type {event_type}"))
        })?;
        let steps = backend.flow_steps(flow.id).await?;
        Ok((flow, steps))
    }

    /// Await a submission request and map its outcome to the next action
    fn stage<T, F>(
        submission: u64,
        stage: SubmitStage,
        request: BackendFuture<T>,
        on_success: F,
    ) -> Effect<WizardAction>
    where
        T: Send + 'static,
        F: FnOnce(T) -> WizardAction + Send + 'static,
    {
        async_effect! {
            Some(match request.await {
                Ok(value) => on_success(value),
                Err(error) => WizardAction::SubmitFailed {
                    submission,
                    stage,
                    error: error.to_string(),
                },
            })
        }
    }

    fn apply_flow(state: &mut WizardState, event_type: EventTypeId, flow: BookingFlow, steps: Vec<Step>) {
        state.loading = false;

        let mut steps: Vec<Step> = steps.into_iter().filter(|step| step.is_visible).collect();
        steps.sort_by_key(|step| step.order);

        if steps.is_empty() {
            warn!(flow = %flow.id, "Booking flow has no visible steps");
            state.last_error = Some(format!("Booking flow '{}' has no steps", flow.name));
            return;
        }

        info!(flow = %flow.id, steps = steps.len(), "Booking flow loaded");
        state.cursor = StepCursor::new(steps.len());
        state.form = BookingFormData::new(event_type);
        state.steps = steps;
        state.flow = Some(flow);
        state.last_error = None;
    }

    /// Date configuration governing the date selection
    fn date_config(state: &WizardState) -> DateConfig {
        let current = state.current_step().map(|step| &step.kind);
        let first = state.steps.iter().map(|step| &step.kind).find(|kind| matches!(kind, StepKind::Date(_)));
        match current.filter(|kind| matches!(kind, StepKind::Date(_))).or(first) {
            Some(StepKind::Date(config)) => config.clone(),
            _ => DateConfig::default(),
        }
    }

    fn check_dates(
        config: &DateConfig,
        today: NaiveDate,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<(), String> {
        let days_ahead = (start - today).num_days();
        if days_ahead < i64::from(config.min_days_in_future)
            || days_ahead > i64::from(config.max_days_in_future)
        {
            return Err(format!(
                "Please choose a date between {} and {} days from today",
                config.min_days_in_future, config.max_days_in_future
            ));
        }

        match end {
            Some(end) if end < start => Err("The end date cannot be before the start date".to_string()),
            Some(end) if end != start && !config.allow_multi_day => {
                Err("This event cannot span several days".to_string())
            },
            _ => Ok(()),
        }
    }

    fn check_times(
        config: &DateConfig,
        form: &BookingFormData,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
    ) -> Result<(), String> {
        if !config.allow_time_selection && (start.is_some() || end.is_some()) {
            return Err("Times cannot be chosen for this event".to_string());
        }
        let same_day = form.end_date.is_none() || form.end_date == form.start_date;
        match (start, end) {
            (Some(start), Some(end)) if same_day && end <= start => {
                Err("The end time must be after the start time".to_string())
            },
            _ => Ok(()),
        }
    }

    fn recompute_totals(state: &mut WizardState) {
        let total = pricing::total(&state.steps, &state.form);
        state.form.total_amount = total;
        state.form.deposit_amount = pricing::deposit(total, state.deposit_percentage());
    }

    /// Payment stage, or straight to completion without a payment method
    fn start_payment(
        state: &mut WizardState,
        submission: u64,
        event: EventId,
        env: &WizardEnvironment,
    ) -> SmallVec<[Effect<WizardAction>; 4]> {
        let Some(request) = submit::payment_request(event, &state.form) else {
            info!(%event, "No payment method chosen, skipping payment");
            Self::complete(state);
            return SmallVec::new();
        };

        debug!(%event, amount = %request.amount, deposit = request.is_deposit, "Processing payment");
        state.submitting = Some(SubmitStage::ProcessPayment);
        smallvec![Self::stage(
            submission,
            SubmitStage::ProcessPayment,
            env.backend.process_payment(request),
            move |payment| WizardAction::PaymentProcessed {
                submission,
                event,
                payment,
            },
        )]
    }

    /// Attach every selected item in parallel, or move on to payment
    fn attach_products(
        state: &mut WizardState,
        submission: u64,
        event: EventId,
        env: &WizardEnvironment,
    ) -> SmallVec<[Effect<WizardAction>; 4]> {
        let rows = submit::event_products(event, &state.steps, &state.form);
        if rows.is_empty() {
            return Self::start_payment(state, submission, event, env);
        }

        debug!(%event, items = rows.len(), "Attaching products");
        state.submitting = Some(SubmitStage::AttachProducts);
        let requests: Vec<_> = rows
            .into_iter()
            .map(|row| env.backend.add_event_product(row))
            .collect();

        smallvec![async_effect! {
            let results = futures::future::join_all(requests).await;
            Some(match results.into_iter().find_map(Result::err) {
                Some(error) => WizardAction::SubmitFailed {
                    submission,
                    stage: SubmitStage::AttachProducts,
                    error: error.to_string(),
                },
                None => WizardAction::ProductsAttached { submission, event },
            })
        }]
    }

    fn complete(state: &mut WizardState) {
        state.submitting = None;
        state.completed = true;
        let target = state
            .position_of(StepType::Confirmation)
            .unwrap_or_else(|| state.steps.len().saturating_sub(1));
        state.cursor.goto(target);
        info!(event = ?state.event_id, "Booking completed");
    }

    /// Whether a response belongs to the submission and stage currently in flight
    fn in_stage(state: &WizardState, submission: u64, stage: SubmitStage) -> bool {
        if state.submission == submission && state.submitting == Some(stage) {
            return true;
        }
        debug!(%stage, submission, "Ignoring response for a stage that is not in flight");
        false
    }
}

impl Default for WizardReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for WizardReducer {
    type State = WizardState;
    type Action = WizardAction;
    type Environment = WizardEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per wizard action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if action.is_form_input() && (state.submitting.is_some() || state.completed) {
            debug!("Form is locked, input ignored");
            return SmallVec::new();
        }

        match action {
            // ========== Loading ==========
            WizardAction::LoadFlow { event_type } => {
                *state = WizardState {
                    requested_event_type: Some(event_type),
                    loading: true,
                    submission: state.submission,
                    ..WizardState::default()
                };

                let backend = Arc::clone(&env.backend);
                smallvec![async_effect! {
                    Some(match Self::load_flow(backend, event_type).await {
                        Ok((flow, steps)) => WizardAction::FlowLoaded { event_type, flow, steps },
                        Err(error) => WizardAction::FlowLoadFailed {
                            event_type,
                            error: error.to_string(),
                        },
                    })
                }]
            },

            WizardAction::FlowLoaded {
                event_type,
                flow,
                steps,
            } => {
                if state.requested_event_type != Some(event_type) {
                    debug!(%event_type, "Ignoring stale flow response");
                    return SmallVec::new();
                }
                Self::apply_flow(state, event_type, flow, steps);
                SmallVec::new()
            },

            WizardAction::FlowLoadFailed { event_type, error } => {
                if state.requested_event_type != Some(event_type) {
                    debug!(%event_type, "Ignoring stale flow failure");
                    return SmallVec::new();
                }
                warn!(%event_type, %error, "Failed to load booking flow");
                state.loading = false;
                state.last_error = Some(format!("Could not load the booking flow: {error}"));
                SmallVec::new()
            },

            // ========== Navigation ==========
            WizardAction::Next => {
                if state.submitting.is_some() || state.completed {
                    return SmallVec::new();
                }
                let Some(step) = state.current_step() else {
                    return SmallVec::new();
                };
                // Leaving the payment step happens through Submit only.
                if step.step_type() == StepType::Payment {
                    return SmallVec::new();
                }

                let step_id = step.id;
                let errors = validity::validation_errors(step, &state.form);
                if errors.is_empty() {
                    state.field_errors.clear();
                    state.cursor.next();
                } else {
                    debug!(step = %step_id, ?errors, "Next refused");
                    state.field_errors = errors;
                }
                SmallVec::new()
            },

            WizardAction::Previous => {
                if state.submitting.is_some() || state.completed {
                    return SmallVec::new();
                }
                state.field_errors.clear();
                state.cursor.prev();
                SmallVec::new()
            },

            WizardAction::GoTo { index } => {
                if state.submitting.is_some() || state.completed || index >= state.cursor.len() {
                    return SmallVec::new();
                }

                let current = state.cursor.index();
                if index > current {
                    let skipped = &state.steps[current..index];
                    if let Some(offset) = validity::first_invalid(skipped, &state.form) {
                        let blocker = &skipped[offset];
                        debug!(step = %blocker.id, target = index, "Jump refused");
                        state.field_errors = validity::validation_errors(blocker, &state.form);
                        return SmallVec::new();
                    }
                    if skipped.iter().any(|step| step.step_type() == StepType::Payment) {
                        debug!(target = index, "Jump past the payment step refused");
                        return SmallVec::new();
                    }
                }

                state.field_errors.clear();
                state.cursor.goto(index);
                SmallVec::new()
            },

            // ========== Form input ==========
            WizardAction::SelectEventType { event_type } => {
                state.form.event_type = Some(event_type);
                state.field_errors.clear();
                SmallVec::new()
            },

            WizardAction::SetEventName { name } => {
                state.form.event_name = name;
                SmallVec::new()
            },

            WizardAction::SelectDate {
                start_date,
                end_date,
            } => {
                let config = Self::date_config(state);
                match Self::check_dates(&config, env.clock.today(), start_date, end_date) {
                    Ok(()) => {
                        state.form.start_date = Some(start_date);
                        state.form.end_date = end_date;
                        state.field_errors.clear();

                        let (start_time, end_time) = (state.form.start_time, state.form.end_time);
                        if let Err(error) = Self::check_times(&config, &state.form, start_time, end_time) {
                            debug!(%error, "Chosen times no longer fit the dates, clearing them");
                            state.form.start_time = None;
                            state.form.end_time = None;
                            state.field_errors = vec![error];
                        }
                    },
                    Err(error) => state.field_errors = vec![error],
                }
                SmallVec::new()
            },

            WizardAction::SelectTimes {
                start_time,
                end_time,
            } => {
                let config = Self::date_config(state);
                match Self::check_times(&config, &state.form, start_time, end_time) {
                    Ok(()) => {
                        state.form.start_time = start_time;
                        state.form.end_time = end_time;
                        state.field_errors.clear();
                    },
                    Err(error) => state.field_errors = vec![error],
                }
                SmallVec::new()
            },

            WizardAction::AnswerQuestion { question, value } => {
                state.form.questionnaire_responses.insert(question, value);
                state.field_errors.clear();
                SmallVec::new()
            },

            WizardAction::SelectProduct {
                step,
                product,
                quantity,
            } => {
                let Some(target) = state.steps.iter().find(|candidate| candidate.id == step) else {
                    debug!(%step, "Selection for an unknown step");
                    return SmallVec::new();
                };
                let (Some(kind), Some(config)) =
                    (validity::product_kind(&target.kind), target.product_config())
                else {
                    return SmallVec::new();
                };

                let selection = state.form.selection_mut(kind);
                match pricing::apply_selection(config, selection, product, quantity) {
                    Ok(()) => state.field_errors.clear(),
                    Err(error) => state.field_errors = vec![error.to_string()],
                }
                Self::recompute_totals(state);
                SmallVec::new()
            },

            WizardAction::SelectPaymentMethod { method } => {
                state.form.payment_method = method;
                state.field_errors.clear();
                SmallVec::new()
            },

            WizardAction::SetDepositOnly { deposit_only } => {
                state.form.deposit_only = deposit_only;
                SmallVec::new()
            },

            // ========== Submission: create event ==========
            WizardAction::Submit => {
                if state.submitting.is_some() {
                    debug!("Submit ignored, a submission is in flight");
                    return SmallVec::new();
                }
                if state.completed {
                    return SmallVec::new();
                }
                if state.current_step().map(Step::step_type) != Some(StepType::Payment) {
                    state.last_error = Some("Bookings can only be completed from the payment step".to_string());
                    return SmallVec::new();
                }
                if let Some(index) = validity::first_invalid(&state.steps, &state.form) {
                    let step = &state.steps[index];
                    state.field_errors = validity::validation_errors(step, &state.form);
                    state.last_error = Some(format!("Step '{}' is incomplete", step.title));
                    return SmallVec::new();
                }

                let default_name = state.flow.as_ref().map_or("Booking", |flow| flow.name.as_str());
                let event = match submit::build_event(&state.form, env.client, default_name) {
                    Ok(event) => event,
                    Err(error) => {
                        state.last_error = Some(error);
                        return SmallVec::new();
                    },
                };

                state.submission += 1;
                let submission = state.submission;
                info!(client = %env.client, total = %event.total_price, submission, "Submitting booking");
                state.submitting = Some(SubmitStage::CreateEvent);
                state.event_id = None;
                state.payment = None;
                state.last_error = None;
                state.field_errors.clear();

                smallvec![Self::stage(
                    submission,
                    SubmitStage::CreateEvent,
                    env.backend.create_event(event),
                    move |event| WizardAction::EventCreated { submission, event },
                )]
            },

            // ========== Submission: questionnaire answers ==========
            WizardAction::EventCreated { submission, event } => {
                if !Self::in_stage(state, submission, SubmitStage::CreateEvent) {
                    return SmallVec::new();
                }
                let event_id = event.id;
                state.event_id = Some(event_id);

                let Some(responses) = submit::event_responses(event_id, &state.form) else {
                    return Self::attach_products(state, submission, event_id, env);
                };

                debug!(event = %event_id, answers = responses.responses.len(), "Saving questionnaire answers");
                state.submitting = Some(SubmitStage::SaveResponses);
                smallvec![Self::stage(
                    submission,
                    SubmitStage::SaveResponses,
                    env.backend.save_event_responses(responses),
                    move |()| WizardAction::ResponsesSaved {
                        submission,
                        event: event_id,
                    },
                )]
            },

            // ========== Submission: attach products ==========
            WizardAction::ResponsesSaved { submission, event } => {
                if !Self::in_stage(state, submission, SubmitStage::SaveResponses) {
                    return SmallVec::new();
                }
                Self::attach_products(state, submission, event, env)
            },

            // ========== Submission: payment ==========
            WizardAction::ProductsAttached { submission, event } => {
                if !Self::in_stage(state, submission, SubmitStage::AttachProducts) {
                    return SmallVec::new();
                }
                Self::start_payment(state, submission, event, env)
            },

            // ========== Submission: confirm ==========
            WizardAction::PaymentProcessed {
                submission,
                event,
                payment,
            } => {
                if !Self::in_stage(state, submission, SubmitStage::ProcessPayment) {
                    return SmallVec::new();
                }
                debug!(%event, payment = %payment.id, "Payment processed");
                state.payment = Some(payment);
                state.submitting = Some(SubmitStage::ConfirmEvent);

                smallvec![Self::stage(
                    submission,
                    SubmitStage::ConfirmEvent,
                    env.backend.update_event_status(event, EventStatus::Confirmed),
                    move |_| WizardAction::EventConfirmed { submission, event },
                )]
            },

            WizardAction::EventConfirmed { submission, .. } => {
                if Self::in_stage(state, submission, SubmitStage::ConfirmEvent) {
                    Self::complete(state);
                }
                SmallVec::new()
            },

            WizardAction::SubmitFailed {
                submission,
                stage,
                error,
            } => {
                if !Self::in_stage(state, submission, stage) {
                    return SmallVec::new();
                }
                warn!(%stage, %error, event = ?state.event_id, "Booking submission failed");
                state.submitting = None;
                state.last_error = Some(format!("{stage}: {error}"));
                SmallVec::new()
            },

            WizardAction::Reset => {
                *state = WizardState {
                    submission: state.submission,
                    ..WizardState::default()
                };
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use bookflow_client::{
        CatalogProduct, FlowId, Money, PaymentId, ProductConfig, ProductItem,
    };
    use bookflow_testing::{Endpoint, MockBackend, ReducerTest, assertions, test_clock};

    fn step(id: i64, order: i32, is_required: bool, kind: StepKind) -> Step {
        Step {
            id: StepId::new(id),
            title: format!("Step {id}"),
            description: None,
            order,
            is_required,
            is_visible: true,
            kind,
        }
    }

    fn packages() -> ProductConfig {
        ProductConfig {
            min_selection: 1,
            items: vec![ProductItem {
                product: CatalogProduct {
                    id: ProductId::new(10),
                    name: "Gold".into(),
                    description: String::new(),
                    base_price: Money::from_units(100),
                },
                custom_price: Some(Money::from_units(75)),
                custom_description: None,
                is_highlighted: false,
                order: 0,
            }],
            ..ProductConfig::default()
        }
    }

    fn flow() -> BookingFlow {
        BookingFlow {
            id: FlowId::new(1),
            name: "Wedding".into(),
            event_type: EventTypeId::new(1),
            is_active: true,
            deposit_percentage: Some(30),
        }
    }

    /// INTRO, DATE, PRODUCT, PAYMENT, CONFIRMATION
    fn steps() -> Vec<Step> {
        vec![
            step(1, 0, false, StepKind::Intro),
            step(2, 1, true, StepKind::Date(DateConfig::default())),
            step(3, 2, true, StepKind::Product(packages())),
            step(4, 3, true, StepKind::Payment),
            step(5, 4, false, StepKind::Confirmation),
        ]
    }

    fn env() -> WizardEnvironment {
        WizardEnvironment::new(
            MockBackend::new().shared(),
            Arc::new(test_clock()),
            ClientId::new(7),
        )
    }

    fn loaded() -> WizardState {
        let mut state = WizardState {
            requested_event_type: Some(EventTypeId::new(1)),
            loading: true,
            ..WizardState::default()
        };
        WizardReducer::new().reduce(
            &mut state,
            WizardAction::FlowLoaded {
                event_type: EventTypeId::new(1),
                flow: flow(),
                steps: steps(),
            },
            &env(),
        );
        state
    }

    fn at(mut state: WizardState, index: usize) -> WizardState {
        state.cursor.goto(index);
        state
    }

    fn ready_to_submit() -> WizardState {
        let mut state = loaded();
        state.form.start_date = Some("2025-06-01".parse().unwrap());
        state.form.selected_packages.insert(ProductId::new(10), 3);
        state.form.total_amount = Money::from_units(225);
        state.form.deposit_amount = Money::from_cents(6_750);
        state.form.payment_method = Some(PaymentMethod::CreditCard);
        at(state, 3)
    }

    // ===== Loading =====

    #[test]
    fn test_load_flow_resets_state() {
        let mut stale = loaded();
        stale.last_error = Some("old".into());

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(stale)
            .when_action(WizardAction::LoadFlow {
                event_type: EventTypeId::new(2),
            })
            .then_state(|state| {
                assert!(state.loading);
                assert!(!state.is_initialized());
                assert_eq!(state.requested_event_type, Some(EventTypeId::new(2)));
                assert!(state.last_error.is_none());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_load_effect_fetches_flow_then_steps() {
        let backend = MockBackend::new().with_flow(flow(), steps());
        let env = WizardEnvironment::new(backend.shared(), Arc::new(test_clock()), ClientId::new(7));
        let mut state = WizardState::default();

        let mut effects = WizardReducer::new().reduce(
            &mut state,
            WizardAction::LoadFlow {
                event_type: EventTypeId::new(1),
            },
            &env,
        );
        let Some(Effect::Future(load)) = effects.pop() else {
            panic!("expected the load to be a future effect");
        };

        let action = tokio_test::block_on(load);
        assert!(matches!(
            action,
            Some(WizardAction::FlowLoaded { ref steps, .. }) if steps.len() == 5
        ));
        assert_eq!(backend.calls_to(Endpoint::ActiveFlows), 1);
        assert_eq!(backend.calls_to(Endpoint::FlowSteps), 1);
    }

    #[test]
    fn test_flow_loaded_sorts_and_drops_invisible_steps() {
        let mut hidden = step(9, 1, true, StepKind::Summary);
        hidden.is_visible = false;
        let shuffled = vec![
            step(3, 2, false, StepKind::Payment),
            hidden,
            step(1, 0, false, StepKind::Intro),
            step(2, 1, false, StepKind::Date(DateConfig::default())),
        ];

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(WizardState {
                requested_event_type: Some(EventTypeId::new(1)),
                loading: true,
                ..WizardState::default()
            })
            .when_action(WizardAction::FlowLoaded {
                event_type: EventTypeId::new(1),
                flow: flow(),
                steps: shuffled,
            })
            .then_state(|state| {
                let ids: Vec<i64> = state.steps.iter().map(|step| step.id.get()).collect();
                assert_eq!(ids, vec![1, 2, 3]);
                assert_eq!(state.cursor.index(), 0);
                assert_eq!(state.cursor.len(), 3);
                assert_eq!(state.form.event_type, Some(EventTypeId::new(1)));
                assert!(!state.loading);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_stale_flow_response_is_ignored() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(WizardState {
                requested_event_type: Some(EventTypeId::new(2)),
                loading: true,
                ..WizardState::default()
            })
            .when_action(WizardAction::FlowLoaded {
                event_type: EventTypeId::new(1),
                flow: flow(),
                steps: steps(),
            })
            .then_state(|state| {
                assert!(state.loading);
                assert!(state.flow.is_none());
            })
            .run();
    }

    #[test]
    fn test_flow_without_visible_steps_stays_uninitialized() {
        let mut only = step(1, 0, false, StepKind::Intro);
        only.is_visible = false;

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(WizardState {
                requested_event_type: Some(EventTypeId::new(1)),
                ..WizardState::default()
            })
            .when_action(WizardAction::FlowLoaded {
                event_type: EventTypeId::new(1),
                flow: flow(),
                steps: vec![only],
            })
            .then_state(|state| {
                assert!(!state.is_initialized());
                assert_eq!(state.last_error.as_deref(), Some("Booking flow 'Wedding' has no steps"));
            })
            .run();
    }

    #[test]
    fn test_load_failure_is_stored() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(WizardState {
                requested_event_type: Some(EventTypeId::new(1)),
                loading: true,
                ..WizardState::default()
            })
            .when_action(WizardAction::FlowLoadFailed {
                event_type: EventTypeId::new(1),
                error: "Not found: /bookingflow/flows/".into(),
            })
            .then_state(|state| {
                assert!(!state.loading);
                assert!(!state.is_initialized());
                assert!(state.last_error.as_deref().unwrap().starts_with("Could not load"));
            })
            .run();
    }

    // ===== Navigation =====

    #[test]
    fn test_next_from_date_without_date_does_not_advance() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(at(loaded(), 1))
            .when_action(WizardAction::Next)
            .then_state(|state| {
                assert_eq!(state.cursor.index(), 1);
                assert_eq!(state.field_errors, vec!["Please select a date".to_string()]);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_next_after_selecting_a_date_advances() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(at(loaded(), 1))
            .when_action(WizardAction::SelectDate {
                start_date: "2025-06-01".parse().unwrap(),
                end_date: None,
            })
            .when_action(WizardAction::Next)
            .then_state(|state| {
                assert_eq!(state.cursor.index(), 2);
                assert!(state.field_errors.is_empty());
            })
            .run();
    }

    #[test]
    fn test_previous_is_never_gated() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(at(loaded(), 2))
            .when_action(WizardAction::Previous)
            .when_action(WizardAction::Previous)
            .when_action(WizardAction::Previous)
            .then_state(|state| assert_eq!(state.cursor.index(), 0))
            .run();
    }

    #[test]
    fn test_goto_forward_requires_valid_intermediate_steps() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(loaded())
            .when_action(WizardAction::GoTo { index: 2 })
            .then_state(|state| {
                assert_eq!(state.cursor.index(), 0);
                assert_eq!(state.field_errors, vec!["Please select a date".to_string()]);
            })
            .run();

        let mut dated = loaded();
        dated.form.start_date = Some("2025-06-01".parse().unwrap());
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(dated)
            .when_action(WizardAction::GoTo { index: 2 })
            .when_action(WizardAction::GoTo { index: 0 })
            .when_action(WizardAction::GoTo { index: 99 })
            .then_state(|state| assert_eq!(state.cursor.index(), 0))
            .run();
    }

    #[test]
    fn test_confirmation_is_not_reachable_without_submit() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(ready_to_submit())
            .when_action(WizardAction::Next)
            .when_action(WizardAction::GoTo { index: 4 })
            .then_state(|state| {
                assert_eq!(state.cursor.index(), 3);
                assert!(!state.completed);
            })
            .run();
    }

    // ===== Form input =====

    #[test]
    fn test_date_outside_window_is_refused() {
        let mut state = loaded();
        if let StepKind::Date(config) = &mut state.steps[1].kind {
            config.min_days_in_future = 7;
        }

        // Clock is fixed at 2025-01-01.
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(at(state, 1))
            .when_action(WizardAction::SelectDate {
                start_date: "2025-01-03".parse().unwrap(),
                end_date: None,
            })
            .then_state(|state| {
                assert!(state.form.start_date.is_none());
                assert_eq!(state.field_errors.len(), 1);
            })
            .run();
    }

    #[test]
    fn test_multi_day_requires_permission() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(at(loaded(), 1))
            .when_action(WizardAction::SelectDate {
                start_date: "2025-06-01".parse().unwrap(),
                end_date: Some("2025-06-02".parse().unwrap()),
            })
            .then_state(|state| {
                assert!(state.form.start_date.is_none());
                assert_eq!(
                    state.field_errors,
                    vec!["This event cannot span several days".to_string()]
                );
            })
            .run();
    }

    #[test]
    fn test_shortening_a_multi_day_event_clears_overnight_times() {
        let mut state = at(loaded(), 1);
        state.steps[1].kind = StepKind::Date(DateConfig {
            allow_multi_day: true,
            ..DateConfig::default()
        });

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::SelectDate {
                start_date: "2025-06-01".parse().unwrap(),
                end_date: Some("2025-06-02".parse().unwrap()),
            })
            .when_action(WizardAction::SelectTimes {
                start_time: Some("18:00:00".parse().unwrap()),
                end_time: Some("02:00:00".parse().unwrap()),
            })
            .when_action(WizardAction::SelectDate {
                start_date: "2025-06-01".parse().unwrap(),
                end_date: None,
            })
            .then_state(|state| {
                assert_eq!(state.form.start_date, Some("2025-06-01".parse().unwrap()));
                assert!(state.form.start_time.is_none());
                assert!(state.form.end_time.is_none());
                assert_eq!(
                    state.field_errors,
                    vec!["The end time must be after the start time".to_string()]
                );
                assert!(state.form.end_timestamp() >= state.form.start_timestamp());
            })
            .run();
    }

    #[test]
    fn test_end_time_must_follow_start_time() {
        let mut state = at(loaded(), 1);
        state.form.start_date = Some("2025-06-01".parse().unwrap());

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::SelectTimes {
                start_time: Some("18:00:00".parse().unwrap()),
                end_time: Some("17:00:00".parse().unwrap()),
            })
            .then_state(|state| {
                assert!(state.form.start_time.is_none());
                assert!(!state.field_errors.is_empty());
            })
            .run();
    }

    #[test]
    fn test_selection_recomputes_total_and_deposit() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(at(loaded(), 2))
            .when_action(WizardAction::SelectProduct {
                step: StepId::new(3),
                product: ProductId::new(10),
                quantity: 3,
            })
            .then_state(|state| {
                assert_eq!(state.form.total_amount, Money::from_units(225));
                assert_eq!(state.form.deposit_amount, Money::from_cents(6_750));
                assert_eq!(state.summary().len(), 1);
            })
            .run();
    }

    #[test]
    fn test_selecting_an_unoffered_product_is_refused() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(at(loaded(), 2))
            .when_action(WizardAction::SelectProduct {
                step: StepId::new(3),
                product: ProductId::new(99),
                quantity: 1,
            })
            .then_state(|state| {
                assert!(state.form.selected_packages.is_empty());
                assert_eq!(state.form.total_amount, Money::ZERO);
                assert_eq!(state.field_errors.len(), 1);
            })
            .run();
    }

    // ===== Submission =====

    #[test]
    fn test_submit_is_refused_off_the_payment_step() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(at(ready_to_submit(), 2))
            .when_action(WizardAction::Submit)
            .then_state(|state| {
                assert!(state.submitting.is_none());
                assert!(state.last_error.is_some());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_submit_is_refused_with_an_incomplete_step() {
        let mut state = ready_to_submit();
        state.form.selected_packages.clear();

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::Submit)
            .then_state(|state| {
                assert!(state.submitting.is_none());
                assert_eq!(state.last_error.as_deref(), Some("Step 'Step 3' is incomplete"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_submit_creates_the_event() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(ready_to_submit())
            .when_action(WizardAction::Submit)
            .then_state(|state| {
                assert_eq!(state.submitting, Some(SubmitStage::CreateEvent));
                assert_eq!(state.submission, 1);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_second_submit_is_ignored() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(ready_to_submit())
            .when_action(WizardAction::Submit)
            .when_action(WizardAction::Submit)
            .then_state(|state| {
                assert_eq!(state.submitting, Some(SubmitStage::CreateEvent));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_selection_is_locked_while_submitting() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(ready_to_submit())
            .when_action(WizardAction::Submit)
            .when_action(WizardAction::SelectProduct {
                step: StepId::new(3),
                product: ProductId::new(10),
                quantity: 0,
            })
            .then_state(|state| {
                assert_eq!(state.form.selected_packages.get(&ProductId::new(10)), Some(&3));
                assert_eq!(state.form.total_amount, Money::from_units(225));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    fn created(id: i64) -> Event {
        Event {
            id: EventId::new(id),
            name: "Wedding".into(),
            status: EventStatus::Pending,
            event_type: Some(EventTypeId::new(1)),
            client: Some(ClientId::new(7)),
            start_time: None,
            end_time: None,
            total_price: Some(Money::from_units(225)),
        }
    }

    #[test]
    fn test_event_created_attaches_products() {
        let mut state = ready_to_submit();
        state.submitting = Some(SubmitStage::CreateEvent);

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::EventCreated {
                submission: 0,
                event: created(40),
            })
            .then_state(|state| {
                assert_eq!(state.event_id, Some(EventId::new(40)));
                assert_eq!(state.submitting, Some(SubmitStage::AttachProducts));
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn test_answers_are_saved_before_products() {
        let mut state = ready_to_submit();
        state.form.questionnaire_responses.insert(QuestionId::new(8), "120 guests".into());
        state.submitting = Some(SubmitStage::CreateEvent);

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::EventCreated {
                submission: 0,
                event: created(42),
            })
            .then_state(|state| {
                assert_eq!(state.event_id, Some(EventId::new(42)));
                assert_eq!(state.submitting, Some(SubmitStage::SaveResponses));
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_saved_answers_lead_to_product_attachment() {
        let mut state = ready_to_submit();
        state.submitting = Some(SubmitStage::SaveResponses);
        state.event_id = Some(EventId::new(42));

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::ResponsesSaved {
                submission: 0,
                event: EventId::new(42),
            })
            .then_state(|state| {
                assert_eq!(state.submitting, Some(SubmitStage::AttachProducts));
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn test_response_from_an_abandoned_submission_is_ignored() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(ready_to_submit())
            .when_action(WizardAction::Submit)
            .when_action(WizardAction::SubmitFailed {
                submission: 1,
                stage: SubmitStage::CreateEvent,
                error: "Request failed: timeout".into(),
            })
            .when_action(WizardAction::Submit)
            .when_action(WizardAction::EventCreated {
                submission: 1,
                event: created(40),
            })
            .then_state(|state| {
                assert_eq!(state.submission, 2);
                assert_eq!(state.submitting, Some(SubmitStage::CreateEvent));
                assert!(state.event_id.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_reset_keeps_submission_numbering() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(ready_to_submit())
            .when_action(WizardAction::Submit)
            .when_action(WizardAction::Reset)
            .when_action(WizardAction::EventCreated {
                submission: 1,
                event: created(40),
            })
            .then_state(|state| {
                assert_eq!(state.submission, 1);
                assert!(state.submitting.is_none());
                assert!(state.event_id.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_without_products_or_payment_method_booking_completes() {
        let mut state = ready_to_submit();
        state.steps[2].is_required = false;
        state.steps[3].is_required = false;
        state.form.selected_packages.clear();
        state.form.payment_method = None;
        state.submitting = Some(SubmitStage::CreateEvent);

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::EventCreated {
                submission: 0,
                event: created(41),
            })
            .then_state(|state| {
                assert!(state.completed);
                assert!(state.submitting.is_none());
                assert_eq!(state.cursor.index(), 4);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_payment_processed_confirms_event() {
        let mut state = ready_to_submit();
        state.submitting = Some(SubmitStage::ProcessPayment);
        let payment = PaymentResult {
            id: PaymentId::new(3),
            amount: Money::from_units(225),
            status: "SUCCEEDED".into(),
            transaction_id: None,
        };

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::PaymentProcessed {
                submission: 0,
                event: EventId::new(40),
                payment,
            })
            .when_action(WizardAction::EventConfirmed {
                submission: 0,
                event: EventId::new(40),
            })
            .then_state(|state| {
                assert!(state.completed);
                assert_eq!(state.payment.as_ref().map(|p| p.id), Some(PaymentId::new(3)));
                assert_eq!(state.current_step().map(Step::step_type), Some(StepType::Confirmation));
            })
            .run();
    }

    #[test]
    fn test_failed_stage_is_reported_with_its_label() {
        let mut state = ready_to_submit();
        state.submitting = Some(SubmitStage::ProcessPayment);
        state.event_id = Some(EventId::new(40));

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::SubmitFailed {
                submission: 0,
                stage: SubmitStage::ProcessPayment,
                error: "Validation failed: card declined".into(),
            })
            .then_state(|state| {
                assert!(state.submitting.is_none());
                assert!(!state.completed);
                assert_eq!(
                    state.last_error.as_deref(),
                    Some("Processing payment: Validation failed: card declined")
                );
                assert_eq!(state.cursor.index(), 3);
            })
            .run();
    }

    #[test]
    fn test_completion_without_confirmation_step_lands_on_last_step() {
        let mut state = ready_to_submit();
        state.steps.pop();
        state.cursor = StepCursor::new(state.steps.len());
        state.cursor.goto(3);
        state.submitting = Some(SubmitStage::ConfirmEvent);

        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::EventConfirmed {
                submission: 0,
                event: EventId::new(40),
            })
            .then_state(|state| {
                assert!(state.completed);
                assert_eq!(state.cursor.index(), 3);
            })
            .run();
    }

    #[test]
    fn test_reset() {
        ReducerTest::new(WizardReducer::new())
            .with_env(env())
            .given_state(ready_to_submit())
            .when_action(WizardAction::Reset)
            .then_state(|state| {
                assert!(!state.is_initialized());
                assert_eq!(state.form, BookingFormData::default());
            })
            .run();
    }
}
