//! Booking flow definitions: flows, steps and per-step configuration
//!
//! The backend describes a step with a `step_type` string and up to four
//! optional config objects. [`Step`] folds that into a [`StepKind`] in which
//! each variant carries exactly the config it needs.

use crate::types::{EventTypeId, FlowId, Money, ProductId, QuestionId, QuestionnaireId, StepId};
use serde::{Deserialize, Serialize};

/// A backend-configured booking flow for one event type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFlow {
    /// Flow id
    pub id: FlowId,
    /// Display name
    pub name: String,
    /// Event type this flow books
    pub event_type: EventTypeId,
    /// Whether the flow is offered to clients
    #[serde(default)]
    pub is_active: bool,
    /// Share of the total charged when the client pays a deposit (0..=100)
    #[serde(default)]
    pub deposit_percentage: Option<u8>,
}

/// Step type discriminator as sent by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    /// Welcome screen
    Intro,
    /// Event type selection
    EventType,
    /// Date and time selection
    Date,
    /// Questionnaire answers
    Questionnaire,
    /// Package selection
    Product,
    /// Add-on selection
    Addon,
    /// Order review
    Summary,
    /// Payment method and deposit choice
    Payment,
    /// Booking confirmed screen
    Confirmation,
    /// Custom component
    Custom,
}

/// Date step configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// Earliest selectable date, in days from today
    pub min_days_in_future: u32,
    /// Latest selectable date, in days from today
    pub max_days_in_future: u32,
    /// Setup time blocked before the event
    pub buffer_before_minutes: u32,
    /// Teardown time blocked after the event
    pub buffer_after_minutes: u32,
    /// Whether an end date different from the start date is allowed
    pub allow_multi_day: bool,
    /// Whether start/end times can be chosen
    pub allow_time_selection: bool,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            min_days_in_future: 0,
            max_days_in_future: 365,
            buffer_before_minutes: 0,
            buffer_after_minutes: 0,
            allow_multi_day: false,
            allow_time_selection: true,
        }
    }
}

/// One question of a questionnaire step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question id
    pub id: QuestionId,
    /// Question text
    #[serde(alias = "text")]
    pub label: String,
    /// Whether an answer is mandatory
    #[serde(default)]
    pub is_required: bool,
}

/// Questionnaire step configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionnaireConfig {
    /// Questionnaire presented on this step
    #[serde(alias = "questionnaire_id")]
    pub questionnaire: Option<QuestionnaireId>,
    /// Questions, in display order
    pub questions: Vec<Question>,
}

impl QuestionnaireConfig {
    /// Questions that must be answered
    pub fn required_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.is_required)
    }
}

/// How many items a product step accepts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionMode {
    /// Picking an item replaces the previous pick
    Single,
    /// Several items up to `max_selection`
    #[default]
    Multiple,
}

/// A product from the catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// Product id
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Catalog description
    #[serde(default)]
    pub description: String,
    /// Catalog price
    pub base_price: Money,
}

/// A catalog product offered on a product or add-on step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductItem {
    /// The catalog product
    pub product: CatalogProduct,
    /// Flow-specific price, overrides the catalog price
    #[serde(default)]
    pub custom_price: Option<Money>,
    /// Flow-specific description, overrides the catalog description
    #[serde(default)]
    pub custom_description: Option<String>,
    /// Whether the item is shown as recommended
    #[serde(default)]
    pub is_highlighted: bool,
    /// Display position
    #[serde(default)]
    pub order: i32,
}

impl ProductItem {
    /// Price charged per unit
    #[must_use]
    pub fn unit_price(&self) -> Money {
        self.custom_price.unwrap_or(self.product.base_price)
    }

    /// Description shown to the client
    #[must_use]
    pub fn description(&self) -> &str {
        self.custom_description
            .as_deref()
            .unwrap_or(&self.product.description)
    }
}

/// Product and add-on step configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductConfig {
    /// Minimum number of distinct items to select
    pub min_selection: u32,
    /// Maximum number of distinct items, unlimited when absent
    pub max_selection: Option<u32>,
    /// Single or multiple choice
    pub selection_mode: SelectionMode,
    /// Offered items, sorted by `order`
    pub items: Vec<ProductItem>,
}

impl ProductConfig {
    /// The offered item for a catalog product
    #[must_use]
    pub fn item(&self, product: ProductId) -> Option<&ProductItem> {
        self.items.iter().find(|item| item.product.id == product)
    }
}

/// Custom step configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomConfig {
    /// Name of the front-end component to render
    pub component: String,
    /// Component settings
    pub settings: serde_json::Value,
}

/// A step as serialized by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step id
    pub id: StepId,
    /// Step type discriminator
    pub step_type: StepType,
    /// Heading
    #[serde(default)]
    pub title: String,
    /// Sub-heading
    #[serde(default)]
    pub description: Option<String>,
    /// Traversal position within the flow
    pub order: i32,
    /// Whether the step must be valid before moving on
    #[serde(default)]
    pub is_required: bool,
    /// Whether the step is shown
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
    /// Present for DATE steps
    #[serde(default)]
    pub date_config: Option<DateConfig>,
    /// Present for QUESTIONNAIRE steps
    #[serde(default)]
    pub questionnaire_config: Option<QuestionnaireConfig>,
    /// Present for PRODUCT and ADDON steps
    #[serde(default)]
    pub product_config: Option<ProductConfig>,
    /// Present for CUSTOM steps
    #[serde(default)]
    pub custom_config: Option<CustomConfig>,
}

const fn visible_by_default() -> bool {
    true
}

/// Step behaviour with its type-specific configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// Welcome screen
    Intro,
    /// Event type selection
    EventType,
    /// Date and time selection
    Date(DateConfig),
    /// Questionnaire answers
    Questionnaire(QuestionnaireConfig),
    /// Package selection
    Product(ProductConfig),
    /// Add-on selection
    Addon(ProductConfig),
    /// Order review
    Summary,
    /// Payment method and deposit choice
    Payment,
    /// Booking confirmed screen
    Confirmation,
    /// Custom component
    Custom(CustomConfig),
}

impl StepKind {
    /// Wire discriminator for this kind
    #[must_use]
    pub const fn step_type(&self) -> StepType {
        match self {
            Self::Intro => StepType::Intro,
            Self::EventType => StepType::EventType,
            Self::Date(_) => StepType::Date,
            Self::Questionnaire(_) => StepType::Questionnaire,
            Self::Product(_) => StepType::Product,
            Self::Addon(_) => StepType::Addon,
            Self::Summary => StepType::Summary,
            Self::Payment => StepType::Payment,
            Self::Confirmation => StepType::Confirmation,
            Self::Custom(_) => StepType::Custom,
        }
    }
}

/// A booking flow step
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    /// Step id
    pub id: StepId,
    /// Heading
    pub title: String,
    /// Sub-heading
    pub description: Option<String>,
    /// Traversal position within the flow
    pub order: i32,
    /// Whether the step must be valid before moving on
    pub is_required: bool,
    /// Whether the step is shown
    pub is_visible: bool,
    /// Behaviour and configuration
    pub kind: StepKind,
}

impl Step {
    /// Wire discriminator of this step
    #[must_use]
    pub const fn step_type(&self) -> StepType {
        self.kind.step_type()
    }

    /// Product configuration of a PRODUCT or ADDON step
    #[must_use]
    pub const fn product_config(&self) -> Option<&ProductConfig> {
        match &self.kind {
            StepKind::Product(config) | StepKind::Addon(config) => Some(config),
            _ => None,
        }
    }
}

impl From<StepRecord> for Step {
    fn from(record: StepRecord) -> Self {
        let sorted = |mut config: ProductConfig| {
            config.items.sort_by_key(|item| item.order);
            config
        };

        let kind = match record.step_type {
            StepType::Intro => StepKind::Intro,
            StepType::EventType => StepKind::EventType,
            StepType::Date => StepKind::Date(record.date_config.unwrap_or_default()),
            StepType::Questionnaire => {
                StepKind::Questionnaire(record.questionnaire_config.unwrap_or_default())
            },
            StepType::Product => StepKind::Product(sorted(record.product_config.unwrap_or_default())),
            StepType::Addon => StepKind::Addon(sorted(record.product_config.unwrap_or_default())),
            StepType::Summary => StepKind::Summary,
            StepType::Payment => StepKind::Payment,
            StepType::Confirmation => StepKind::Confirmation,
            StepType::Custom => StepKind::Custom(record.custom_config.unwrap_or_default()),
        };

        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            order: record.order,
            is_required: record.is_required,
            is_visible: record.is_visible,
            kind,
        }
    }
}
