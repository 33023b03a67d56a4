//! CRUD resources managed from the admin console
//!
//! Each resource names its collection path, its id, its create payload and
//! its list filters. The generic endpoints on [`ApiClient`](crate::ApiClient)
//! and the admin cache are written once against [`Resource`].

use crate::types::{ClientId, ConfigId, EventTypeId, ItemId, Money, NoteId, ProductId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A REST collection with list/create/update/delete
pub trait Resource: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identifier type
    type Id: Copy + Eq + fmt::Debug + fmt::Display + From<i64> + Send + Sync + 'static;

    /// Create payload
    type Draft: Clone + fmt::Debug + Serialize + Send + Sync + 'static;

    /// List filters
    type Query: Clone + fmt::Debug + Default + Serialize + Send + Sync + 'static;

    /// Collection path, with leading and trailing slash
    const PATH: &'static str;

    /// Human-readable singular name, used in notifications
    const LABEL: &'static str;

    /// This entity's id
    fn id(&self) -> Self::Id;

    /// The entity the server is expected to return for `draft`, under a
    /// temporary id
    fn provisional(draft: &Self::Draft, id: Self::Id) -> Self;
}

// ============================================================================
// Booking flow configs
// ============================================================================

/// Admin-side booking flow configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFlowConfig {
    /// Config id
    pub id: ConfigId,
    /// Display name
    pub name: String,
    /// Event type the config applies to
    pub event_type: EventTypeId,
    /// Whether the config is live
    #[serde(default)]
    pub is_active: bool,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Deposit share (0..=100)
    #[serde(default)]
    pub deposit_percentage: Option<u8>,
}

/// Create payload for [`BookingFlowConfig`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BookingFlowConfigDraft {
    /// Display name
    pub name: String,
    /// Event type the config applies to
    pub event_type: EventTypeId,
    /// Whether the config is live
    pub is_active: bool,
    /// Free-text description
    pub description: String,
    /// Deposit share (0..=100)
    pub deposit_percentage: Option<u8>,
}

/// List filters for `/bookingflow/configs/`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConfigQuery {
    /// Page number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Event type filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventTypeId>,
    /// Active filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Resource for BookingFlowConfig {
    type Id = ConfigId;
    type Draft = BookingFlowConfigDraft;
    type Query = ConfigQuery;

    const PATH: &'static str = "/bookingflow/configs/";
    const LABEL: &'static str = "Booking flow";

    fn id(&self) -> ConfigId {
        self.id
    }

    fn provisional(draft: &BookingFlowConfigDraft, id: ConfigId) -> Self {
        Self {
            id,
            name: draft.name.clone(),
            event_type: draft.event_type,
            is_active: draft.is_active,
            description: draft.description.clone(),
            deposit_percentage: draft.deposit_percentage,
        }
    }
}

// ============================================================================
// Booking flow items
// ============================================================================

/// A product offered by a booking flow config
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingFlowItem {
    /// Item id
    pub id: ItemId,
    /// Owning config
    pub config: ConfigId,
    /// Catalog product
    pub product: ProductId,
    /// Price override
    #[serde(default)]
    pub custom_price: Option<Money>,
    /// Description override
    #[serde(default)]
    pub custom_description: Option<String>,
    /// Shown as recommended
    #[serde(default)]
    pub is_highlighted: bool,
    /// Display position
    #[serde(default)]
    pub order: i32,
}

/// Create payload for [`BookingFlowItem`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BookingFlowItemDraft {
    /// Owning config
    pub config: ConfigId,
    /// Catalog product
    pub product: ProductId,
    /// Price override
    pub custom_price: Option<Money>,
    /// Description override
    pub custom_description: Option<String>,
    /// Shown as recommended
    pub is_highlighted: bool,
    /// Display position
    pub order: i32,
}

/// List filters for `/bookingflow/items/`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ItemQuery {
    /// Page number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Config filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigId>,
}

impl Resource for BookingFlowItem {
    type Id = ItemId;
    type Draft = BookingFlowItemDraft;
    type Query = ItemQuery;

    const PATH: &'static str = "/bookingflow/items/";
    const LABEL: &'static str = "Booking flow item";

    fn id(&self) -> ItemId {
        self.id
    }

    fn provisional(draft: &BookingFlowItemDraft, id: ItemId) -> Self {
        Self {
            id,
            config: draft.config,
            product: draft.product,
            custom_price: draft.custom_price,
            custom_description: draft.custom_description.clone(),
            is_highlighted: draft.is_highlighted,
            order: draft.order,
        }
    }
}

// ============================================================================
// Notes
// ============================================================================

/// A CRM note attached to a client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Note id
    pub id: NoteId,
    /// Client the note is about
    pub client: ClientId,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Body
    pub content: String,
    /// Creation time, set by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create payload for [`Note`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NoteDraft {
    /// Client the note is about
    pub client: ClientId,
    /// Title
    pub title: String,
    /// Body
    pub content: String,
}

/// List filters for `/notes/`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NoteQuery {
    /// Page number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Client filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientId>,
}

impl Resource for Note {
    type Id = NoteId;
    type Draft = NoteDraft;
    type Query = NoteQuery;

    const PATH: &'static str = "/notes/";
    const LABEL: &'static str = "Note";

    fn id(&self) -> NoteId {
        self.id
    }

    fn provisional(draft: &NoteDraft, id: NoteId) -> Self {
        Self {
            id,
            client: draft.client,
            title: draft.title.clone(),
            content: draft.content.clone(),
            created_at: None,
        }
    }
}
