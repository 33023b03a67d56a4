//! Transient notifications shown after a mutation settles

use std::time::Duration;

/// How long a notification stays visible
pub const TOAST_TTL: Duration = Duration::from_secs(4);

/// Notification tone
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    /// The mutation went through
    Success,
    /// The mutation was rejected and rolled back
    Error,
}

/// One notification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    /// Id used to dismiss it
    pub id: u64,
    /// Tone
    pub kind: ToastKind,
    /// Text
    pub message: String,
}

/// Visible notifications, oldest first
#[derive(Clone, Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
    next_id: u64,
}

impl Toasts {
    /// Show a notification and return its id
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.items.push(Toast {
            id,
            kind,
            message: message.into(),
        });
        id
    }

    /// Remove a notification; unknown ids are ignored
    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|toast| toast.id != id);
    }

    /// Visible notifications
    #[must_use]
    pub fn items(&self) -> &[Toast] {
        &self.items
    }

    /// Most recent notification
    #[must_use]
    pub fn last(&self) -> Option<&Toast> {
        self.items.last()
    }
}
