//! Transient status alert.
//!
//! # Invariants
//! - At most one alert exists; showing a new one replaces the old one.

pub const MSG_MISSING_DETAILS: &str = "please enter details";
pub const MSG_PERSON_ADDED: &str = "person added to list";
pub const MSG_DETAILS_CHANGED: &str = "details changed";
pub const MSG_PERSON_REMOVED: &str = "person removed";
pub const MSG_LIST_CLEARED: &str = "everything cleared";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    Success,
    Error,
}

/// Alert banner state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Alert {
    pub visible: bool,
    pub severity: Option<AlertSeverity>,
    pub message: String,
}

impl Alert {
    /// Visible success alert.
    pub fn success(message: impl Into<String>) -> Self {
        Self::shown(AlertSeverity::Success, message)
    }

    /// Visible error alert.
    pub fn error(message: impl Into<String>) -> Self {
        Self::shown(AlertSeverity::Error, message)
    }

    fn shown(severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            visible: true,
            severity: Some(severity),
            message: message.into(),
        }
    }

    /// Hidden alert.
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn is_error(&self) -> bool {
        self.visible && self.severity == Some(AlertSeverity::Error)
    }
}
