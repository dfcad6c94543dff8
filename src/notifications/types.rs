//! Notification record model: shapes, identity, and filters.

use std::fmt;

use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Rendering style of a record. Governs presentation only; no behavioral
/// branching hangs off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// A single suggested follow-up action, at most one per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotificationAction {
    OpenUrl { url: String },
}

/// Opaque record identity assigned by the center.
///
/// Zero-padded hex epoch-millis followed by a random alphanumeric suffix,
/// so lexicographic order follows creation time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn generate(created_at_millis: i64) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        Self(format!("{:012x}-{}", created_at_millis.max(0), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload a feature module hands to [`NotificationCenter::emit`].
///
/// [`NotificationCenter::emit`]: crate::notifications::NotificationCenter::emit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmitRequest {
    pub module_id: String,
    #[serde(default)]
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NotificationAction>,
}

/// The persisted unit of state. Immutable after creation except for the
/// `read` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub module_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NotificationAction>,
    /// Epoch millis assigned at emit time.
    pub created_at: i64,
    #[serde(default)]
    pub read: bool,
}

impl NotificationRecord {
    pub fn new(request: EmitRequest, id: NotificationId, created_at: i64) -> Self {
        Self {
            id,
            module_id: request.module_id,
            kind: request.kind,
            title: request.title,
            message: request.message,
            action: request.action,
            created_at,
            read: false,
        }
    }

    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

/// Current epoch millis.
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Conjunctive filter for [`NotificationCenter::list`].
///
/// [`NotificationCenter::list`]: crate::notifications::NotificationCenter::list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListFilter {
    pub module_id: Option<String>,
    pub unread_only: bool,
}

impl ListFilter {
    pub fn for_module(module_id: impl Into<String>) -> Self {
        Self {
            module_id: Some(module_id.into()),
            unread_only: false,
        }
    }

    pub fn unread() -> Self {
        Self {
            module_id: None,
            unread_only: true,
        }
    }

    pub fn matches(&self, record: &NotificationRecord) -> bool {
        if let Some(module_id) = &self.module_id {
            if &record.module_id != module_id {
                return false;
            }
        }
        if self.unread_only && record.read {
            return false;
        }
        true
    }
}

/// Collection counters, cheap to expose to badge renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationStats {
    pub total: usize,
    pub unread: usize,
}
