use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    AttendanceRecord,
    LeaveRequest,
}

/// Append-only activity entry, one per mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub subject_type: SubjectType,
    pub subject_id: u64,
    pub actor_id: u64,
    pub action: String,
    pub old_payload: Option<Value>,
    pub new_payload: Option<Value>,
    pub timestamp: NaiveDateTime,
}

impl ActivityLogEntry {
    pub fn new(
        subject_type: SubjectType,
        subject_id: u64,
        actor_id: u64,
        action: &str,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            subject_type,
            subject_id,
            actor_id,
            action: action.to_string(),
            old_payload: None,
            new_payload: None,
            timestamp,
        }
    }

    pub fn before<T: Serialize>(mut self, payload: &T) -> Self {
        self.old_payload = serde_json::to_value(payload).ok();
        self
    }

    pub fn after<T: Serialize>(mut self, payload: &T) -> Self {
        self.new_payload = serde_json::to_value(payload).ok();
        self
    }
}
