//! Event Model

use serde::{Deserialize, Serialize};

use crate::lenient;

/// Default title for events created without one
pub const DEFAULT_EVENT_TITLE: &str = "Evento Inter Club";

/// Club event members can book a seat for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    /// Free text, shown as entered
    #[serde(default, deserialize_with = "lenient::string")]
    pub date: String,
    /// 0 = unlimited
    #[serde(default, deserialize_with = "lenient::count")]
    pub capacity: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub note: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub created_at: i64,
}

impl Event {
    pub fn is_unlimited(&self) -> bool {
        self.capacity == 0
    }
}

/// Create event payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub date: String,
    pub capacity: u32,
    pub note: String,
}
