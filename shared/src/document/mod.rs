//! Shared document
//!
//! The single club-wide aggregate the server owns and every client caches.
//! Reads are hardened: each field goes through a tolerant reader, so after
//! deserialization no collection is missing and no scalar has the wrong type.
//!
//! `version` is assigned by the server only. Clients carry the last value they
//! saw forward and never bump it themselves.

mod ops;

pub use ops::MutationEffect;

use serde::{Deserialize, Serialize};

use crate::ledger::PointsLedger;
use crate::lenient;
use crate::models::{BookingTable, Event, Member, Quiz, QuizAnswers, TicketConfig};

/// Club-wide state, unit of server truth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedDocument {
    #[serde(default = "initial_version", deserialize_with = "lenient::version")]
    pub version: u64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub updated_at: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub bulletin: String,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub events: Vec<Event>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub quiz: Option<Quiz>,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub members: Vec<Member>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub points_rules_text: String,
    #[serde(
        rename = "ticketCfg",
        alias = "ticketConfig",
        default,
        deserialize_with = "lenient::or_default"
    )]
    pub ticket_cfg: TicketConfig,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub points: PointsLedger,
    #[serde(default, deserialize_with = "lenient::nested_map")]
    pub bookings: BookingTable,
    #[serde(default, deserialize_with = "lenient::map")]
    pub quiz_answers: QuizAnswers,
}

fn initial_version() -> u64 {
    1
}

impl Default for SharedDocument {
    fn default() -> Self {
        Self {
            version: initial_version(),
            updated_at: 0,
            bulletin: String::new(),
            events: Vec::new(),
            quiz: None,
            members: Vec::new(),
            points_rules_text: String::new(),
            ticket_cfg: TicketConfig::default(),
            points: PointsLedger::default(),
            bookings: BookingTable::default(),
            quiz_answers: QuizAnswers::default(),
        }
    }
}

impl SharedDocument {
    /// Parse a JSON value with the hardening rules; never fails.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Stamp a local write
    pub fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Events newest first (by creation time)
    pub fn events_newest_first(&self) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events.iter().collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events
    }

    pub fn member(&self, card: &crate::identity::CardId) -> Option<&Member> {
        self.members.iter().find(|m| &m.card_id == card)
    }
}
