//! Points ledger
//!
//! Loyalty balances keyed by card. Every change goes through
//! [`PointsLedger::add`], which clamps at zero: a negative delta can empty a
//! balance but never push it below the floor.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::identity::CardId;
use crate::lenient::{entries, value_to_i64};

/// Awarded when a seat is booked
pub const BOOKING_REWARD: i64 = 10;
/// Taken back when a booking is cancelled
pub const CANCELLATION_PENALTY: i64 = -10;
/// Awarded for a correct quiz answer
pub const QUIZ_REWARD: i64 = 2;

/// One rule per line, shown to members when the admin has not written any
pub const DEFAULT_POINTS_RULES: [&str; 3] = [
    "+10 punti ogni prenotazione",
    "−10 punti se annulli la prenotazione",
    "+2 punti se rispondi correttamente al quiz",
];

pub fn default_points_rules_text() -> String {
    DEFAULT_POINTS_RULES.join("\n")
}

/// Non-blank trimmed lines of a rules text, defaults when none are left
pub fn points_rules_lines(text: &str) -> Vec<String> {
    let lines: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if lines.is_empty() {
        DEFAULT_POINTS_RULES.iter().map(|s| s.to_string()).collect()
    } else {
        lines
    }
}

/// card -> balance, never negative
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PointsLedger(BTreeMap<CardId, i64>);

impl PointsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, card: &CardId) -> i64 {
        self.0.get(card).copied().unwrap_or(0)
    }

    /// Apply `delta` and return the new balance, clamped at zero.
    pub fn add(&mut self, card: &CardId, delta: i64) -> i64 {
        let entry = self.0.entry(card.clone()).or_insert(0);
        *entry = (*entry).saturating_add(delta).max(0);
        *entry
    }

    /// Zero every balance (admin full reset)
    pub fn reset(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CardId, i64)> {
        self.0.iter().map(|(k, v)| (k, *v))
    }
}

impl FromIterator<(CardId, i64)> for PointsLedger {
    fn from_iter<I: IntoIterator<Item = (CardId, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k, v.max(0))).collect())
    }
}

/// Balances are read one by one: numeric strings and floats are accepted,
/// negatives read as 0 and unreadable entries are dropped.
impl<'de> Deserialize<'de> for PointsLedger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let balances = entries(value, |v| value_to_i64(&v).map(|n| n.max(0)));
        Ok(Self(balances))
    }
}
