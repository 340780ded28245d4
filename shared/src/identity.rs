//! Card identity normalization
//!
//! Card numbers are free-form strings that may start with letters (`S…`, `J…`).
//! Every boundary (login, roster edits, CSV import, booking and quiz-answer
//! keys) goes through [`normalize_card`], so `" s123 "` and `"S123"` always
//! resolve to the same member.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Strip every whitespace character and upper-case the rest.
pub fn normalize_card(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized card identifier (会员卡号)
///
/// Construction always normalizes, including deserialization, so a `CardId`
/// read off the wire or out of local storage is already a canonical key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    pub fn new(raw: &str) -> Self {
        Self(normalize_card(raw))
    }

    /// Parse user input, returning `None` when nothing is left after normalization.
    pub fn parse(raw: &str) -> Option<Self> {
        let id = Self::new(raw);
        (!id.is_empty()).then_some(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl<'de> Deserialize<'de> for CardId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // 兼容旧数据：卡号可能被存成数字
        let value = serde_json::Value::deserialize(deserializer)?;
        let raw = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        Ok(Self::new(&raw))
    }
}
