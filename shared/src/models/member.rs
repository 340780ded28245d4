//! Member Model

use serde::{Deserialize, Serialize};

use crate::identity::{CardId, normalize_name};
use crate::lenient;

/// Club member (会员)
///
/// Identity is the normalized card number; the roster never holds two
/// members with the same card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "tessera", alias = "cardId", default)]
    pub card_id: CardId,
    #[serde(default, alias = "displayName", deserialize_with = "lenient::string")]
    pub name: String,
}

impl Member {
    pub fn new(card_id: CardId, name: &str) -> Self {
        Self {
            card_id,
            name: normalize_name(name),
        }
    }

    /// Name to greet the member with
    pub fn display_name(&self) -> String {
        let name = normalize_name(&self.name);
        if name.is_empty() {
            "Socio".to_string()
        } else {
            name
        }
    }
}

/// Merge `incoming` into `roster` keyed by card; later entries overwrite
/// earlier ones in place, new cards are appended.
pub fn merge_roster(roster: &mut Vec<Member>, incoming: impl IntoIterator<Item = Member>) {
    for member in incoming {
        if member.card_id.is_empty() {
            continue;
        }
        match roster.iter_mut().find(|m| m.card_id == member.card_id) {
            Some(existing) => *existing = member,
            None => roster.push(member),
        }
    }
}
