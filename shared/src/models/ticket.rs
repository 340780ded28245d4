//! Ticket link configuration

use serde::{Deserialize, Serialize};

use crate::lenient;

pub const DEFAULT_TICKET_LABEL: &str = "Biglietti Inter";
pub const DEFAULT_TICKET_URL: &str = "https://www.inter.it/it/biglietteria";

/// Label and URL of the ticket shop button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketConfig {
    #[serde(default, deserialize_with = "lenient::string")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub url: String,
}

impl TicketConfig {
    /// Blank fields fall back to the defaults
    pub fn new(label: &str, url: &str) -> Self {
        let label = label.trim();
        let url = url.trim();
        Self {
            label: if label.is_empty() { DEFAULT_TICKET_LABEL } else { label }.to_string(),
            url: if url.is_empty() { DEFAULT_TICKET_URL } else { url }.to_string(),
        }
    }
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}
