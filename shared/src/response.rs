//! Response types
//!
//! Pull, push and mutation responses share one envelope:
//!
//! ```json
//! { "ok": true, "payload": { ...shared document... } }
//! { "ok": false, "code": "E1102", "error": "Sold out: EV-1" }
//! ```

use serde::{Deserialize, Serialize};

use crate::document::SharedDocument;

/// Response envelope of the canonical-document service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppDataEnvelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::schema::deserialize_document_opt"
    )]
    pub payload: Option<SharedDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AppDataEnvelope {
    pub fn success(payload: SharedDocument) -> Self {
        Self {
            ok: true,
            payload: Some(payload),
            code: None,
            error: None,
        }
    }

    pub fn failure(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload: None,
            code: Some(code.into()),
            error: Some(error.into()),
        }
    }
}
