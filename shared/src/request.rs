//! Request types
//!
//! Bodies the client sends to the canonical-document service.

use serde::{Deserialize, Serialize};

use crate::document::SharedDocument;
use crate::identity::CardId;
use crate::lenient;
use crate::models::QuizLetter;

/// Canonical document resource (GET = pull, POST = push)
pub const APP_DATA_PATH: &str = "/.netlify/functions/appData";
/// Cooperative mutation endpoint
pub const MUTATE_PATH: &str = "/.netlify/functions/mutate";

/// Full-document push, admin only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRequest {
    #[serde(default, deserialize_with = "lenient::string")]
    pub pin: String,
    #[serde(default, deserialize_with = "crate::schema::deserialize_document")]
    pub payload: SharedDocument,
}

/// Named member mutation; carries only what the server needs to adjudicate it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Mutation {
    #[serde(rename = "book")]
    Book {
        #[serde(rename = "eventId")]
        event_id: String,
        #[serde(default = "one_seat")]
        seats: u32,
    },
    #[serde(rename = "cancel")]
    Cancel {
        #[serde(rename = "eventId")]
        event_id: String,
    },
    #[serde(rename = "quizAnswer")]
    QuizAnswer {
        #[serde(rename = "quizId")]
        quiz_id: String,
        letter: QuizLetter,
    },
}

fn one_seat() -> u32 {
    1
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Book { .. } => "book",
            Self::Cancel { .. } => "cancel",
            Self::QuizAnswer { .. } => "quizAnswer",
        }
    }
}

/// `{ tessera, type, ...fields }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRequest {
    pub tessera: CardId,
    #[serde(flatten)]
    pub mutation: Mutation,
}

impl MutationRequest {
    pub fn new(card: CardId, mutation: Mutation) -> Self {
        Self {
            tessera: card,
            mutation,
        }
    }
}
