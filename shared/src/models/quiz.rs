//! Quiz Model

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DomainError, DomainResult};
use crate::identity::CardId;
use crate::lenient;

/// Option letter of a four-choice quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QuizLetter {
    A,
    B,
    C,
    D,
}

impl QuizLetter {
    pub const ALL: [QuizLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Case-insensitive, surrounding whitespace ignored
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl<'de> Deserialize<'de> for QuizLetter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid quiz letter: {raw:?}")))
    }
}

impl fmt::Display for QuizLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(rename = "q", default, deserialize_with = "lenient::string")]
    pub question: String,
    #[serde(rename = "opts", default, deserialize_with = "lenient::seq")]
    pub options: Vec<String>,
    pub correct: QuizLetter,
    /// Event this quiz is bound to; deleting the event removes the quiz
    #[serde(
        rename = "eventId",
        alias = "event_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_id: Option<String>,
}

impl Quiz {
    pub fn option(&self, letter: QuizLetter) -> &str {
        self.options
            .get(letter.index())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Admin input for publishing a quiz
#[derive(Debug, Clone, Default)]
pub struct QuizDraft {
    pub question: String,
    pub options: [String; 4],
    pub correct: String,
    pub event_id: Option<String>,
}

impl QuizDraft {
    /// All four options and the question must be non-blank, `correct` must be A-D.
    pub fn validate(&self) -> DomainResult<QuizLetter> {
        let blank = self.question.trim().is_empty()
            || self.options.iter().any(|o| o.trim().is_empty());
        match QuizLetter::parse(&self.correct) {
            Some(letter) if !blank => Ok(letter),
            _ => Err(DomainError::validation(
                "question, four options and the correct answer (A/B/C/D) are required",
            )),
        }
    }
}

/// A member's answer to a quiz; written once, never changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub letter: QuizLetter,
    #[serde(default)]
    pub correct: bool,
    #[serde(default, deserialize_with = "lenient::int")]
    pub at: i64,
}

/// "CARD::QUIZID" -> answer
pub type QuizAnswers = BTreeMap<String, QuizAnswer>;

pub fn answer_key(card: &CardId, quiz_id: &str) -> String {
    format!("{}::{}", card, quiz_id)
}
