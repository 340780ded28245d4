//! Domain error types
//!
//! Raised by the pure document operations before any state is touched, so a
//! rejected operation always leaves the document exactly as it was.

use thiserror::Error;

/// Domain-level rejection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Malformed or incomplete input (400)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Event id unknown to this document (404)
    #[error("Event not found: {0}")]
    EventNotFound(String),

    /// No active quiz with this id (404)
    #[error("Quiz not found: {0}")]
    QuizNotFound(String),

    /// Member already holds a booking for the event (409)
    #[error("Already booked: {card} for {event_id}")]
    AlreadyBooked { card: String, event_id: String },

    /// Capacity exhausted (409)
    #[error("Sold out: {0}")]
    SoldOut(String),

    /// Cancellation without a booking (409)
    #[error("No booking for {card} on {event_id}")]
    NotBooked { card: String, event_id: String },

    /// Second answer for the same (card, quiz) pair (409)
    #[error("Already answered: {card} on {quiz_id}")]
    AlreadyAnswered { card: String, quiz_id: String },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Capacity / uniqueness conflict rather than bad input or a missing target.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyBooked { .. }
                | Self::SoldOut(_)
                | Self::NotBooked { .. }
                | Self::AlreadyAnswered { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EventNotFound(_) | Self::QuizNotFound(_))
    }

    /// Stable wire code carried in rejection envelopes
    ///
    /// | Code | Meaning |
    /// |------|---------|
    /// | E0002 | validation |
    /// | E1001 / E1002 | unknown event / quiz |
    /// | E1101..E1104 | booking and answer conflicts |
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E0002",
            Self::EventNotFound(_) => "E1001",
            Self::QuizNotFound(_) => "E1002",
            Self::AlreadyBooked { .. } => "E1101",
            Self::SoldOut(_) => "E1102",
            Self::NotBooked { .. } => "E1103",
            Self::AlreadyAnswered { .. } => "E1104",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
