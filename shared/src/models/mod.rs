//! Data models
//!
//! Entities of the shared club document. Field names on the wire follow the
//! deployed backend (`tessera`, `q`, `opts`, `ticketCfg`).

pub mod booking;
pub mod event;
pub mod member;
pub mod quiz;
pub mod ticket;

pub use booking::{Booking, BookingTable, EventBookings, seats_used};
pub use event::{DEFAULT_EVENT_TITLE, Event, NewEvent};
pub use member::{Member, merge_roster};
pub use quiz::{Quiz, QuizAnswer, QuizAnswers, QuizDraft, QuizLetter, answer_key};
pub use ticket::{DEFAULT_TICKET_LABEL, DEFAULT_TICKET_URL, TicketConfig};
