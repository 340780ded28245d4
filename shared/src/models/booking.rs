//! Booking Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::identity::CardId;
use crate::lenient;

/// A member's seat reservation for one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(default = "one_seat", deserialize_with = "lenient::count")]
    pub seats: u32,
    #[serde(default, deserialize_with = "lenient::int")]
    pub at: i64,
}

fn one_seat() -> u32 {
    1
}

impl Booking {
    pub fn single(at: i64) -> Self {
        Self { seats: 1, at }
    }
}

/// Bookings of one event, keyed by card
pub type EventBookings = BTreeMap<CardId, Booking>;

/// All bookings: event id -> card -> booking
pub type BookingTable = BTreeMap<String, EventBookings>;

/// Seats taken across an event's bookings
pub fn seats_used(bookings: &EventBookings) -> u32 {
    bookings.values().map(|b| b.seats).sum()
}
