//! Versioned document reader
//!
//! Older app versions stored the document in two legacy shapes. Instead of
//! checking for them at every read, a raw JSON value is classified once into
//! a [`DocumentShape`] and upgraded to the current [`SharedDocument`].
//!
//! | Shape | Events | Bookings |
//! |-------|--------|----------|
//! | V1 | single `event` object | `{card: {eventId, seats, at}}` |
//! | V2 | `events` list | `{card: {eventId, seats, at}}` |
//! | Current | `events` list | `{eventId: {card: {seats, at}}}` |

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::document::SharedDocument;
use crate::identity::CardId;
use crate::lenient;
use crate::models::{Booking, BookingTable, Event};
use crate::util::now_millis;

/// Card-keyed booking of the old single-booking-per-member layout
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyBooking {
    #[serde(rename = "eventId", default, deserialize_with = "lenient::string")]
    pub event_id: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub seats: u32,
    #[serde(default, deserialize_with = "lenient::int")]
    pub at: i64,
}

pub type LegacyBookings = BTreeMap<CardId, LegacyBooking>;

/// A stored document classified by layout
#[derive(Debug, Clone)]
pub enum DocumentShape {
    V1 {
        event: Option<Event>,
        bookings: LegacyBookings,
        base: SharedDocument,
    },
    V2 {
        bookings: LegacyBookings,
        base: SharedDocument,
    },
    Current(SharedDocument),
}

impl DocumentShape {
    /// Classify a raw value. Non-objects are treated as an empty current document.
    pub fn detect(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::Current(SharedDocument::default());
        };

        let legacy_bookings = map
            .get("bookings")
            .is_some_and(is_card_keyed_bookings)
            .then(|| map.remove("bookings"))
            .flatten()
            .map(lenient_legacy_bookings)
            .unwrap_or_default();

        let has_events = map
            .get("events")
            .and_then(Value::as_array)
            .is_some_and(|events| !events.is_empty());
        let single_event = if has_events {
            None
        } else {
            map.remove("event").filter(Value::is_object)
        };

        let base = SharedDocument::from_value(Value::Object(map));
        match single_event {
            Some(event) => Self::V1 {
                event: serde_json::from_value(event).ok(),
                bookings: legacy_bookings,
                base,
            },
            None if !legacy_bookings.is_empty() => Self::V2 {
                bookings: legacy_bookings,
                base,
            },
            None => Self::Current(base),
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, Self::Current(_))
    }

    /// Upgrade to the current layout. `now` stamps records missing a timestamp.
    pub fn into_current(self, now: i64) -> SharedDocument {
        match self {
            Self::Current(doc) => doc,
            Self::V2 { bookings, mut base } => {
                if base.bookings.is_empty() {
                    base.bookings = upgrade_bookings(bookings, now);
                }
                base
            }
            Self::V1 {
                event,
                bookings,
                mut base,
            } => {
                if base.events.is_empty()
                    && let Some(mut event) = event.filter(|e| !e.id.is_empty())
                {
                    if event.created_at == 0 {
                        event.created_at = now;
                    }
                    base.events.push(event);
                }
                if base.bookings.is_empty() {
                    base.bookings = upgrade_bookings(bookings, now);
                }
                base
            }
        }
    }
}

/// Classify and upgrade in one step
pub fn read_document(value: Value, now: i64) -> SharedDocument {
    let shape = DocumentShape::detect(value);
    if !shape.is_current() {
        tracing::info!("Upgrading legacy document layout");
    }
    shape.into_current(now)
}

/// serde adapter: any document layout, hardened and upgraded
pub fn deserialize_document<'de, D>(deserializer: D) -> Result<SharedDocument, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(read_document(value, now_millis()))
}

/// serde adapter for an optional payload; `null` stays `None`
pub fn deserialize_document_opt<'de, D>(
    deserializer: D,
) -> Result<Option<SharedDocument>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(_) => Some(read_document(value, now_millis())),
        _ => None,
    })
}

/// Upgrade card-keyed bookings to event-keyed ones; entries without an event are dropped.
pub fn upgrade_bookings(legacy: LegacyBookings, now: i64) -> BookingTable {
    let mut table = BookingTable::new();
    for (card, booking) in legacy {
        if booking.event_id.is_empty() || card.is_empty() {
            continue;
        }
        table.entry(booking.event_id).or_default().insert(
            card,
            Booking {
                seats: booking.seats.max(1),
                at: if booking.at == 0 { now } else { booking.at },
            },
        );
    }
    table
}

fn lenient_legacy_bookings(value: Value) -> LegacyBookings {
    let Value::Object(map) = value else {
        return LegacyBookings::new();
    };
    map.into_iter()
        .filter_map(|(card, b)| {
            let booking: LegacyBooking = serde_json::from_value(b).ok()?;
            Some((CardId::new(&card), booking))
        })
        .collect()
}

/// Legacy bookings have `eventId` inside each entry; current ones nest cards.
fn is_card_keyed_bookings(value: &Value) -> bool {
    value.as_object().is_some_and(|map| {
        !map.is_empty()
            && map
                .values()
                .all(|entry| entry.as_object().is_some_and(|e| e.contains_key("eventId")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_current_shape_passes_through() {
        let value = json!({
            "version": 4,
            "events": [{"id": "EV-1", "title": "Derby", "capacity": 2}],
            "bookings": {"EV-1": {"S1": {"seats": 1, "at": 5}}}
        });
        let shape = DocumentShape::detect(value);
        assert!(shape.is_current());
        let doc = shape.into_current(99);
        assert_eq!(doc.version, 4);
        assert_eq!(doc.seats_used("EV-1"), 1);
    }

    #[test]
    fn test_v1_single_event_upgrade() {
        let value = json!({
            "event": {"id": "EV-7", "title": "Finale", "capacity": 10},
            "bookings": {" s1 ": {"eventId": "EV-7", "seats": 1, "at": 3}, "s2": {"eventId": "EV-7"}}
        });
        let shape = DocumentShape::detect(value);
        assert!(matches!(shape, DocumentShape::V1 { .. }));

        let doc = shape.into_current(1000);
        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.events[0].created_at, 1000);
        let bookings = &doc.bookings["EV-7"];
        assert_eq!(bookings[&CardId::new("S1")].at, 3);
        assert_eq!(bookings[&CardId::new("S2")].seats, 1);
        assert_eq!(bookings[&CardId::new("S2")].at, 1000);
    }

    #[test]
    fn test_v2_card_keyed_bookings_upgrade() {
        let value = json!({
            "events": [{"id": "EV-1"}, {"id": "EV-2"}],
            "bookings": {"S1": {"eventId": "EV-1", "seats": 1, "at": 1}, "S2": {"eventId": "EV-2", "seats": 1, "at": 2}}
        });
        let shape = DocumentShape::detect(value);
        assert!(matches!(shape, DocumentShape::V2 { .. }));
        let doc = shape.into_current(0);
        assert_eq!(doc.seats_used("EV-1"), 1);
        assert_eq!(doc.seats_used("EV-2"), 1);
    }

    #[test]
    fn test_event_list_wins_over_legacy_single_event() {
        let value = json!({
            "event": {"id": "EV-OLD"},
            "events": [{"id": "EV-NEW"}]
        });
        let doc = read_document(value, 0);
        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.events[0].id, "EV-NEW");
    }

    #[test]
    fn test_empty_bookings_are_current() {
        let doc = read_document(json!({"bookings": {}}), 0);
        assert!(doc.bookings.is_empty());
    }

    #[test]
    fn test_non_object_reads_as_empty_document() {
        assert_eq!(read_document(json!("broken"), 0), SharedDocument::default());
    }
}
