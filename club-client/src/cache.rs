//! Typed cache over the durable store
//!
//! The shared document is kept split the way devices have always stored it:
//! bulletin, events and quiz live in one "shared cache" entry, everything
//! else (roster, ledger, bookings, answers, ticket link, rules text) under its
//! own key. [`ClubCache::local_view`] reassembles the full document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared::document::SharedDocument;
use shared::ledger::{PointsLedger, default_points_rules_text};
use shared::lenient;
use shared::models::{BookingTable, Event, Member, Quiz, QuizAnswers, TicketConfig};
use shared::schema::read_document;

use crate::session::Session;
use crate::store::{LocalStore, StorageResult, StoreBatch, StoreKey};

/// Bulletin, events and quiz as cached from the last pull
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedCache {
    #[serde(default = "initial_version", deserialize_with = "lenient::version")]
    pub version: u64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub updated_at: i64,
    #[serde(default, deserialize_with = "lenient::string")]
    pub bulletin: String,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub events: Vec<Event>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub quiz: Option<Quiz>,
}

fn initial_version() -> u64 {
    1
}

impl Default for SharedCache {
    fn default() -> Self {
        Self {
            version: initial_version(),
            updated_at: 0,
            bulletin: String::new(),
            events: Vec::new(),
            quiz: None,
        }
    }
}

/// Cached admin credential
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredAdmin {
    #[serde(default, deserialize_with = "lenient::string")]
    pub pin: String,
}

/// Typed accessors over [`LocalStore`]
#[derive(Debug, Clone)]
pub struct ClubCache {
    store: LocalStore,
}

impl ClubCache {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    // ========== Reads ==========

    pub fn shared_cache(&self) -> SharedCache {
        self.store.load(StoreKey::SharedCache)
    }

    pub fn members(&self) -> Vec<Member> {
        match self.store.load_opt::<Value>(StoreKey::Members) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<Member>(item).ok())
                .filter(|m| !m.card_id.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn points(&self) -> PointsLedger {
        self.store.load(StoreKey::Points)
    }

    pub fn bookings(&self) -> BookingTable {
        self.store.load(StoreKey::Bookings)
    }

    pub fn quiz_answers(&self) -> QuizAnswers {
        self.store.load(StoreKey::QuizAnswers)
    }

    pub fn ticket_cfg(&self) -> TicketConfig {
        self.store.load(StoreKey::TicketCfg)
    }

    /// Rules text; older installs stored it as a list of lines
    pub fn points_rules_text(&self) -> String {
        match self.store.load_opt::<Value>(StoreKey::PointsRules) {
            Some(Value::String(text)) => text,
            Some(Value::Array(lines)) => lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
            _ => default_points_rules_text(),
        }
    }

    pub fn admin_pin(&self) -> Option<String> {
        self.store
            .load_opt::<StoredAdmin>(StoreKey::Admin)
            .map(|a| a.pin)
            .filter(|pin| !pin.is_empty())
    }

    pub fn session(&self) -> Option<Session> {
        self.store
            .load_opt::<Session>(StoreKey::Session)
            .filter(|s| !s.tessera.is_empty())
    }

    pub fn is_dirty(&self) -> bool {
        self.store.flag(StoreKey::SharedDirty)
    }

    pub fn is_backend_down(&self) -> bool {
        self.store.flag(StoreKey::BackendDown)
    }

    /// Full shared document as currently known on this device
    pub fn local_view(&self) -> SharedDocument {
        let shared = self.shared_cache();
        SharedDocument {
            version: shared.version,
            updated_at: shared.updated_at,
            bulletin: shared.bulletin,
            events: shared.events,
            quiz: shared.quiz,
            members: self.members(),
            points_rules_text: self.points_rules_text(),
            ticket_cfg: self.ticket_cfg(),
            points: self.points(),
            bookings: self.bookings(),
            quiz_answers: self.quiz_answers(),
        }
    }

    // ========== Writes ==========

    pub fn set_session(&self, session: &Session) -> StorageResult<()> {
        self.store.save(StoreKey::Session, session)
    }

    pub fn clear_session(&self) -> StorageResult<()> {
        self.store.remove(StoreKey::Session)
    }

    pub fn set_admin_pin(&self, pin: &str) -> StorageResult<()> {
        self.store.save(
            StoreKey::Admin,
            &StoredAdmin {
                pin: pin.to_string(),
            },
        )
    }

    pub fn set_dirty(&self, dirty: bool) -> StorageResult<()> {
        self.store.set_flag(StoreKey::SharedDirty, dirty)
    }

    pub fn set_backend_down(&self, down: bool) -> StorageResult<()> {
        self.store.set_flag(StoreKey::BackendDown, down)
    }

    /// Overwrite every cached field with the server's copy (server wins).
    pub fn apply_server_document(&self, doc: &SharedDocument) -> StorageResult<()> {
        let mut batch = StoreBatch::new();
        stage_document(&mut batch, doc)?;
        batch.set_flag(StoreKey::SharedDirty, false)?;
        self.store.save_many(batch)
    }

    /// Persist a locally edited document and mark it for push
    pub fn write_local_edit(&self, doc: &SharedDocument) -> StorageResult<()> {
        let mut batch = StoreBatch::new();
        stage_document(&mut batch, doc)?;
        batch.set_flag(StoreKey::SharedDirty, true)?;
        self.store.save_many(batch)
    }

    /// Card-linked state only, as touched by member mutations
    pub fn write_card_state(&self, doc: &SharedDocument) -> StorageResult<()> {
        let mut batch = StoreBatch::new();
        stage_card_state(&mut batch, doc)?;
        self.store.save_many(batch)
    }

    /// Adopt the server version without touching local edits
    pub fn carry_version(&self, version: u64) -> StorageResult<()> {
        let mut shared = self.shared_cache();
        shared.version = version;
        self.store.save(StoreKey::SharedCache, &shared)
    }

    // ========== First run ==========

    /// Seed missing entries and fold legacy layouts into the current one.
    pub fn bootstrap_defaults(
        &self,
        seed_roster: &[Member],
        admin_pin: &str,
        now: i64,
    ) -> StorageResult<()> {
        if !self.store.contains(StoreKey::Members) {
            self.store.save(StoreKey::Members, seed_roster)?;
        }
        if !self.store.contains(StoreKey::Points) {
            self.store.save(StoreKey::Points, &PointsLedger::new())?;
        }
        if !self.store.contains(StoreKey::Bookings) {
            self.store.save(StoreKey::Bookings, &BookingTable::new())?;
        }
        if !self.store.contains(StoreKey::QuizAnswers) {
            self.store.save(StoreKey::QuizAnswers, &QuizAnswers::new())?;
        }
        if !self.store.contains(StoreKey::TicketCfg) {
            self.store.save(StoreKey::TicketCfg, &TicketConfig::default())?;
        }
        if !self.store.contains(StoreKey::Admin) {
            self.set_admin_pin(admin_pin)?;
        }
        if !self.store.contains(StoreKey::PointsRules) {
            self.store
                .save(StoreKey::PointsRules, &default_points_rules_text())?;
        }
        self.migrate_legacy(now)?;
        Ok(())
    }

    /// Upgrade data left by older app versions; returns whether anything moved.
    pub fn migrate_legacy(&self, now: i64) -> StorageResult<bool> {
        const LEGACY: [StoreKey; 4] = [
            StoreKey::LegacyEvent,
            StoreKey::LegacyBookings,
            StoreKey::LegacyEvents,
            StoreKey::LegacyQuiz,
        ];
        if !LEGACY.iter().any(|key| self.store.contains(*key)) {
            return Ok(false);
        }

        let mut value = serde_json::to_value(self.local_view())?;
        if let Value::Object(map) = &mut value {
            let events_empty = map
                .get("events")
                .and_then(Value::as_array)
                .is_none_or(|events| events.is_empty());
            if events_empty {
                if let Some(events) = self.store.load_opt::<Value>(StoreKey::LegacyEvents) {
                    map.insert("events".into(), events);
                }
                if let Some(event) = self.store.load_opt::<Value>(StoreKey::LegacyEvent) {
                    map.insert("event".into(), event);
                }
            }

            let bookings_empty = map
                .get("bookings")
                .and_then(Value::as_object)
                .is_none_or(|bookings| bookings.is_empty());
            if bookings_empty
                && let Some(bookings) = self.store.load_opt::<Value>(StoreKey::LegacyBookings)
            {
                map.insert("bookings".into(), bookings);
            }

            if map.get("quiz").is_none_or(Value::is_null)
                && let Some(quiz) = self.store.load_opt::<Value>(StoreKey::LegacyQuiz)
            {
                map.insert("quiz".into(), quiz);
            }
        }

        let doc = read_document(value, now);
        self.write_local_edit(&doc)?;
        for key in LEGACY {
            self.store.remove(key)?;
        }
        tracing::info!(
            events = doc.events.len(),
            "Migrated legacy local data"
        );
        Ok(true)
    }
}

fn stage_document(batch: &mut StoreBatch, doc: &SharedDocument) -> StorageResult<()> {
    let shared = SharedCache {
        version: doc.version,
        updated_at: doc.updated_at,
        bulletin: doc.bulletin.clone(),
        events: doc.events.clone(),
        quiz: doc.quiz.clone(),
    };
    batch.save(StoreKey::SharedCache, &shared)?;
    batch.save(StoreKey::Members, &doc.members)?;
    batch.save(StoreKey::PointsRules, &doc.points_rules_text)?;
    batch.save(StoreKey::TicketCfg, &doc.ticket_cfg)?;
    stage_card_state(batch, doc)
}

fn stage_card_state(batch: &mut StoreBatch, doc: &SharedDocument) -> StorageResult<()> {
    batch.save(StoreKey::Points, &doc.points)?;
    batch.save(StoreKey::Bookings, &doc.bookings)?;
    batch.save(StoreKey::QuizAnswers, &doc.quiz_answers)
}
