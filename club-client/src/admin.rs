//! Admin console
//!
//! Shared edits apply to the local view first and schedule a debounced
//! full-document push. Only event deletion pushes right away, so a deleted
//! event cannot reappear from a stale server copy.

use chrono::Utc;

use shared::document::SharedDocument;
use shared::error::{DomainError, DomainResult};
use shared::identity::{CardId, normalize_name};
use shared::models::{Event, NewEvent, Quiz, QuizDraft, TicketConfig};
use shared::util::now_millis;

use crate::client::ClubClient;
use crate::error::{ClientError, ClientResult};
use crate::export::ExportSnapshot;
use crate::roster::{self, ImportMode};
use crate::sync::PushOutcome;

/// Where an event deletion ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDeletion {
    /// Pushed and re-pulled
    Shared,
    /// Kept locally; a push is scheduled
    SavedLocally,
}

/// Admin operations, available while the admin session is active
pub struct AdminConsole<'a> {
    client: &'a ClubClient,
}

impl ClubClient {
    /// Unlock the admin console for this browsing session.
    pub fn admin_login(&self, pin: &str) -> ClientResult<AdminConsole<'_>> {
        let ctx = self.context();
        let pin = pin.trim();
        if pin != ctx.config().admin_pin {
            tracing::warn!("Admin login rejected");
            return Err(ClientError::Unauthorized);
        }
        ctx.with_cache(|cache| cache.set_admin_pin(pin))?;
        ctx.set_admin_session(true);
        tracing::info!("Admin session started");
        Ok(AdminConsole { client: self })
    }

    pub fn admin_logout(&self) {
        self.context().set_admin_session(false);
    }

    /// Console for an admin session already unlocked
    pub fn admin(&self) -> ClientResult<AdminConsole<'_>> {
        if !self.context().is_admin_session() {
            return Err(ClientError::Unauthorized);
        }
        Ok(AdminConsole { client: self })
    }
}

impl AdminConsole<'_> {
    // ========== Edit plumbing ==========

    /// Apply `f` to the local view, persist it as dirty; nothing is written on error.
    fn apply<R>(&self, f: impl FnOnce(&mut SharedDocument) -> DomainResult<R>) -> ClientResult<R> {
        let ctx = self.client.context();
        let now = now_millis();
        let out = ctx.with_cache(|cache| {
            let mut doc = cache.local_view();
            let out = f(&mut doc)?;
            doc.touch(now);
            cache.write_local_edit(&doc)?;
            Ok::<_, ClientError>(out)
        })?;
        ctx.bump_revision();
        Ok(out)
    }

    /// [`apply`](Self::apply) plus a debounced push
    fn edit<R>(&self, f: impl FnOnce(&mut SharedDocument) -> DomainResult<R>) -> ClientResult<R> {
        let out = self.apply(f)?;
        self.client.engine().schedule_push();
        Ok(out)
    }

    // ========== Content ==========

    pub fn set_bulletin(&self, text: &str) -> ClientResult<()> {
        self.edit(|doc| {
            doc.bulletin = text.to_string();
            Ok(())
        })
    }

    /// Ticket button; blank fields fall back to the defaults
    pub fn save_settings(&self, label: &str, url: &str) -> ClientResult<TicketConfig> {
        self.edit(|doc| {
            doc.ticket_cfg = TicketConfig::new(label, url);
            Ok(doc.ticket_cfg.clone())
        })
    }

    pub fn save_points_rules(&self, text: &str) -> ClientResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::validation("points rules cannot be empty").into());
        }
        self.edit(|doc| {
            doc.points_rules_text = text.to_string();
            Ok(())
        })
    }

    // ========== Events ==========

    pub fn create_event(&self, input: NewEvent) -> ClientResult<Event> {
        let now = now_millis();
        let event = self.edit(|doc| Ok(doc.create_event(input, now)))?;
        tracing::info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    /// Delete with its bookings and bound quiz; pushes immediately when online.
    pub async fn delete_event(&self, event_id: &str) -> ClientResult<EventDeletion> {
        self.apply(|doc| {
            if doc.delete_event(event_id) {
                Ok(())
            } else {
                Err(DomainError::EventNotFound(event_id.to_string()))
            }
        })?;

        let engine = self.client.engine();
        if self.client.context().is_online() {
            match engine.push_app_data_now().await {
                PushOutcome::Pushed { .. } => {
                    engine.refresh().await;
                    tracing::info!(event_id, "Event deleted for everyone");
                    return Ok(EventDeletion::Shared);
                }
                outcome => {
                    tracing::debug!(?outcome, "Immediate push did not go through");
                }
            }
        }
        engine.schedule_push();
        Ok(EventDeletion::SavedLocally)
    }

    // ========== Quiz ==========

    pub fn publish_quiz(&self, draft: &QuizDraft) -> ClientResult<Quiz> {
        let now = now_millis();
        self.edit(|doc| doc.publish_quiz(draft, now))
    }

    pub fn clear_quiz(&self) -> ClientResult<Option<Quiz>> {
        self.edit(|doc| Ok(doc.clear_quiz()))
    }

    // ========== Roster ==========

    pub fn upsert_member(&self, card: &str, name: &str) -> ClientResult<()> {
        let card = parse_card(card)?;
        self.edit(|doc| doc.upsert_member(&card, name))
    }

    /// Add from the form: card, first and last name all required
    pub fn add_member(&self, card: &str, first: &str, last: &str) -> ClientResult<()> {
        let card = parse_card(card)?;
        let (first, last) = (normalize_name(first), normalize_name(last));
        if first.is_empty() || last.is_empty() {
            return Err(DomainError::validation("first and last name are required").into());
        }
        self.edit(|doc| doc.upsert_member(&card, &format!("{} {}", first, last)))
    }

    pub fn remove_member(&self, card: &str) -> ClientResult<bool> {
        let card = parse_card(card)?;
        self.edit(|doc| Ok(doc.remove_member(&card)))
    }

    /// Replace the roster with the editor text; returns the member count
    pub fn save_allowed_list(&self, text: &str) -> ClientResult<usize> {
        let members = roster::parse_allowed_list(text);
        self.edit(|doc| {
            doc.members = members;
            Ok(doc.members.len())
        })
    }

    /// Current roster in editor format
    pub fn allowed_list_text(&self) -> String {
        let members = self.client.context().with_cache(|cache| cache.members());
        roster::format_allowed_list(&members)
    }

    /// Import a spreadsheet export; returns how many members were imported
    pub fn import_csv(&self, text: &str, mode: ImportMode) -> ClientResult<usize> {
        let imported = roster::parse_members_csv(text)?;
        let count = imported.len();
        self.edit(|doc| {
            mode.apply(&mut doc.members, imported);
            Ok(())
        })?;
        tracing::info!(count, ?mode, "Members imported");
        Ok(count)
    }

    pub fn import_csv_bytes(&self, bytes: &[u8], mode: ImportMode) -> ClientResult<usize> {
        self.import_csv(&roster::decode_csv_bytes(bytes), mode)
    }

    // ========== Points ==========

    /// Manual adjustment (±1 / ±10 buttons); returns the clamped balance
    pub fn adjust_points(&self, card: &str, delta: i64) -> ClientResult<i64> {
        let card = parse_card(card)?;
        self.edit(|doc| Ok(doc.points.add(&card, delta)))
    }

    /// Zero every balance; needs all three confirmations and the PIN again.
    pub fn reset_all_points(&self, confirmations: [bool; 3], pin: &str) -> ClientResult<()> {
        if !confirmations.iter().all(|confirmed| *confirmed) {
            return Err(ClientError::Validation("points reset not confirmed".into()));
        }
        if pin.trim() != self.client.context().config().admin_pin {
            tracing::warn!("Points reset rejected: wrong PIN");
            return Err(ClientError::Unauthorized);
        }
        self.edit(|doc| {
            doc.points.reset();
            Ok(())
        })?;
        tracing::warn!("All points reset");
        Ok(())
    }

    // ========== Export ==========

    pub fn export(&self) -> ExportSnapshot {
        ExportSnapshot::from_document(&self.client.local_view(), Utc::now())
    }
}

fn parse_card(raw: &str) -> ClientResult<CardId> {
    CardId::parse(raw).ok_or_else(|| ClientError::Validation("card number is required".into()))
}
