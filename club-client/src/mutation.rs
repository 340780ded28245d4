//! Mutation protocol
//!
//! Booking, cancellation and quiz answers touch shared capacity or the
//! write-once answer log, so they never ride the full-document push. Each one
//! is a two-phase commit with a known weak window:
//!
//! 1. apply locally (same rules the server runs) and adjust the ledger
//! 2. send the named mutation, carrying only identity and target
//! 3. re-pull; the server's adjudication supersedes the local guess
//!
//! Between 1 and 3 the cache may show a value the server will override.
//! Connectivity failures keep the local state and surface "will sync later".

use shared::document::MutationEffect;
use shared::error::DomainError;
use shared::identity::CardId;
use shared::models::QuizLetter;
use shared::request::{Mutation, MutationRequest};
use shared::util::now_millis;

use crate::client::ClubClient;
use crate::error::{ClientError, ClientResult};
use crate::sync::{SyncEngine, SyncNotice};

/// How a cooperative mutation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Server accepted; cache re-pulled
    Confirmed { effect: MutationEffect },
    /// Applied locally only; the next successful pull reconciles
    PendingSync { effect: MutationEffect },
    /// Refused by the local guard; nothing changed, nothing sent
    Refused(DomainError),
    /// Server refused; cache re-pulled
    Rejected { reason: String },
}

impl MutationOutcome {
    pub fn effect(&self) -> Option<&MutationEffect> {
        match self {
            Self::Confirmed { effect } | Self::PendingSync { effect } => Some(effect),
            Self::Refused(_) | Self::Rejected { .. } => None,
        }
    }
}

impl SyncEngine {
    /// Run one cooperative mutation through the two phases.
    pub async fn submit_mutation(
        &self,
        card: &CardId,
        mutation: Mutation,
    ) -> ClientResult<MutationOutcome> {
        let ctx = self.context();
        let now = now_millis();

        // Phase 1: optimistic local apply
        let local = ctx.with_cache(|cache| {
            let mut view = cache.local_view();
            match view.apply_mutation(card, &mutation, now) {
                Ok(effect) => cache.write_card_state(&view).map(|_| Ok(effect)),
                Err(refused) => Ok(Err(refused)),
            }
        })?;
        let effect = match local {
            Ok(effect) => effect,
            Err(refused) => {
                tracing::debug!(kind = mutation.name(), error = %refused, "Mutation refused locally");
                return Ok(MutationOutcome::Refused(refused));
            }
        };
        ctx.bump_revision();

        if !ctx.is_online() {
            ctx.notify(SyncNotice::WillSyncLater);
            return Ok(MutationOutcome::PendingSync { effect });
        }

        // Phase 2: named mutation
        let request = MutationRequest::new(card.clone(), mutation);
        match self.api().mutate(&request).await {
            Ok(_) => {
                // Phase 3: server state supersedes the optimistic one; a pull
                // sent before the ack cannot carry it
                self.refresh_started_after(self.pull_generation()).await;
                Ok(MutationOutcome::Confirmed { effect })
            }
            Err(e) if e.is_rejection() => {
                tracing::info!(kind = request.mutation.name(), error = %e, "Mutation rejected by server");
                self.refresh_started_after(self.pull_generation()).await;
                Ok(MutationOutcome::Rejected {
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                tracing::warn!(kind = request.mutation.name(), error = %e, "Mutation not delivered, kept locally");
                ctx.notify(SyncNotice::WillSyncLater);
                Ok(MutationOutcome::PendingSync { effect })
            }
        }
    }
}

impl ClubClient {
    /// Book one seat for the signed-in member
    pub async fn book_event(&self, event_id: &str) -> ClientResult<MutationOutcome> {
        let session = self.require_session()?;
        let mutation = Mutation::Book {
            event_id: event_id.to_string(),
            seats: 1,
        };
        self.engine().submit_mutation(&session.tessera, mutation).await
    }

    pub async fn cancel_booking(&self, event_id: &str) -> ClientResult<MutationOutcome> {
        let session = self.require_session()?;
        let mutation = Mutation::Cancel {
            event_id: event_id.to_string(),
        };
        self.engine().submit_mutation(&session.tessera, mutation).await
    }

    /// Answer the active quiz with a letter A-D
    pub async fn answer_quiz(&self, letter: &str) -> ClientResult<MutationOutcome> {
        let session = self.require_session()?;
        let letter = QuizLetter::parse(letter)
            .ok_or_else(|| ClientError::Validation("choose an answer between A and D".into()))?;
        let quiz_id = self
            .context()
            .with_cache(|cache| cache.shared_cache().quiz.map(|q| q.id));
        let Some(quiz_id) = quiz_id else {
            return Ok(MutationOutcome::Refused(DomainError::QuizNotFound(
                String::new(),
            )));
        };
        let mutation = Mutation::QuizAnswer { quiz_id, letter };
        self.engine().submit_mutation(&session.tessera, mutation).await
    }
}
