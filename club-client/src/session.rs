//! Member session

use serde::{Deserialize, Serialize};

use shared::identity::CardId;
use shared::lenient;

use crate::client::ClubClient;
use crate::error::{ClientError, ClientResult};

/// Signed-in member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub tessera: CardId,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
}

impl ClubClient {
    /// Sign in with a card number from the roster
    pub fn login(&self, raw_card: &str) -> ClientResult<Session> {
        let card = CardId::parse(raw_card)
            .ok_or_else(|| ClientError::Validation("card number is required".into()))?;

        let session = self.context().with_cache(|cache| {
            let member = cache
                .members()
                .into_iter()
                .find(|m| m.card_id == card)
                .ok_or_else(|| ClientError::Forbidden(format!("card {} is not enabled", card)))?;
            let session = Session {
                tessera: card.clone(),
                name: member.display_name(),
            };
            cache.set_session(&session)?;
            Ok::<_, ClientError>(session)
        })?;

        tracing::info!(card = %session.tessera, "Member signed in");
        Ok(session)
    }

    pub fn logout(&self) -> ClientResult<()> {
        self.context().with_cache(|cache| cache.clear_session())?;
        Ok(())
    }

    pub fn current_session(&self) -> Option<Session> {
        self.context().with_cache(|cache| cache.session())
    }

    pub(crate) fn require_session(&self) -> ClientResult<Session> {
        self.current_session().ok_or(ClientError::NotSignedIn)
    }
}
