//! Shared types for the club companion
//!
//! The document model, its pure operations and the wire types used by both
//! the client sync core and the reference server.

pub mod document;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod lenient;
pub mod models;
pub mod request;
pub mod response;
pub mod schema;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use document::{MutationEffect, SharedDocument};
pub use error::{DomainError, DomainResult};
pub use identity::{CardId, normalize_card, normalize_name};
pub use ledger::PointsLedger;
pub use request::{APP_DATA_PATH, MUTATE_PATH, Mutation, MutationRequest, PushRequest};
pub use response::AppDataEnvelope;
