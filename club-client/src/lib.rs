//! Club client
//!
//! Offline-first sync core of the club companion app:
//!
//! - [`store`] / [`cache`] - device-local durable state (redb)
//! - [`sync`] - pull, debounced push, refresh coalescing, background worker
//! - [`mutation`] - booking, cancellation and quiz answers (optimistic, then re-pull)
//! - [`admin`] - PIN-gated shared edits, roster import, export
//! - [`view`] - projection for the rendering consumer

pub mod admin;
pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod http;
pub mod mutation;
pub mod roster;
pub mod session;
pub mod store;
pub mod sync;
pub mod view;

// Re-exports
pub use admin::{AdminConsole, EventDeletion};
pub use client::ClubClient;
pub use config::{ClientConfig, DEFAULT_ADMIN_PIN};
pub use context::ClubContext;
pub use error::{ClientError, ClientResult};
pub use export::{EXPORT_FILE_NAME, ExportSnapshot};
pub use http::{ClubApi, HttpClubApi};
pub use mutation::MutationOutcome;
pub use roster::ImportMode;
pub use session::Session;
pub use store::{LocalStore, StorageError, StorageResult, StoreBatch, StoreKey};
pub use sync::{AppSignal, PushOutcome, RefreshOutcome, SyncEngine, SyncNotice, SyncPhase, SyncWorker};
pub use view::{EventCard, HomeView, QuizCard, QuizState};
