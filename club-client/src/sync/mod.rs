//! Sync engine
//!
//! Pull, push and debounce between the device cache and the canonical
//! document.
//!
//! ```text
//!          edit            debounce elapsed        server reply
//!  Clean ───────▶ Dirty ─────────────────▶ Pushing ──────────▶ Clean
//!    ▲                                         │ failure
//!    │ pull ok                                 ▼
//!   Down ◀─────── pull failed              Dirty (kept for retry)
//! ```
//!
//! The backend-down flag only follows pull outcomes; push failures are
//! treated as transient.

mod engine;
mod worker;

pub use engine::SyncEngine;
pub use worker::SyncWorker;

/// Per-document sync state as surfaced to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Clean,
    Dirty,
    Pushing,
    Down,
}

/// Host-environment signals feeding the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppSignal {
    Online,
    Offline,
    Foreground,
    Background,
    RefreshRequested,
}

/// Non-blocking status notices for the rendering consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    /// Pull succeeded
    Refreshed { version: u64 },
    /// Pull failed; local cache kept
    BackendDown,
    /// Full-document push accepted
    PushedForEveryone { version: u64 },
    /// Push failed; changes kept locally for retry
    SavedLocally,
    /// Mutation applied locally only
    WillSyncLater,
}

/// Result of a pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { version: u64 },
    /// Offline, nothing sent
    Skipped,
    Failed(String),
}

/// Result of a full-document push
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed { version: u64 },
    /// Offline or no admin credential
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SyncCommand {
    SchedulePush,
    Signal(AppSignal),
}
