//! SyncEngine - pull/push routines shared by the worker and the facades

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use shared::document::SharedDocument;

use super::{AppSignal, PushOutcome, RefreshOutcome, SyncCommand, SyncNotice, SyncPhase};
use crate::context::ClubContext;
use crate::http::ClubApi;

type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Cheap to clone; all clones drive the same engine
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    ctx: Arc<ClubContext>,
    api: Arc<dyn ClubApi>,
    /// Refresh in flight and its generation; concurrent callers join it
    in_flight: Mutex<Option<(u64, PendingRefresh)>>,
    /// Generation of the most recently started pull
    pull_generation: AtomicU64,
    /// At most one full-document push at a time
    push_gate: tokio::sync::Mutex<()>,
    commands: mpsc::UnboundedSender<SyncCommand>,
}

/// Clears the pushing flag even if the push future is dropped
struct PushingGuard<'a>(&'a ClubContext);

impl<'a> PushingGuard<'a> {
    fn enter(ctx: &'a ClubContext) -> Self {
        ctx.set_pushing(true);
        Self(ctx)
    }
}

impl Drop for PushingGuard<'_> {
    fn drop(&mut self) {
        self.0.set_pushing(false);
    }
}

impl SyncEngine {
    pub(crate) fn new(
        ctx: Arc<ClubContext>,
        api: Arc<dyn ClubApi>,
        commands: mpsc::UnboundedSender<SyncCommand>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                ctx,
                api,
                in_flight: Mutex::new(None),
                pull_generation: AtomicU64::new(0),
                push_gate: tokio::sync::Mutex::new(()),
                commands,
            }),
        }
    }

    pub fn context(&self) -> &Arc<ClubContext> {
        &self.inner.ctx
    }

    pub(crate) fn api(&self) -> &Arc<dyn ClubApi> {
        &self.inner.api
    }

    // ========== Pull ==========

    /// Pull the canonical document; joins a refresh already in flight.
    ///
    /// Never fails: connectivity problems set the backend-down flag and are
    /// reported through the outcome and a notice.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.refresh_started_after(0).await
    }

    /// Generation of the latest pull started so far
    pub(crate) fn pull_generation(&self) -> u64 {
        self.inner.pull_generation.load(Ordering::SeqCst)
    }

    /// Refresh with a pull whose request left after generation `floor`.
    ///
    /// An older pull in flight may carry a document from before the caller's
    /// write; it is awaited and a new pull is issued instead of joining it.
    pub(crate) async fn refresh_started_after(&self, floor: u64) -> RefreshOutcome {
        loop {
            let (generation, pending) = {
                let mut slot = self.inner.in_flight.lock();
                match slot.as_ref() {
                    Some((generation, pending)) => {
                        tracing::debug!(generation, "Refresh already in flight");
                        (*generation, pending.clone())
                    }
                    None => {
                        let generation = self.inner.pull_generation.fetch_add(1, Ordering::SeqCst) + 1;
                        let inner = Arc::clone(&self.inner);
                        let pending = async move {
                            let outcome = inner.pull().await;
                            inner.in_flight.lock().take();
                            outcome
                        }
                        .boxed()
                        .shared();
                        *slot = Some((generation, pending.clone()));
                        (generation, pending)
                    }
                }
            };
            if generation > floor {
                return pending.await;
            }
            tracing::debug!(generation, floor, "Refresh in flight is stale, waiting to pull again");
            pending.await;
        }
    }

    // ========== Push ==========

    /// Push the whole local view now, waiting behind any push in flight.
    pub async fn push_app_data_now(&self) -> PushOutcome {
        let _gate = self.inner.push_gate.lock().await;
        self.inner.push().await
    }

    /// Restart the debounce window for a full-document push
    pub fn schedule_push(&self) {
        if self.inner.commands.send(SyncCommand::SchedulePush).is_err() {
            tracing::debug!("Sync worker not running, push stays pending");
        }
    }

    // ========== Signals ==========

    /// Record a host signal and let the worker react to it
    pub fn signal(&self, signal: AppSignal) {
        let ctx = &self.inner.ctx;
        match signal {
            AppSignal::Online => ctx.set_online(true),
            AppSignal::Offline => ctx.set_online(false),
            AppSignal::Foreground => ctx.set_foreground(true),
            AppSignal::Background => ctx.set_foreground(false),
            AppSignal::RefreshRequested => {}
        }
        if self.inner.commands.send(SyncCommand::Signal(signal)).is_err() {
            tracing::debug!(?signal, "Sync worker not running, signal recorded only");
        }
    }

    pub fn sync_phase(&self) -> SyncPhase {
        let ctx = &self.inner.ctx;
        let (down, dirty) = ctx.with_cache(|c| (c.is_backend_down(), c.is_dirty()));
        if down {
            SyncPhase::Down
        } else if ctx.is_pushing() {
            SyncPhase::Pushing
        } else if dirty {
            SyncPhase::Dirty
        } else {
            SyncPhase::Clean
        }
    }

    pub(crate) fn has_push_credential(&self) -> bool {
        self.inner.push_credential().is_some()
    }
}

impl EngineInner {
    async fn pull(&self) -> RefreshOutcome {
        if !self.ctx.is_online() {
            tracing::debug!("Offline, refresh skipped");
            return RefreshOutcome::Skipped;
        }

        match self.api.fetch_app_data().await {
            Ok(payload) => {
                let applied: crate::store::StorageResult<u64> = self.ctx.with_cache(|cache| {
                    cache.set_backend_down(false)?;
                    match &payload {
                        Some(doc) => {
                            cache.apply_server_document(doc)?;
                            Ok(doc.version)
                        }
                        None => Ok(cache.shared_cache().version),
                    }
                });
                match applied {
                    Ok(version) => {
                        tracing::debug!(version, "Shared document refreshed");
                        self.ctx.notify(SyncNotice::Refreshed { version });
                        RefreshOutcome::Refreshed { version }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to store pulled document");
                        RefreshOutcome::Failed(e.to_string())
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Refresh failed, keeping local cache");
                if let Err(e) = self.ctx.with_cache(|cache| cache.set_backend_down(true)) {
                    tracing::warn!(error = %e, "Failed to record backend down");
                }
                self.ctx.notify(SyncNotice::BackendDown);
                RefreshOutcome::Failed(e.to_string())
            }
        }
    }

    /// Cached PIN, or the default one while an admin session is active
    fn push_credential(&self) -> Option<String> {
        if let Some(pin) = self.ctx.with_cache(|cache| cache.admin_pin()) {
            return Some(pin);
        }
        let config = self.ctx.config();
        if config.credential_fallback && self.ctx.is_admin_session() {
            tracing::debug!("No cached admin credential, using default");
            return Some(config.admin_pin.clone());
        }
        None
    }

    async fn push(&self) -> PushOutcome {
        if !self.ctx.is_online() {
            tracing::debug!("Offline, push skipped");
            return PushOutcome::Skipped;
        }
        let Some(pin) = self.push_credential() else {
            tracing::debug!("No admin credential, push skipped");
            return PushOutcome::Skipped;
        };

        let (payload, revision) = self
            .ctx
            .with_cache(|cache| (cache.local_view(), self.ctx.revision()));

        let result = {
            let _pushing = PushingGuard::enter(&self.ctx);
            self.api.push_app_data(&pin, &payload).await
        };

        match result {
            Ok(reply) => {
                let edited_meanwhile = self.ctx.revision() != revision;
                let version = reply.as_ref().map_or(payload.version, |doc| doc.version);
                if let Err(e) = self.reconcile_push(reply, edited_meanwhile) {
                    tracing::error!(error = %e, "Failed to store push reply");
                }
                if edited_meanwhile {
                    tracing::debug!("Local edits during push, scheduling another");
                    let _ = self.commands.send(SyncCommand::SchedulePush);
                }
                tracing::info!(version, "Shared document pushed");
                self.ctx.notify(SyncNotice::PushedForEveryone { version });
                PushOutcome::Pushed { version }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Push failed, changes kept locally");
                self.ctx.notify(SyncNotice::SavedLocally);
                PushOutcome::Failed(e.to_string())
            }
        }
    }

    fn reconcile_push(
        &self,
        reply: Option<SharedDocument>,
        edited_meanwhile: bool,
    ) -> crate::store::StorageResult<()> {
        self.ctx.with_cache(|cache| match (reply, edited_meanwhile) {
            (Some(doc), false) => cache.apply_server_document(&doc),
            (Some(doc), true) => cache.carry_version(doc.version),
            (None, false) => cache.set_dirty(false),
            (None, true) => Ok(()),
        })
    }
}
