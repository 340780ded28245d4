//! ClubClient - entry point for the rendering consumer

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use shared::document::SharedDocument;
use shared::models::Member;
use shared::util::now_millis;

use crate::context::ClubContext;
use crate::error::ClientResult;
use crate::http::{ClubApi, HttpClubApi};
use crate::store::LocalStore;
use crate::sync::{
    AppSignal, PushOutcome, RefreshOutcome, SyncCommand, SyncEngine, SyncNotice, SyncPhase,
    SyncWorker,
};
use crate::ClientConfig;

/// Offline-first club client
///
/// ```ignore
/// let store = LocalStore::open("club.redb")?;
/// let client = ClubClient::connect(ClientConfig::new("https://club.example.org"), store)?;
/// client.bootstrap(&[])?;
/// let worker = client.start(shutdown.clone());
/// client.login("s 123")?;
/// client.book_event("EV-1").await?;
/// ```
pub struct ClubClient {
    ctx: Arc<ClubContext>,
    engine: SyncEngine,
    commands: Mutex<Option<mpsc::UnboundedReceiver<SyncCommand>>>,
}

impl ClubClient {
    pub fn new(config: ClientConfig, store: LocalStore, api: Arc<dyn ClubApi>) -> Self {
        let ctx = Arc::new(ClubContext::new(config, store));
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = SyncEngine::new(Arc::clone(&ctx), api, tx);
        Self {
            ctx,
            engine,
            commands: Mutex::new(Some(rx)),
        }
    }

    /// Client talking HTTP to the configured server
    pub fn connect(config: ClientConfig, store: LocalStore) -> ClientResult<Self> {
        let api = HttpClubApi::new(&config)?;
        Ok(Self::new(config, store, Arc::new(api)))
    }

    /// First-run seeding and legacy migration
    pub fn bootstrap(&self, seed_roster: &[Member]) -> ClientResult<()> {
        let pin = self.ctx.config().admin_pin.clone();
        self.ctx
            .with_cache(|cache| cache.bootstrap_defaults(seed_roster, &pin, now_millis()))?;
        Ok(())
    }

    /// Background worker; `None` once it has been taken
    pub fn worker(&self, shutdown: CancellationToken) -> Option<SyncWorker> {
        let commands = self.commands.lock().take()?;
        Some(SyncWorker::new(self.engine.clone(), commands, shutdown))
    }

    /// Spawn the background worker on the current runtime
    pub fn start(&self, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
        let worker = self.worker(shutdown)?;
        Some(tokio::spawn(worker.run()))
    }

    pub fn context(&self) -> &Arc<ClubContext> {
        &self.ctx
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    // ========== Sync ==========

    pub async fn refresh(&self) -> RefreshOutcome {
        self.engine.refresh().await
    }

    pub async fn push_now(&self) -> PushOutcome {
        self.engine.push_app_data_now().await
    }

    pub fn signal(&self, signal: AppSignal) {
        self.engine.signal(signal);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
        self.ctx.subscribe()
    }

    pub fn sync_phase(&self) -> SyncPhase {
        self.engine.sync_phase()
    }

    /// Document as currently cached on this device
    pub fn local_view(&self) -> SharedDocument {
        self.ctx.with_cache(|cache| cache.local_view())
    }
}
