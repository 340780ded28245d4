//! Client context
//!
//! One explicit object owning the durable cache, the connectivity and
//! visibility flags, the browsing-session admin flag and the notice channel.
//! Built once at startup and shared by the sync engine and every facade.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;

use crate::cache::ClubCache;
use crate::config::ClientConfig;
use crate::store::LocalStore;
use crate::sync::SyncNotice;

const NOTICE_CAPACITY: usize = 64;

pub struct ClubContext {
    config: ClientConfig,
    cache: Mutex<ClubCache>,
    online: AtomicBool,
    foreground: AtomicBool,
    /// 仅在本次会话有效，从不落盘
    admin_session: AtomicBool,
    pushing: AtomicBool,
    /// Bumped on every local write to the cached document
    revision: AtomicU64,
    notices: broadcast::Sender<SyncNotice>,
}

impl std::fmt::Debug for ClubContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClubContext")
            .field("online", &self.is_online())
            .field("foreground", &self.is_foreground())
            .field("admin_session", &self.is_admin_session())
            .finish_non_exhaustive()
    }
}

impl ClubContext {
    pub fn new(config: ClientConfig, store: LocalStore) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            config,
            cache: Mutex::new(ClubCache::new(store)),
            online: AtomicBool::new(true),
            foreground: AtomicBool::new(true),
            admin_session: AtomicBool::new(false),
            pushing: AtomicBool::new(false),
            revision: AtomicU64::new(0),
            notices,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run `f` with exclusive access to the cache. Never held across an await.
    pub fn with_cache<R>(&self, f: impl FnOnce(&ClubCache) -> R) -> R {
        let cache = self.cache.lock();
        f(&cache)
    }

    // ========== Flags ==========

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground.load(Ordering::SeqCst)
    }

    pub fn set_foreground(&self, foreground: bool) {
        self.foreground.store(foreground, Ordering::SeqCst);
    }

    pub fn is_admin_session(&self) -> bool {
        self.admin_session.load(Ordering::SeqCst)
    }

    pub fn set_admin_session(&self, on: bool) {
        self.admin_session.store(on, Ordering::SeqCst);
    }

    pub fn is_pushing(&self) -> bool {
        self.pushing.load(Ordering::SeqCst)
    }

    pub(crate) fn set_pushing(&self, pushing: bool) {
        self.pushing.store(pushing, Ordering::SeqCst);
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub(crate) fn bump_revision(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::SeqCst) + 1
    }

    // ========== Notices ==========

    /// Non-blocking; having no subscriber is fine
    pub fn notify(&self, notice: SyncNotice) {
        tracing::trace!(?notice, "Sync notice");
        let _ = self.notices.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
        self.notices.subscribe()
    }
}
