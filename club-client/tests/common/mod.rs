//! In-memory club service for client tests
//!
//! Runs the same document operations as the real server, so optimistic local
//! state and server adjudication can be compared directly.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use club_client::{ClientConfig, ClientError, ClientResult, ClubApi, ClubClient, LocalStore};
use shared::document::SharedDocument;
use shared::error::DomainError;
use shared::identity::CardId;
use shared::models::Member;
use shared::request::MutationRequest;

pub const PIN: &str = "190894";

pub struct FakeApi {
    doc: Mutex<SharedDocument>,
    pub fetches: AtomicUsize,
    pub pushes: AtomicUsize,
    pub mutations: AtomicUsize,
    unreachable: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
}

impl FakeApi {
    pub fn new(doc: SharedDocument) -> Arc<Self> {
        Arc::new(Self {
            doc: Mutex::new(doc),
            fetches: AtomicUsize::new(0),
            pushes: AtomicUsize::new(0),
            mutations: AtomicUsize::new(0),
            unreachable: AtomicBool::new(false),
            fetch_delay: Mutex::new(None),
        })
    }

    /// Server document with the test roster
    pub fn with_roster() -> Arc<Self> {
        let mut doc = SharedDocument::default();
        doc.members = roster();
        Self::new(doc)
    }

    pub fn document(&self) -> SharedDocument {
        self.doc.lock().clone()
    }

    pub fn edit(&self, f: impl FnOnce(&mut SharedDocument)) {
        let mut doc = self.doc.lock();
        f(&mut doc);
        doc.version += 1;
    }

    pub fn set_unreachable(&self, down: bool) {
        self.unreachable.store(down, Ordering::SeqCst);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> ClientResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ClientError::Internal("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ClubApi for FakeApi {
    async fn fetch_app_data(&self) -> ClientResult<Option<SharedDocument>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        // The reply reflects the document as it was when the request arrived
        let snapshot = self.document();
        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_reachable()?;
        Ok(Some(snapshot))
    }

    async fn push_app_data(
        &self,
        pin: &str,
        payload: &SharedDocument,
    ) -> ClientResult<Option<SharedDocument>> {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        if pin != PIN {
            return Err(ClientError::Unauthorized);
        }
        let mut doc = self.doc.lock();
        let version = doc.version + 1;
        *doc = payload.clone();
        doc.version = version;
        Ok(Some(doc.clone()))
    }

    async fn mutate(&self, request: &MutationRequest) -> ClientResult<Option<SharedDocument>> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        let mut doc = self.doc.lock();
        match doc.apply_mutation(&request.tessera, &request.mutation, 1) {
            Ok(_) => {
                doc.version += 1;
                Ok(Some(doc.clone()))
            }
            Err(e @ DomainError::Validation(_)) => Err(ClientError::Validation(e.to_string())),
            Err(e) if e.is_not_found() => Err(ClientError::NotFound(e.to_string())),
            Err(e) => Err(ClientError::Conflict(e.to_string())),
        }
    }
}

pub fn roster() -> Vec<Member> {
    vec![
        Member::new(CardId::new("S1"), "Anna Rossi"),
        Member::new(CardId::new("S2"), "Marco Bianchi"),
        Member::new(CardId::new("S3"), "Luca Verdi"),
    ]
}

pub fn config() -> ClientConfig {
    ClientConfig::new("http://club.test")
}

/// Bootstrapped client on an in-memory store
pub fn client(api: &Arc<FakeApi>) -> ClubClient {
    let client = bare_client(api, config());
    client.bootstrap(&roster()).unwrap();
    client
}

/// Client without first-run seeding (no cached admin credential)
pub fn bare_client(api: &Arc<FakeApi>, config: ClientConfig) -> ClubClient {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("club_client=debug")
        .with_test_writer()
        .try_init();
    let store = LocalStore::open_in_memory().unwrap();
    let api: Arc<dyn ClubApi> = api.clone();
    ClubClient::new(config, store, api)
}

/// Signed-in member with a fresh pull
pub async fn member(api: &Arc<FakeApi>, card: &str) -> ClubClient {
    let client = client(api);
    client.refresh().await;
    client.login(card).unwrap();
    client
}
