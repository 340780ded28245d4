use std::sync::Arc;
use tokio::sync::RwLock;

use shared::document::SharedDocument;
use shared::ledger::default_points_rules_text;
use shared::request::MutationRequest;
use shared::util::now_millis;

use crate::core::Config;
use crate::core::store::{DocumentStore, StoreResult};
use crate::utils::{AppError, AppResult};

/// 服务器状态
///
/// 持有唯一的共享文档 (内存副本 + redb 持久化)。所有写入都在写锁内完成：
/// 先在副本上修改并落盘，成功后才替换内存中的文档，失败时内存保持不变。
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    document: Arc<RwLock<SharedDocument>>,
    store: DocumentStore,
}

impl ServerState {
    /// 打开工作目录下的数据库并加载文档
    pub fn initialize(config: &Config) -> StoreResult<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let store = DocumentStore::open(config.database_path())?;
        Self::with_store(config.clone(), store)
    }

    pub fn with_store(config: Config, store: DocumentStore) -> StoreResult<Self> {
        let document = match store.load()? {
            Some(doc) => doc,
            None => {
                tracing::info!("No stored document, starting from an empty one");
                let doc = SharedDocument {
                    points_rules_text: default_points_rules_text(),
                    updated_at: now_millis(),
                    ..SharedDocument::default()
                };
                store.save(&doc)?;
                doc
            }
        };
        tracing::info!(version = document.version, "Shared document loaded");
        Ok(Self {
            config,
            document: Arc::new(RwLock::new(document)),
            store,
        })
    }

    pub async fn snapshot(&self) -> SharedDocument {
        self.document.read().await.clone()
    }

    pub async fn version(&self) -> u64 {
        self.document.read().await.version
    }

    /// Full-document replace (last writer wins)
    pub async fn replace(&self, payload: SharedDocument) -> AppResult<SharedDocument> {
        self.commit(|current| {
            let mut next = payload;
            next.version = current.version + 1;
            Ok(next)
        })
        .await
    }

    /// Adjudicate one member mutation against the current document
    pub async fn apply_mutation(&self, request: &MutationRequest) -> AppResult<SharedDocument> {
        let now = now_millis();
        self.commit(|current| {
            let mut next = current.clone();
            next.apply_mutation(&request.tessera, &request.mutation, now)?;
            next.version = current.version + 1;
            Ok(next)
        })
        .await
    }

    async fn commit(
        &self,
        f: impl FnOnce(&SharedDocument) -> AppResult<SharedDocument>,
    ) -> AppResult<SharedDocument> {
        let mut guard = self.document.write().await;
        let mut next = f(&guard)?;
        next.touch(now_millis());
        self.store
            .save(&next)
            .map_err(|e| AppError::Database(e.to_string()))?;
        *guard = next.clone();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::identity::CardId;
    use shared::models::NewEvent;
    use shared::request::Mutation;

    fn state() -> ServerState {
        let store = DocumentStore::open_in_memory().unwrap();
        ServerState::with_store(Config::with_overrides("./unused", 0), store).unwrap()
    }

    #[tokio::test]
    async fn test_fresh_document_has_default_rules() {
        let state = state();
        let doc = state.snapshot().await;
        assert_eq!(doc.version, 1);
        assert_eq!(doc.points_rules_text, default_points_rules_text());
    }

    #[tokio::test]
    async fn test_replace_bumps_version_over_payload() {
        let state = state();
        let mut payload = SharedDocument::default();
        payload.version = 99;
        payload.bulletin = "ciao".into();

        let stored = state.replace(payload).await.unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.bulletin, "ciao");
        assert!(stored.updated_at > 0);
    }

    #[tokio::test]
    async fn test_rejected_mutation_leaves_document_untouched() {
        let state = state();
        let mut doc = state.snapshot().await;
        let event = doc.create_event(
            NewEvent {
                title: "Trasferta".into(),
                date: "2026-12-01".into(),
                capacity: 1,
                note: String::new(),
            },
            1,
        );
        state.replace(doc).await.unwrap();

        let book = |card: &str| {
            MutationRequest::new(
                CardId::new(card),
                Mutation::Book {
                    event_id: event.id.clone(),
                    seats: 1,
                },
            )
        };
        state.apply_mutation(&book("A1")).await.unwrap();
        let before = state.snapshot().await;

        let err = state.apply_mutation(&book("B1")).await.unwrap_err();
        assert!(matches!(err, AppError::Rejected(_)));
        assert_eq!(state.snapshot().await, before);
    }
}
