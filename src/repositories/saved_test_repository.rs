use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    constants::storage_keys::SAVED_TESTS,
    errors::{AppError, AppResult},
    models::domain::SavedTestRecord,
    repositories::kv_store::KeyValueStore,
};

#[async_trait]
pub trait SavedTestRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<SavedTestRecord>>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<SavedTestRecord>>;
    async fn insert(&self, record: SavedTestRecord) -> AppResult<SavedTestRecord>;
    async fn update(&self, record: SavedTestRecord) -> AppResult<SavedTestRecord>;
    async fn delete(&self, id: &str) -> AppResult<()>;
}

/// History kept as one array under a single store key.
pub struct KvSavedTestRepository {
    store: Arc<dyn KeyValueStore>,
    // Serialises read-modify-write of the array
    write_lock: Mutex<()>,
}

impl KvSavedTestRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> AppResult<Vec<SavedTestRecord>> {
        match self.store.get(SAVED_TESTS).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    async fn persist(&self, records: &[SavedTestRecord]) -> AppResult<()> {
        self.store
            .set(SAVED_TESTS, serde_json::to_value(records)?)
            .await
    }
}

#[async_trait]
impl SavedTestRepository for KvSavedTestRepository {
    async fn list(&self) -> AppResult<Vec<SavedTestRecord>> {
        self.load().await
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<SavedTestRecord>> {
        Ok(self.load().await?.into_iter().find(|r| r.id == id))
    }

    async fn insert(&self, record: SavedTestRecord) -> AppResult<SavedTestRecord> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(AppError::Conflict(format!(
                "Saved test with id '{}' already exists",
                record.id
            )));
        }
        records.push(record.clone());
        self.persist(&records).await?;
        Ok(record)
    }

    async fn update(&self, record: SavedTestRecord) -> AppResult<SavedTestRecord> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| AppError::NotFound(format!("Saved test with id '{}' not found", record.id)))?;
        *slot = record.clone();
        self.persist(&records).await?;
        Ok(record)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(AppError::NotFound(format!("Saved test with id '{}' not found", id)));
        }
        self.persist(&records).await
    }
}
