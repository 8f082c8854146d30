use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::errors::{AppError, AppResult};

/// Durable last-write-wins storage of whole JSON values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> AppResult<()>;
    async fn remove(&self, key: &str) -> AppResult<()>;
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let values = self.values.read().await;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> AppResult<()> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut values = self.values.write().await;
        values.remove(key);
        Ok(())
    }
}

/// Keeps every key in one JSON object on disk, rewritten on each change.
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if !contents.trim().is_empty() => {
                match serde_json::from_str::<Value>(&contents)? {
                    Value::Object(map) => map,
                    _ => {
                        return Err(AppError::StorageError(format!(
                            "{} does not contain a JSON object",
                            path.display()
                        )))
                    }
                }
            }
            Ok(_) => Map::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };

        log::info!("Opened store at {} ({} keys)", path.display(), values.len());
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    async fn flush(&self, values: &Map<String, Value>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        let contents = serde_json::to_vec_pretty(values)?;
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let values = self.values.read().await;
        Ok(values.get(key).cloned())
    }

    // Memory only changes once the file write succeeded.
    async fn set(&self, key: &str, value: Value) -> AppResult<()> {
        let mut values = self.values.write().await;
        let mut next = values.clone();
        next.insert(key.to_string(), value);
        self.flush(&next).await?;
        *values = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut values = self.values.write().await;
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.flush(&next).await?;
        *values = next;
        Ok(())
    }
}
