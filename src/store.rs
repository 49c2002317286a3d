//! Named collection store.
//!
//! Every persisted entity lives as a JSON array (or a single JSON record)
//! under a fixed key. Reads fail soft and writes replace the whole value.
//! `get` followed by `set` is last-writer-wins: two callers interleaving
//! that cycle lose one of the updates without noticing. [`CollectionStore::update`]
//! serializes read-modify-write per key and is what the record modules use.

use crate::errors::StoreError;
use crate::storage::{load_namespace, persist_namespace, Namespace};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Collection keys. Any other client of the same data file must use these.
pub mod keys {
    pub const REGISTERED_USERS: &str = "registeredUsers";
    pub const CURRENT_USER: &str = "currentUser";
    pub const EXPENSES: &str = "expenses";
    pub const BUDGETS: &str = "budgets";
    pub const CATEGORIES: &str = "categories";
    pub const LOGIN_TIMESTAMPS: &str = "loginTimestamps";
    /// Profile display name, a bare string. Not tied to any account.
    pub const DISPLAY_NAME: &str = "username";
}

#[derive(Clone)]
pub struct CollectionStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    namespace: Mutex<Namespace>,
    writers: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CollectionStore {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let namespace = load_namespace(&path).await;
        debug!(path = %path.display(), keys = namespace.len(), "opened store");
        Self {
            inner: Arc::new(Inner {
                path,
                namespace: Mutex::new(namespace),
                writers: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.namespace.lock().await.contains_key(key)
    }

    /// Returns the collection stored under `key`, or an empty one when the
    /// key is absent or its value does not parse.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.read_value(key).await {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => match serde_json::from_value(value) {
                Ok(records) => records,
                Err(err) => {
                    error!(key, "failed to parse collection: {err}");
                    Vec::new()
                }
            },
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, records: &[T]) -> Result<(), StoreError> {
        let value = serde_json::to_value(records).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.write_value(key, Some(value)).await
    }

    pub async fn get_item<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.read_value(key).await?;
        match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(err) => {
                error!(key, "failed to parse item: {err}");
                None
            }
        }
    }

    pub async fn set_item<T: Serialize>(&self, key: &str, item: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(item).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.write_value(key, Some(value)).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.write_value(key, None).await
    }

    /// Read-modify-write of one collection, serialized against other
    /// `update` calls on the same key. The collection is written back only
    /// when `apply` returns `Ok`. Unlike `get`, a stored value that does not
    /// parse is an error here, so it is never overwritten.
    pub async fn update<T, R, E, F>(&self, key: &str, apply: F) -> Result<R, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StoreError>,
        F: FnOnce(&mut Vec<T>) -> Result<R, E>,
    {
        self.update_or_else(key, Vec::new, apply).await
    }

    /// Like [`update`](Self::update), but an absent key starts from
    /// `seed()` instead of an empty collection.
    pub async fn update_or_else<T, R, E, S, F>(&self, key: &str, seed: S, apply: F) -> Result<R, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StoreError>,
        S: FnOnce() -> Vec<T>,
        F: FnOnce(&mut Vec<T>) -> Result<R, E>,
    {
        let writer = self.writer(key).await;
        let _guard = writer.lock().await;

        let mut records = match self.read_value(key).await {
            None => seed(),
            Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value).map_err(|source| {
                error!(key, "refusing to rewrite unreadable collection: {source}");
                StoreError::Parse {
                    key: key.to_string(),
                    source,
                }
            })?,
        };
        let result = apply(&mut records)?;
        self.set(key, &records).await?;
        Ok(result)
    }

    async fn writer(&self, key: &str) -> Arc<Mutex<()>> {
        let mut writers = self.inner.writers.lock().await;
        Arc::clone(writers.entry(key.to_string()).or_default())
    }

    async fn read_value(&self, key: &str) -> Option<Value> {
        self.inner.namespace.lock().await.get(key).cloned()
    }

    /// Applies the change and persists the whole namespace. On a failed
    /// write the in-memory value is put back so it keeps matching the file.
    async fn write_value(&self, key: &str, value: Option<Value>) -> Result<(), StoreError> {
        let mut namespace = self.inner.namespace.lock().await;
        let previous = match value {
            Some(value) => namespace.insert(key.to_string(), value),
            None => namespace.remove(key),
        };

        if let Err(err) = persist_namespace(&self.inner.path, &namespace).await {
            error!(key, "failed to persist store: {err}");
            match previous {
                Some(previous) => namespace.insert(key.to_string(), previous),
                None => namespace.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}

/// Collections are stored oldest-first and shown newest-first.
pub fn newest_first<T>(mut stored: Vec<T>) -> Vec<T> {
    stored.reverse();
    stored
}

/// Inverse of [`newest_first`]; apply before writing a displayed list back.
pub fn oldest_first<T>(mut displayed: Vec<T>) -> Vec<T> {
    displayed.reverse();
    displayed
}

#[cfg(test)]
pub(crate) async fn temp_store() -> (tempfile::TempDir, CollectionStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = CollectionStore::open(dir.path().join("store.json")).await;
    (dir, store)
}
