//! On-disk form of the store: one JSON object mapping collection keys to
//! their serialized values.

use crate::errors::StoreError;
use serde_json::Value;
use std::{collections::BTreeMap, path::Path};
use tokio::fs;
use tracing::error;

pub type Namespace = BTreeMap<String, Value>;

/// Reads the namespace file. Never fails: a missing file is an empty
/// namespace, and an unreadable one is logged and treated the same way.
pub async fn load_namespace(path: &Path) -> Namespace {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(namespace) => namespace,
            Err(err) => {
                error!(path = %path.display(), "failed to parse store file: {err}");
                Namespace::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Namespace::default(),
        Err(err) => {
            error!(path = %path.display(), "failed to read store file: {err}");
            Namespace::default()
        }
    }
}

pub async fn persist_namespace(path: &Path, namespace: &Namespace) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(namespace)?;
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, payload).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}
