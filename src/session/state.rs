use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::errors::BotResult;
use crate::logger::{self, LogTag};

/// Durable key-value store for small runtime facts (last scan time, halt
/// flags). Persisted as a single JSON object with a `last_updated` stamp.
pub struct SystemState {
    path: PathBuf,
    data: Mutex<HashMap<String, Value>>,
}

impl SystemState {
    /// Open the store, loading existing contents when the file exists
    pub fn open(path: PathBuf) -> BotResult<Self> {
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.data.lock().await.get(key).cloned()
    }

    pub async fn get_str(&self, key: &str) -> Option<String> {
        self.get(key)
            .await
            .and_then(|v| v.as_str().map(|s| s.to_string()))
    }

    /// Set a key and persist the whole store
    pub async fn set(&self, key: &str, value: Value) -> BotResult<()> {
        let mut data = self.data.lock().await;
        data.insert(key.to_string(), value);
        data.insert("last_updated".to_string(), json!(Utc::now().to_rfc3339()));
        self.flush(&data)?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> BotResult<bool> {
        let mut data = self.data.lock().await;
        let removed = data.remove(key).is_some();
        if removed {
            data.insert("last_updated".to_string(), json!(Utc::now().to_rfc3339()));
            self.flush(&data)?;
        }
        Ok(removed)
    }

    fn flush(&self, data: &HashMap<String, Value>) -> BotResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, content)?;
        logger::debug(LogTag::State, &format!("State flushed to {}", self.path.display()));
        Ok(())
    }
}
