//! Credential and profile store
//!
//! A small namespaced key-value store. Reads are best-effort: a missing,
//! unreadable or corrupt backing file behaves as an empty store.

use crate::error::{AgentError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const API_KEY: &str = "apiKey";
pub const USER_PROFILE: &str = "userProfile";
pub const SIGNED_IN: &str = "signedIn";

/// Namespace used when none is given
pub const DEFAULT_NAMESPACE: &str = "page-pilot";

const STORE_FILE: &str = "store.json";

pub trait KeyValueStore: Send + Sync {
    /// Value under `key`, or `None` when absent or unreadable
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// The stored API key, if it is a non-empty string
    fn api_key(&self) -> Option<String> {
        self.get(API_KEY)
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|k| !k.is_empty())
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries
            .lock()
            .map_err(|e| AgentError::Store(e.to_string()))?
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|e| AgentError::Store(e.to_string()))?
            .remove(key);
        Ok(())
    }
}

/// Store persisted as one JSON file: `{ "<namespace>": { "<key>": value } }`
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    namespace: String,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<config dir>/page-pilot/store.json` under the default namespace
    pub fn open_default() -> Result<Self> {
        let mut path = dirs::config_dir().ok_or_else(|| AgentError::Store("Failed to get config directory".to_string()))?;
        path.push(DEFAULT_NAMESPACE);
        path.push(STORE_FILE);
        Ok(Self::new(path, DEFAULT_NAMESPACE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Map<String, Value> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => return Map::new(),
        };

        match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                log::warn!("Ignoring unreadable store at {}", self.path.display());
                Map::new()
            }
        }
    }

    fn write_all(&self, all: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AgentError::Store(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let text = serde_json::to_string_pretty(all).map_err(|e| AgentError::Store(e.to_string()))?;
        fs::write(&self.path, text)
            .map_err(|e| AgentError::Store(format!("Failed to write {}: {}", self.path.display(), e)))
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let _guard = self.lock.lock().map_err(|e| AgentError::Store(e.to_string()))?;
        let mut all = self.read_all();
        let entry = all
            .entry(self.namespace.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(namespace) = entry {
            f(namespace);
        }
        self.write_all(&all)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.read_all().get(&self.namespace)?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.update(|namespace| {
            namespace.insert(key.to_string(), value);
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|namespace| {
            namespace.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get(API_KEY), None);

        store.set(API_KEY, json!("secret")).unwrap();
        store.set(SIGNED_IN, json!(true)).unwrap();
        assert_eq!(store.api_key().as_deref(), Some("secret"));
        assert_eq!(store.get(SIGNED_IN), Some(json!(true)));

        store.remove(API_KEY).unwrap();
        assert_eq!(store.api_key(), None);
    }

    #[test]
    fn test_empty_api_key_is_absent() {
        let store = MemoryStore::new();
        store.set(API_KEY, json!("")).unwrap();
        assert_eq!(store.api_key(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonFileStore::new(&path, "page-pilot");
        store.set(API_KEY, json!("k1")).unwrap();
        store.set(USER_PROFILE, json!({"name": "Ada"})).unwrap();

        let reopened = JsonFileStore::new(&path, "page-pilot");
        assert_eq!(reopened.api_key().as_deref(), Some("k1"));
        assert_eq!(reopened.get(USER_PROFILE), Some(json!({"name": "Ada"})));

        let other = JsonFileStore::new(&path, "other");
        assert_eq!(other.get(API_KEY), None);
    }

    #[test]
    fn test_file_store_corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(&path, "page-pilot");
        assert_eq!(store.get(API_KEY), None);

        store.set(SIGNED_IN, json!(false)).unwrap();
        assert_eq!(store.get(SIGNED_IN), Some(json!(false)));
    }

    #[test]
    fn test_file_store_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("store.json"), "page-pilot");
        store.set(API_KEY, json!("k")).unwrap();
        store.remove(API_KEY).unwrap();
        assert_eq!(store.get(API_KEY), None);
    }
}
