//! Session storage keyed by name
//!
//! The persisted layout is two keys: [`TOKENS_KEY`] holds a JSON encoded
//! [`TokenPair`] and [`USERNAME_KEY`] holds a plain string. A missing key and
//! an empty value are treated the same way.

use crate::error::Result;
use crate::types::TokenPair;
use papaya::HashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

pub const TOKENS_KEY: &str = "tokens";
pub const USERNAME_KEY: &str = "username";

/// Synchronous key-value storage for session state
pub trait TokenStore: Send + Sync + 'static {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Option<String>;

    /// Overwrite the raw value stored under `key`
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Current token pair, empty when absent or unreadable
    fn tokens(&self) -> TokenPair {
        let Some(raw) = self.get(TOKENS_KEY) else {
            return TokenPair::default();
        };
        if raw.is_empty() {
            return TokenPair::default();
        }
        match serde_json::from_str(&raw) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Stored tokens are not valid JSON, treating as logged out");
                TokenPair::default()
            }
        }
    }

    fn set_tokens(&self, tokens: &TokenPair) -> Result<()> {
        self.set(TOKENS_KEY, serde_json::to_string(tokens)?)
    }

    fn username(&self) -> String {
        self.get(USERNAME_KEY).unwrap_or_default()
    }

    fn set_username(&self, username: &str) -> Result<()> {
        self.set(USERNAME_KEY, username.to_string())
    }
}

/// Thread-safe in-memory store using Papaya HashMap
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a token pair
    pub fn with_tokens(tokens: &TokenPair) -> Result<Self> {
        let store = Self::new();
        store.set_tokens(tokens)?;
        Ok(store)
    }

    /// Check if a key has been written
    pub fn contains(&self, key: &str) -> bool {
        self.entries.pin().contains_key(key)
    }

    pub fn remove(&self, key: &str) {
        self.entries.pin().remove(key);
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.pin().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.pin().insert(key.to_string(), value);
        Ok(())
    }
}

/// Store persisted as a JSON object on disk
///
/// Reads are served from memory; every write rewrites the whole file.
#[derive(Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    cache: MemoryTokenStore,
}

impl FileTokenStore {
    /// Open the store at `path`, loading existing entries if the file exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let cache = MemoryTokenStore::new();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            if !content.trim().is_empty() {
                let entries: BTreeMap<String, String> = serde_json::from_str(&content)?;
                let pinned = cache.entries.pin();
                for (key, value) in entries {
                    pinned.insert(key, value);
                }
            }
        }

        Ok(Self { path, cache })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file written first and then renamed over `path`
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "session".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    /// Write the current entries plus `key = value` to disk
    fn flush_with(&self, key: &str, value: &str) -> Result<()> {
        let mut snapshot: BTreeMap<String, String> = self
            .cache
            .entries
            .pin()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        snapshot.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, serde_json::to_string_pretty(&snapshot)?)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key)
    }

    /// The cache only changes once the file has been replaced
    fn set(&self, key: &str, value: String) -> Result<()> {
        self.flush_with(key, &value)?;
        self.cache.set(key, value)
    }
}
