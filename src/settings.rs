//! Persistent device settings
//!
//! Namespaced key/value persistence behind the [`KvStore`] seam, plus a
//! typed facade for the values the device actually stores: WiFi credentials
//! under `wifi` and the remote poll URL under `http`.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Namespaced key/value persistence
pub trait KvStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>>;
    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()>;
}

type Map = HashMap<String, HashMap<String, String>>;

/// JSON-file-backed store
///
/// The whole store is one JSON object of namespace -> key -> value, written
/// atomically via a temp-file rename.
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Map>,
}

impl FileStore {
    /// Open the store at `path`, creating it lazily on first write
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("settings file {} is not valid JSON", path.display()))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no settings file yet, starting empty");
                Map::default()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read settings file {}", path.display()))
            }
        };
        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    fn persist(&self, map: &Map) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let cache = self.cache.lock().unwrap();
        Ok(cache.get(namespace).and_then(|ns| ns.get(key)).cloned())
    }

    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        let mut cache = self.cache.lock().unwrap();
        cache
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self.persist(&cache)
    }
}

/// In-memory store for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<Map>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let map = self.map.lock().unwrap();
        Ok(map.get(namespace).and_then(|ns| ns.get(key)).cloned())
    }

    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        let mut map = self.map.lock().unwrap();
        map.entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

const WIFI_NS: &str = "wifi";
const KEY_SSID: &str = "ssid";
const KEY_PASSWORD: &str = "password";
const HTTP_NS: &str = "http";
const KEY_URL: &str = "url";

/// Typed facade over the raw store
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn KvStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn read(&self, namespace: &str, key: &str) -> Option<String> {
        match self.store.get(namespace, key) {
            Ok(value) => value,
            Err(e) => {
                warn!(namespace, key, error = %e, "settings read failed");
                None
            }
        }
    }

    pub fn ssid(&self) -> Option<String> {
        self.read(WIFI_NS, KEY_SSID)
    }

    pub fn set_ssid(&self, value: &str) -> Result<()> {
        self.store.set(WIFI_NS, KEY_SSID, value)
    }

    pub fn password(&self) -> Option<String> {
        self.read(WIFI_NS, KEY_PASSWORD)
    }

    pub fn set_password(&self, value: &str) -> Result<()> {
        self.store.set(WIFI_NS, KEY_PASSWORD, value)
    }

    pub fn url(&self) -> Option<String> {
        self.read(HTTP_NS, KEY_URL)
    }

    pub fn set_url(&self, value: &str) -> Result<()> {
        self.store.set(HTTP_NS, KEY_URL, value)
    }
}
