use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SCHEMA_VERSION: u32 = 1;

/// Byte-oriented persistence used by the config store and the usage tracker.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    values: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.values.lock().insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    schema_version: u32,
    values: BTreeMap<String, String>,
}

/// Single JSON document under `root`, values base64-encoded. The lock
/// serializes read-modify-write cycles within the process.
#[derive(Debug)]
pub struct FileKvStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FileKvStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.root.join("store.json")
    }

    fn load_values(&self) -> Result<BTreeMap<String, String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let doc: StoreFile = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if doc.schema_version > SCHEMA_VERSION {
            bail!(
                "store schema version {} is newer than supported {SCHEMA_VERSION}",
                doc.schema_version
            );
        }
        Ok(doc.values)
    }

    fn save_values(&self, values: BTreeMap<String, String>) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;

        let doc = StoreFile {
            schema_version: SCHEMA_VERSION,
            values,
        };
        let text = serde_json::to_string_pretty(&doc).context("failed to serialize store")?;
        let path = self.path();
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), "kv store persisted");
        Ok(())
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock.lock();
        let values = self.load_values()?;
        values
            .get(key)
            .map(|encoded| {
                BASE64
                    .decode(encoded)
                    .with_context(|| format!("value for `{key}` is not valid base64"))
            })
            .transpose()
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let _guard = self.lock.lock();
        let mut values = self.load_values()?;
        values.insert(key.to_owned(), BASE64.encode(value));
        self.save_values(values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut values = self.load_values()?;
        if values.remove(key).is_some() {
            self.save_values(values)?;
        }
        Ok(())
    }
}

pub fn default_store_dir_from(base_dir: &Path) -> PathBuf {
    base_dir.join("data")
}
