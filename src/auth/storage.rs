use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Device-local persistent key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> io::Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> io::Result<()>;
    /// Removing a key that is not present succeeds.
    async fn remove(&self, key: &str) -> io::Result<()>;
}

/// Key-value pairs kept as a JSON object in a single file.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "storage.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store in `storage.json` under the data directory.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> io::Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => serde_json::from_str(&json)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e),
        }
    }

    /// Like `read_all`, but an unreadable file is logged and treated as empty
    /// so the next write replaces it.
    async fn read_all_or_discard(&self) -> io::Result<BTreeMap<String, String>> {
        match self.read_all().await {
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(
                    "Discarding unreadable storage file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // Write then rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all_or_discard().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> io::Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_all_or_discard().await?;
        let removed = entries.remove(key).is_some();
        if entries.is_empty() {
            return match tokio::fs::remove_file(&self.path).await {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            };
        }
        if removed {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned lock still holds consistent string pairs.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> io::Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_round_trips_values() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(tmp.path());

        assert_eq!(store.get("@SafeClass:token").await.unwrap(), None);
        store.set("@SafeClass:token", "abc").await.unwrap();
        assert_eq!(
            store.get("@SafeClass:token").await.unwrap().as_deref(),
            Some("abc")
        );

        // A fresh handle on the same file sees the value.
        let reopened = FileStore::in_dir(tmp.path());
        assert_eq!(
            reopened.get("@SafeClass:token").await.unwrap().as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn file_store_keeps_other_keys_on_remove() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(tmp.path());
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();

        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn file_store_deletes_file_when_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(tmp.path());
        store.set("only", "x").await.unwrap();
        assert!(store.path().exists());

        store.remove("only").await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn remove_on_missing_file_succeeds() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(tmp.path());
        store.remove("nothing").await.unwrap();
        store.remove("nothing").await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_reported_on_read() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(tmp.path());
        std::fs::write(store.path(), "not json").unwrap();

        let err = store.get("k").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn set_replaces_corrupt_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(tmp.path());
        std::fs::write(store.path(), "{garbage").unwrap();

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn memory_store_round_trips_values() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
