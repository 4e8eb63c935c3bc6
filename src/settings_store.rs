use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use crate::{Error, Result};

/// A scoped key-value store for string preferences, such as the visitor id.
///
/// Writes are staged with [`SettingsStore::put`] and become durable after
/// [`SettingsStore::commit`] returns `Ok(())`. Implementations report failures as
/// [`Error::Persistence`].
pub trait SettingsStore: Send + Sync {
    /// Read a value. Returns `Ok(None)` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stage a value for the key.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Persist all staged values.
    fn commit(&self) -> Result<()>;
}

impl<T: SettingsStore + ?Sized> SettingsStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn commit(&self) -> Result<()> {
        (**self).commit()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> Error {
    Error::Persistence("settings lock poisoned".to_owned())
}

/// `InMemorySettingsStore` keeps settings for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemorySettingsStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(poisoned)?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        Ok(())
    }
}

/// `FileSettingsStore` persists settings as a JSON object in a single file.
///
/// Commits write a temporary sibling file first and then rename it over the target, so readers
/// either observe the previous contents or the new ones.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FileSettingsStore {
    /// Open the store at `path`. A missing file is treated as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                Error::persistence(&format!("malformed settings file {}", path.display()), err)
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(Error::persistence(
                    &format!("unable to read {}", path.display()),
                    err,
                ))
            }
        };

        Ok(FileSettingsStore {
            path,
            values: RwLock::new(values),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(poisoned)?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        // Serialize before touching the filesystem so the lock span stays short.
        let contents = {
            let values = self.values.read().map_err(poisoned)?;
            serde_json::to_vec_pretty(&*values)
                .map_err(|err| Error::persistence("unable to encode settings", err))?
        };

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, contents)
            .map_err(|err| Error::persistence(&format!("unable to write {}", tmp.display()), err))?;
        fs::rename(&tmp, &self.path).map_err(|err| {
            Error::persistence(&format!("unable to replace {}", self.path.display()), err)
        })?;

        log::trace!(target: "enhencer", path:display = self.path.display(); "committed settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{FileSettingsStore, InMemorySettingsStore, SettingsStore};
    use crate::Error;

    #[test]
    fn in_memory_store_returns_none_for_missing_key() {
        let store = InMemorySettingsStore::new();
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn in_memory_store_can_be_written_from_another_thread() {
        let store = Arc::new(InMemorySettingsStore::new());

        {
            let store = store.clone();
            let _ = std::thread::spawn(move || {
                store.put("key", "value").unwrap();
                store.commit().unwrap();
            })
            .join();
        }

        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn file_store_survives_reopen_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileSettingsStore::open(&path).unwrap();
        store.put("enh_visitor_id", "421700000000421").unwrap();
        store.commit().unwrap();

        let reopened = FileSettingsStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("enh_visitor_id").unwrap().as_deref(),
            Some("421700000000421")
        );
    }

    #[test]
    fn file_store_does_not_persist_uncommitted_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = FileSettingsStore::open(&path).unwrap();
        store.put("key", "value").unwrap();

        let reopened = FileSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get("key").unwrap(), None);
    }

    #[test]
    fn file_store_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = FileSettingsStore::open(&path).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[test]
    fn file_store_commit_into_missing_directory_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("settings.json");

        let store = FileSettingsStore::open(&path).unwrap();
        store.put("enh_visitor_id", "42").unwrap();

        assert!(matches!(store.commit(), Err(Error::Persistence(_))));
    }

    #[test]
    fn poisoned_store_is_a_persistence_error() {
        let store = Arc::new(InMemorySettingsStore::new());

        {
            let store = store.clone();
            let _ = std::thread::spawn(move || {
                let _guard = store.values.write().unwrap();
                panic!("poison the settings lock");
            })
            .join();
        }

        assert!(matches!(store.get("key"), Err(Error::Persistence(_))));
        assert!(matches!(store.put("key", "value"), Err(Error::Persistence(_))));
    }
}
