//! Durable local storage for the identity record.
//!
//! The contract mirrors browser local storage: string keys, opaque values,
//! synchronous reads and writes. The session only ever uses one key
//! (`gameUser` by default) and always writes the full record.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use autochess_protocol::{Codec, PlayerIdentity};

use crate::{SessionError, StoreError};

/// A synchronous key/value store that survives restarts.
pub trait IdentityStore: Send + Sync + 'static {
    /// Reads the value under `key`. `Ok(None)` means nothing is stored.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the value under `key`.
    fn save(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Erases the value under `key`. Erasing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Lets several sessions (e.g. one before and one after a simulated
/// restart) share the same backing store.
impl<T: IdentityStore + ?Sized> IdentityStore for Arc<T> {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).save(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Encodes `identity` and writes it under `key`, replacing any previous
/// record.
pub(crate) fn persist_identity<S, C>(
    store: &S,
    codec: &C,
    key: &str,
    identity: &PlayerIdentity,
) -> Result<(), SessionError>
where
    S: IdentityStore,
    C: Codec,
{
    let bytes = codec.encode(identity).map_err(SessionError::Encode)?;
    store.save(key, &bytes)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// An in-process store. Contents vanish with the process, so this is for
/// tests and for embedding the session where persistence isn't wanted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a value, as if a previous run had written it.
    pub fn with_entry(self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        self.lock().insert(key.to_string(), value.into());
        self
    }

    /// Returns a copy of the value under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panic while holding the lock can't leave a half-written entry:
        // every operation is a single map call.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IdentityStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// A store that keeps each key in `<dir>/<key>.json`.
///
/// Writes go to a sibling temp file first and are then renamed into
/// place, so a crash mid-write leaves either the old record or the new
/// one, never a truncated mix.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created lazily
    /// on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file that holds `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source,
    }
}

impl IdentityStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error(key, e))?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| io_error(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(key, e))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =====================================================================
    // MemoryStore
    // =====================================================================

    #[test]
    fn test_memory_store_load_missing_returns_none() {
        let store = MemoryStore::new();

        assert_eq!(store.load("gameUser").unwrap(), None);
    }

    #[test]
    fn test_memory_store_save_then_load_returns_value() {
        let store = MemoryStore::new();

        store.save("gameUser", b"{}").unwrap();

        assert_eq!(store.load("gameUser").unwrap(), Some(b"{}".to_vec()));
    }

    #[test]
    fn test_memory_store_remove_erases_only_that_key() {
        let store = MemoryStore::new()
            .with_entry("gameUser", "a")
            .with_entry("other", "b");

        store.remove("gameUser").unwrap();

        assert_eq!(store.get("gameUser"), None);
        assert_eq!(store.get("other"), Some(b"b".to_vec()));
    }

    #[test]
    fn test_arc_store_shares_contents() {
        let store = Arc::new(MemoryStore::new());
        let alias = Arc::clone(&store);

        alias.save("gameUser", b"x").unwrap();

        assert_eq!(store.get("gameUser"), Some(b"x".to_vec()));
    }

    // =====================================================================
    // FileStore
    // =====================================================================

    #[test]
    fn test_file_store_round_trip_through_disk() {
        let td = tempfile::tempdir().unwrap();
        let dir = td.path().join("data");
        let store = FileStore::new(&dir);

        assert_eq!(store.load("gameUser").unwrap(), None);

        store.save("gameUser", br#"{"id":"abc"}"#).unwrap();
        assert!(store.path_for("gameUser").ends_with("gameUser.json"));

        // A second handle on the same directory sees the record, which is
        // what a process restart looks like.
        let reopened = FileStore::new(&dir);
        assert_eq!(
            reopened.load("gameUser").unwrap(),
            Some(br#"{"id":"abc"}"#.to_vec())
        );
    }

    #[test]
    fn test_file_store_save_overwrites_whole_record() {
        let td = tempfile::tempdir().unwrap();
        let store = FileStore::new(td.path());

        store.save("gameUser", b"a much longer first record").unwrap();
        store.save("gameUser", b"short").unwrap();

        assert_eq!(store.load("gameUser").unwrap(), Some(b"short".to_vec()));
        assert!(!store.path_for("gameUser").with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_remove_missing_key_is_ok() {
        let td = tempfile::tempdir().unwrap();
        let store = FileStore::new(td.path().join("never-created"));

        assert!(store.remove("gameUser").is_ok());
    }

    #[test]
    fn test_file_store_remove_deletes_file() {
        let td = tempfile::tempdir().unwrap();
        let store = FileStore::new(td.path());
        store.save("gameUser", b"x").unwrap();

        store.remove("gameUser").unwrap();

        assert_eq!(store.load("gameUser").unwrap(), None);
    }
}
