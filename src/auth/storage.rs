//! Scoped key-value storage backing the credential store.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::error::AuthError;

const STORAGE_FILE_NAME: &str = "credentials.toml";
const STORAGE_FILE_VERSION: u32 = 1;

/// Lifetime of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Scope {
    /// Lives as long as the current process/session.
    Session,
    /// Survives restarts ("remember me").
    Persistent,
}

impl Scope {
    /// Order in which reads consult the scopes.
    pub const READ_ORDER: [Scope; 2] = [Scope::Persistent, Scope::Session];

    pub fn for_remember_me(remember_me: bool) -> Self {
        if remember_me {
            Self::Persistent
        } else {
            Self::Session
        }
    }
}

/// Key-value storage with two lifetime scopes.
pub trait ScopedStorage: Send + Sync {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, AuthError>;
    fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), AuthError>;
    fn remove(&self, scope: Scope, key: &str) -> Result<(), AuthError>;
}

/// Both scopes held in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<(Scope, String), String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no value is stored in either scope.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }

    fn entries(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<(Scope, String), String>>, AuthError> {
        self.entries
            .lock()
            .map_err(|_| AuthError::Storage("memory storage lock poisoned".to_string()))
    }
}

impl ScopedStorage for MemoryStorage {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries()?.get(&(scope, key.to_string())).cloned())
    }

    fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), AuthError> {
        self.entries()?
            .insert((scope, key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, scope: Scope, key: &str) -> Result<(), AuthError> {
        self.entries()?.remove(&(scope, key.to_string()));
        Ok(())
    }
}

/// Session scope in memory, persistent scope in a TOML file.
///
/// # Example
/// ```no_run
/// use ecodash::auth::{FileStorage, Scope, ScopedStorage};
///
/// let storage = FileStorage::new("/tmp/ecodash");
/// storage.set(Scope::Persistent, "access_token", "abc")?;
/// # Ok::<(), ecodash::auth::AuthError>(())
/// ```
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    session: MemoryStorage,
    file_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(STORAGE_FILE_NAME),
            session: MemoryStorage::new(),
            file_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<BTreeMap<String, String>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(AuthError::Storage(err.to_string())),
        };
        let file: StorageFile = toml::from_str(&raw)?;
        if file.version != STORAGE_FILE_VERSION {
            return Err(AuthError::Storage(format!(
                "Unsupported credentials file version {} at {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(file.entries)
    }

    fn write_file(&self, entries: BTreeMap<String, String>) -> Result<(), AuthError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(AuthError::Storage(err.to_string())),
            };
        }
        let file = StorageFile {
            version: STORAGE_FILE_VERSION,
            entries,
        };
        let serialized = toml::to_string(&file)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Concurrent writers in this process are serialized by `file_lock`.
        let staging = self
            .path
            .with_extension(format!("toml.{}.tmp", std::process::id()));
        let _ = fs::remove_file(&staging);
        let staged = write_owner_only(&staging, serialized.as_bytes())
            .and_then(|()| fs::rename(&staging, &self.path));
        if let Err(err) = staged {
            let _ = fs::remove_file(&staging);
            return Err(AuthError::Storage(format!(
                "Writing {}: {err}",
                self.path.display()
            )));
        }
        Ok(())
    }

    fn update_file(
        &self,
        edit: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), AuthError> {
        let _guard = self
            .file_lock
            .lock()
            .map_err(|_| AuthError::Storage("file storage lock poisoned".to_string()))?;
        let mut entries = self.read_file()?;
        edit(&mut entries);
        self.write_file(entries)
    }
}

impl ScopedStorage for FileStorage {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, AuthError> {
        match scope {
            Scope::Session => self.session.get(scope, key),
            Scope::Persistent => Ok(self.read_file()?.remove(key)),
        }
    }

    fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), AuthError> {
        match scope {
            Scope::Session => self.session.set(scope, key, value),
            Scope::Persistent => self.update_file(|entries| {
                entries.insert(key.to_string(), value.to_string());
            }),
        }
    }

    fn remove(&self, scope: Scope, key: &str) -> Result<(), AuthError> {
        match scope {
            Scope::Session => self.session.remove(scope, key),
            Scope::Persistent => self.update_file(|entries| {
                entries.remove(key);
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StorageFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Create `path` readable by the owner only and fill it with `data`.
fn write_owner_only(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}
