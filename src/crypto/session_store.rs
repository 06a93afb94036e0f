//! Session-scoped key/value storage
//!
//! Holds small string entries that live for one session only: the exported
//! session key and the signed-in user. Clearing an entry is how a session
//! ends.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::error::{VaultError, VaultResult};

/// Session-scoped string storage
pub trait SessionStore: Send + Sync {
    /// Read an entry
    fn get(&self, name: &str) -> VaultResult<Option<String>>;

    /// Create or overwrite an entry
    fn set(&self, name: &str, value: &str) -> VaultResult<()>;

    /// Delete an entry; deleting a missing entry is not an error
    fn remove(&self, name: &str) -> VaultResult<()>;

    /// Check whether an entry exists
    fn contains(&self, name: &str) -> VaultResult<bool> {
        Ok(self.get(name)?.is_some())
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn get(&self, name: &str) -> VaultResult<Option<String>> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str) -> VaultResult<()> {
        (**self).set(name, value)
    }

    fn remove(&self, name: &str) -> VaultResult<()> {
        (**self).remove(name)
    }
}

/// In-process session storage, gone when the process exits
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, name: &str) -> VaultResult<Option<String>> {
        let entries = self.entries.read().map_err(|e| {
            VaultError::Encryption(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(entries.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> VaultResult<()> {
        let mut entries = self.entries.write().map_err(|e| {
            VaultError::Encryption(format!("Failed to acquire write lock: {}", e))
        })?;
        entries.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> VaultResult<()> {
        let mut entries = self.entries.write().map_err(|e| {
            VaultError::Encryption(format!("Failed to acquire write lock: {}", e))
        })?;
        entries.remove(name);
        Ok(())
    }
}

/// Session storage backed by one file per entry
///
/// Lets a session span several CLI invocations until it is cleared.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `dir`
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn entry_path(&self, name: &str) -> VaultResult<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(VaultError::Validation(format!(
                "Invalid session entry name: {}",
                name
            )));
        }
        Ok(self.dir.join(name))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, name: &str) -> VaultResult<Option<String>> {
        let path = self.entry_path(name)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::Io(format!(
                "Failed to read session entry {}: {}",
                name, e
            ))),
        }
    }

    fn set(&self, name: &str, value: &str) -> VaultResult<()> {
        let path = self.entry_path(name)?;
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(&self.dir)
            .map_err(|e| VaultError::Io(format!("Failed to create session directory: {}", e)))?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&path)
            .map_err(|e| VaultError::Io(format!("Failed to open session entry {}: {}", name, e)))?;
        // The creation mode does not apply to a file that already exists
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| {
                    VaultError::Io(format!("Failed to restrict session entry {}: {}", name, e))
                })?;
        }
        file.write_all(value.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| VaultError::Io(format!("Failed to write session entry {}: {}", name, e)))
    }

    fn remove(&self, name: &str) -> VaultResult<()> {
        let path = self.entry_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VaultError::Io(format!(
                "Failed to remove session entry {}: {}",
                name, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert!(store.contains("k").unwrap());

        store.remove("k").unwrap();
        assert!(!store.contains("k").unwrap());
        store.remove("k").unwrap();
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().join("session"));
        store.set("current_user", "user-1").unwrap();

        let reopened = FileSessionStore::new(temp_dir.path().join("session"));
        assert_eq!(
            reopened.get("current_user").unwrap().as_deref(),
            Some("user-1")
        );

        reopened.remove("current_user").unwrap();
        assert_eq!(store.get("current_user").unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().to_path_buf());
        store.set("encryption_master_key", "{}").unwrap();

        let mode = fs::metadata(temp_dir.path().join("encryption_master_key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_store_rejects_path_names() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().to_path_buf());
        assert!(store.set("../escape", "x").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_restricts_existing_entry() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("session");
        let store = FileSessionStore::new(dir.clone());

        fs::create_dir(&dir).unwrap();
        let path = dir.join("encryption_master_key");
        fs::write(&path, "stale").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        store.set("encryption_master_key", "fresh").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.get("encryption_master_key").unwrap().as_deref(), Some("fresh"));

        let other = temp_dir.path().join("other-session");
        FileSessionStore::new(other.clone()).set("k", "v").unwrap();
        let dir_mode = fs::metadata(&other).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o077, 0);
    }
}
