//! Export-then-wipe flow
//!
//! `Idle -> Exporting -> Exported -> Clearing -> Cleared`. A failed export
//! lands in `Failed` and may be retried; clearing is refused until a backup
//! has been written to disk.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::clear::clear_all_data;
use super::document::{write_export, DataStats};
use super::export::export_all_data;
use crate::error::{VaultError, VaultResult};
use crate::storage::Backend;

/// Where the flow currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WipeState {
    Idle,
    Exporting,
    Exported { backup: PathBuf },
    Clearing { backup: PathBuf },
    Cleared { backup: PathBuf, removed: DataStats },
    Failed(String),
}

impl fmt::Display for WipeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WipeState::Idle => write!(f, "idle"),
            WipeState::Exporting => write!(f, "exporting"),
            WipeState::Exported { .. } => write!(f, "exported"),
            WipeState::Clearing { .. } => write!(f, "clearing"),
            WipeState::Cleared { .. } => write!(f, "cleared"),
            WipeState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Drives a backup followed by a full clear
#[derive(Debug)]
pub struct WipeFlow {
    state: WipeState,
}

impl Default for WipeFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl WipeFlow {
    /// Start idle
    pub fn new() -> Self {
        Self {
            state: WipeState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> &WipeState {
        &self.state
    }

    /// Export the account and write it to `backup`
    pub async fn export<B, P>(&mut self, backend: &B, backup: &Path, on_progress: P) -> VaultResult<()>
    where
        B: Backend,
        P: FnMut(&str, u8),
    {
        match self.state {
            WipeState::Idle | WipeState::Failed(_) => {}
            ref other => {
                return Err(VaultError::Validation(format!(
                    "Cannot export while {}",
                    other
                )))
            }
        }

        self.state = WipeState::Exporting;
        let outcome = match export_all_data(backend, on_progress).await {
            Ok(document) => write_export(&document, backup),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                info!(path = %backup.display(), "backup written before wipe");
                self.state = WipeState::Exported {
                    backup: backup.to_path_buf(),
                };
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "backup before wipe failed");
                self.state = WipeState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Delete all data; only allowed once the backup exists
    pub async fn clear<B, P>(&mut self, backend: &B, on_progress: P) -> VaultResult<DataStats>
    where
        B: Backend,
        P: FnMut(&str, u8),
    {
        let backup = match &self.state {
            WipeState::Exported { backup } => backup.clone(),
            other => {
                return Err(VaultError::Validation(format!(
                    "Refusing to clear data: no backup exported (state: {})",
                    other
                )))
            }
        };

        self.state = WipeState::Clearing {
            backup: backup.clone(),
        };

        match clear_all_data(backend, on_progress).await {
            Ok(removed) => {
                self.state = WipeState::Cleared { backup, removed };
                Ok(removed)
            }
            Err(e) => {
                self.state = WipeState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Return to idle
    pub fn reset(&mut self) {
        self.state = WipeState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultPaths;
    use crate::crypto::MemorySessionStore;
    use crate::models::{Credential, UserId};
    use crate::storage::{Filter, JsonBackend};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_clear_refused_without_backup() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let backend = JsonBackend::open(paths, MemorySessionStore::new()).unwrap();
        backend.sign_in(&UserId::new("alice")).unwrap();

        let mut flow = WipeFlow::new();
        let result = flow.clear(&backend, |_: &str, _: u8| {}).await;
        assert!(matches!(result, Err(VaultError::Validation(_))));
        assert_eq!(flow.state(), &WipeState::Idle);
    }

    #[tokio::test]
    async fn test_failed_export_can_retry() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let backend = JsonBackend::open(paths, MemorySessionStore::new()).unwrap();
        let backup = temp_dir.path().join("wipe-backup.json");

        let mut flow = WipeFlow::new();
        assert!(flow.export(&backend, &backup, |_: &str, _: u8| {}).await.is_err());
        assert!(matches!(flow.state(), WipeState::Failed(_)));
        assert!(!backup.exists());

        backend.sign_in(&UserId::new("alice")).unwrap();
        flow.export(&backend, &backup, |_: &str, _: u8| {}).await.unwrap();
        assert!(matches!(flow.state(), WipeState::Exported { .. }));
    }

    #[tokio::test]
    async fn test_full_flow() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let backend = JsonBackend::open(paths, MemorySessionStore::new()).unwrap();
        let user = UserId::new("alice");
        backend.sign_in(&user).unwrap();
        backend
            .insert(&[Credential::new(user, "OpenAI", "ZW52")])
            .await
            .unwrap();

        let backup = temp_dir.path().join("wipe-backup.json");
        let mut flow = WipeFlow::new();
        flow.export(&backend, &backup, |_: &str, _: u8| {}).await.unwrap();
        assert!(backup.exists());

        let removed = flow.clear(&backend, |_: &str, _: u8| {}).await.unwrap();
        assert_eq!(removed.api_keys, 1);
        assert!(matches!(flow.state(), WipeState::Cleared { .. }));

        let left: Vec<Credential> = backend.select(&Filter::all(), None).await.unwrap();
        assert!(left.is_empty());

        flow.reset();
        assert_eq!(flow.state(), &WipeState::Idle);
    }
}
