//! JSON file backed commission repository.
//!
//! The whole [`CommissionSnapshot`] lives in one JSON file. Every change
//! rewrites the file through a temporary sibling that is renamed over the
//! original, so a global change and its reconciled overrides land together
//! or not at all.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use commission_manager::{
    CommissionError, CommissionRepository, CommissionResult, CommissionSet, CommissionSnapshot,
    UserId, UserIdentity,
};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[cfg(test)]
#[path = "file_store_tests.rs"]
mod tests;

/// Repository that persists the commission state to a JSON file.
///
/// A missing file reads as an empty state; it is created by the first write.
#[derive(Debug)]
pub struct FileCommissionRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCommissionRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current state from disk.
    pub fn snapshot(&self) -> CommissionResult<CommissionSnapshot> {
        read_snapshot(&self.path)
    }

    /// Adds or replaces a user, optionally with an empty settings record.
    pub async fn register_user(
        &self,
        identity: UserIdentity,
        with_settings: bool,
    ) -> CommissionResult<()> {
        let user_id = identity.user_id;
        self.update("register_user", |snapshot| {
            snapshot.add_user(identity, with_settings);
            Ok(())
        })
        .await?;

        info!(
            message = "User registered",
            user_id = %user_id,
            with_settings = with_settings
        );
        Ok(())
    }

    async fn update<F>(&self, operation: &str, change: F) -> CommissionResult<()>
    where
        F: FnOnce(&mut CommissionSnapshot) -> CommissionResult<()>,
    {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = read_snapshot(&self.path)?;
        change(&mut snapshot)?;
        write_snapshot(&self.path, &snapshot)
            .map_err(|e| CommissionError::persistence(operation, e))?;
        debug!(message = "Commission data written", operation = operation, path = ?self.path);
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> CommissionResult<CommissionSnapshot> {
    if !path.exists() {
        return Ok(CommissionSnapshot::new());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        CommissionError::persistence("read", format!("Failed to read {:?}: {}", path, e))
    })?;
    if content.trim().is_empty() {
        return Ok(CommissionSnapshot::new());
    }

    serde_json::from_str(&content).map_err(|e| {
        CommissionError::persistence("read", format!("Failed to parse {:?}: {}", path, e))
    })
}

fn write_snapshot(path: &Path, snapshot: &CommissionSnapshot) -> Result<(), String> {
    let content = serde_json::to_string_pretty(snapshot)
        .map_err(|e| format!("Failed to serialize commission data: {}", e))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create directory: {}", e))?;

    let mut file = NamedTempFile::new_in(dir)
        .map_err(|e| format!("Failed to create temporary file: {}", e))?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| format!("Failed to write temporary file: {}", e))?;
    file.persist(path)
        .map_err(|e| format!("Failed to replace {:?}: {}", path, e.error))?;
    Ok(())
}

#[async_trait]
impl CommissionRepository for FileCommissionRepository {
    async fn load_global(&self) -> CommissionResult<Option<CommissionSet>> {
        Ok(read_snapshot(&self.path)?.global)
    }

    async fn save_global(&self, global: &CommissionSet) -> CommissionResult<()> {
        self.update("save_global", |snapshot| {
            snapshot.global = Some(global.clone());
            Ok(())
        })
        .await
    }

    async fn load_override(&self, user_id: UserId) -> CommissionResult<Option<CommissionSet>> {
        Ok(read_snapshot(&self.path)?.override_of(user_id).cloned())
    }

    async fn save_override(
        &self,
        user_id: UserId,
        overrides: &CommissionSet,
    ) -> CommissionResult<()> {
        self.update("save_override", |snapshot| {
            snapshot.set_override(user_id, overrides.clone())
        })
        .await
    }

    async fn list_customized_overrides(&self) -> CommissionResult<Vec<(UserIdentity, CommissionSet)>> {
        Ok(read_snapshot(&self.path)?.customized())
    }

    async fn find_user(&self, user_id: UserId) -> CommissionResult<Option<UserIdentity>> {
        Ok(read_snapshot(&self.path)?.identity(user_id))
    }

    async fn has_user_settings(&self, user_id: UserId) -> CommissionResult<bool> {
        Ok(read_snapshot(&self.path)?.has_settings(user_id))
    }

    async fn commit_global_change(
        &self,
        global: &CommissionSet,
        overrides: &[(UserId, CommissionSet)],
    ) -> CommissionResult<()> {
        self.update("commit_global_change", |snapshot| {
            snapshot.apply_global_change(global, overrides)
        })
        .await
    }
}
