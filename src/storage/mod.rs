//! Offline snapshot store
//!
//! Persists the last successfully assembled [`RoutineData`] plus a small
//! sync-status record to JSON files under a data directory. Because the
//! store exists to be a fallback, every operation is fail-soft: an I/O
//! failure is logged and treated as "no data", never propagated.

use crate::models::RoutineData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SNAPSHOT_FILE: &str = "routine-snapshot.json";
const SYNC_STATUS_FILE: &str = "sync-status.json";

/// When the snapshot was last written and whether the environment was online
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Epoch milliseconds of the last successful save
    pub last_sync_time: i64,
    pub is_online: bool,
}

impl SyncStatus {
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.last_sync_time)
    }
}

/// File-backed store for the last-known-good snapshot
#[derive(Debug, Clone)]
pub struct OfflineStore {
    data_dir: PathBuf,
}

impl OfflineStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    fn status_path(&self) -> PathBuf {
        self.data_dir.join(SYNC_STATUS_FILE)
    }

    /// Persist the snapshot and refresh the sync-status record
    ///
    /// Overwrites any prior value. Failures are logged and swallowed; a
    /// broken disk must not turn a successful fetch into an error.
    pub fn save(&self, data: &RoutineData, is_online: bool) {
        if let Err(e) = self.write_json(&self.snapshot_path(), data) {
            tracing::warn!(error = %e, "failed to save offline snapshot");
            return;
        }

        let status = SyncStatus {
            last_sync_time: Utc::now().timestamp_millis(),
            is_online,
        };
        if let Err(e) = self.write_json(&self.status_path(), &status) {
            tracing::warn!(error = %e, "failed to save sync status");
        }
        tracing::debug!(path = %self.snapshot_path().display(), "offline snapshot saved");
    }

    /// Load the last persisted snapshot, if any
    ///
    /// Corrupted or unreadable files are treated as absent.
    pub fn load(&self) -> Option<RoutineData> {
        match std::fs::read_to_string(self.snapshot_path()) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(data) => Some(data),
                Err(e) => {
                    tracing::warn!(error = %e, "offline snapshot is corrupted, ignoring");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read offline snapshot");
                None
            }
        }
    }

    /// Read the sync-status record, if any
    pub fn sync_status(&self) -> Option<SyncStatus> {
        let content = std::fs::read_to_string(self.status_path()).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Whether a persisted snapshot exists on disk
    pub fn has_snapshot(&self) -> bool {
        self.snapshot_path().exists()
    }

    /// Remove persisted state; failures are logged and swallowed
    pub fn clear(&self) {
        for path in [self.snapshot_path(), self.status_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to clear"),
            }
        }
    }

    /// Atomic JSON write: temp file in the same directory, then rename
    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let temp_path = path.with_extension("tmp");
        let content = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
        std::fs::write(&temp_path, content)?;
        std::fs::rename(temp_path, path)?;
        Ok(())
    }
}
