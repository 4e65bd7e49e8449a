//! Data source orchestration
//!
//! [`RoutineSync`] sequences one full snapshot assembly: directory ranges
//! and the nine semester grids are fetched concurrently, parsed, merged into
//! a [`RoutineData`], persisted write-through, and handed back. When the
//! primary fetch fails the ordered fallback chain runs:
//!
//! 1. live fetch + parse
//! 2. exported backup snapshot (only for network-style failures)
//! 3. last persisted offline snapshot
//! 4. [`SyncError::NoDataAvailable`]
//!
//! Successfully parsed semester grids are memoized per orchestrator instance
//! for the lifetime of the process; `clear_memo` forces a full re-fetch.

pub mod connectivity;

pub use connectivity::{ConnectivityPort, ConnectivityWatcher, StaticConnectivity, SyncListener};

use crate::fetch::SheetFetcher;
use crate::models::{ClassSession, RoutineData, SemesterTimetable, Teacher};
use crate::parser::{
    parse_committee, parse_labs, parse_semester_timetable, parse_teachers, Diagnostics,
    ScanOptions, TimetableOptions,
};
use crate::storage::OfflineStore;
use crate::utils::error::{FetchError, SyncError};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Pre-parsed snapshot supplied by an external collaborator (for example an
/// exported backup file). The core only needs an availability check and a
/// load call; the backup's own format is not its concern.
pub trait BackupSource: Send + Sync {
    fn available(&self) -> bool;
    fn load(&self) -> Option<RoutineData>;
}

/// Backup source reading a `RoutineData`-shaped JSON file
pub struct FileBackup {
    path: PathBuf,
}

impl FileBackup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BackupSource for FileBackup {
    fn available(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> Option<RoutineData> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "backup file unreadable");
                None
            }
        }
    }
}

/// Which tier of the fallback chain produced the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Live,
    Backup,
    OfflineCache,
}

/// Outcome of one sync run
#[derive(Debug)]
pub struct SyncReport {
    pub data: RoutineData,
    pub diagnostics: Diagnostics,
    pub source: DataSource,
    /// The primary fetch failure when the snapshot came from a fallback
    /// tier; lets callers tell a connectivity outage from a data problem
    pub primary_error: Option<FetchError>,
}

/// Sheet layout and parsing knobs for one orchestrator
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// A1 ranges of the directory sheet, column-aligned to each entity
    pub teacher_range: String,
    pub committee_range: String,
    pub lab_range: String,
    /// Semester sheet tab labels, one timetable each
    pub semesters: Vec<String>,
    pub scan: ScanOptions,
    pub timetable: TimetableOptions,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            teacher_range: "Info.!B2:H".to_string(),
            committee_range: "Info.!L2:N".to_string(),
            lab_range: "Info.!K15:O".to_string(),
            semesters: crate::models::Semester::all()
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            scan: ScanOptions::default(),
            timetable: TimetableOptions::default(),
        }
    }
}

/// The data source orchestrator
pub struct RoutineSync {
    fetcher: SheetFetcher,
    store: OfflineStore,
    backup: Option<Box<dyn BackupSource>>,
    connectivity: Arc<dyn ConnectivityPort>,
    options: SyncOptions,
    /// Per-instance memo of successfully parsed semester grids; no expiry
    memo: Mutex<HashMap<String, SemesterTimetable>>,
    /// Serializes overlapping periodic and reconnect-triggered refreshes
    inflight: tokio::sync::Mutex<()>,
}

impl RoutineSync {
    pub fn new(
        fetcher: SheetFetcher,
        store: OfflineStore,
        connectivity: Arc<dyn ConnectivityPort>,
        options: SyncOptions,
    ) -> Self {
        Self {
            fetcher,
            store,
            backup: None,
            connectivity,
            options,
            memo: Mutex::new(HashMap::new()),
            inflight: tokio::sync::Mutex::new(()),
        }
    }

    /// Attach an exported-backup collaborator as the second fallback tier
    pub fn with_backup(mut self, backup: Box<dyn BackupSource>) -> Self {
        self.backup = Some(backup);
        self
    }

    pub fn store(&self) -> &OfflineStore {
        &self.store
    }

    /// Drop the per-instance semester memo, forcing re-fetch on next sync
    pub fn clear_memo(&self) {
        self.memo.lock().expect("semester memo poisoned").clear();
    }

    /// Produce one complete snapshot, or fail only after every fallback
    ///
    /// Concurrent callers serialize on the in-flight guard; the later caller
    /// re-runs against the warm semester memo.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let _guard = self.inflight.lock().await;

        let primary_err = match self.fetch_live().await {
            Ok((data, diagnostics)) => {
                // Write-through: persist before returning so later failures
                // can fall back to this snapshot
                self.store.save(&data, self.connectivity.is_online());
                return Ok(SyncReport {
                    data,
                    diagnostics,
                    source: DataSource::Live,
                    primary_error: None,
                });
            }
            Err(e) => e,
        };

        let offline = !self.connectivity.is_online();
        tracing::warn!(error = %primary_err, offline, "primary fetch failed, trying fallbacks");

        if offline || primary_err.is_network_related() {
            if let Some(data) = self.load_backup() {
                tracing::info!("serving snapshot from exported backup");
                return Ok(SyncReport {
                    data,
                    diagnostics: Diagnostics::new(),
                    source: DataSource::Backup,
                    primary_error: Some(primary_err),
                });
            }
        }

        if let Some(data) = self.store.load() {
            tracing::info!(last_updated = %data.last_updated, "serving persisted offline snapshot");
            return Ok(SyncReport {
                data,
                diagnostics: Diagnostics::new(),
                source: DataSource::OfflineCache,
                primary_error: Some(primary_err),
            });
        }

        Err(SyncError::NoDataAvailable { offline })
    }

    /// Serve the best snapshot without touching the network: persisted cache
    /// first, then the exported backup
    pub fn cached(&self) -> Option<SyncReport> {
        if let Some(data) = self.store.load() {
            return Some(SyncReport {
                data,
                diagnostics: Diagnostics::new(),
                source: DataSource::OfflineCache,
                primary_error: None,
            });
        }
        self.load_backup().map(|data| SyncReport {
            data,
            diagnostics: Diagnostics::new(),
            source: DataSource::Backup,
            primary_error: None,
        })
    }

    fn load_backup(&self) -> Option<RoutineData> {
        let backup = self.backup.as_ref()?;
        if !backup.available() {
            return None;
        }
        backup.load()
    }

    /// Primary pipeline: fetch directory ranges and all semester grids,
    /// parse, and assemble the snapshot
    async fn fetch_live(&self) -> Result<(RoutineData, Diagnostics), FetchError> {
        let (teacher_rows, committee_rows, lab_rows) = tokio::try_join!(
            self.fetcher.fetch_range(&self.options.teacher_range),
            self.fetcher.fetch_range(&self.options.committee_range),
            self.fetcher.fetch_range(&self.options.lab_range),
        )?;

        let mut diagnostics = Diagnostics::new();
        let teachers = parse_teachers(&teacher_rows, &self.options.scan, &mut diagnostics);
        let labs = parse_labs(&lab_rows, &self.options.scan, &mut diagnostics);
        let committee = parse_committee(&committee_rows, &self.options.scan, &mut diagnostics);

        // Semester grids are independent; fetch them concurrently. Each
        // writes its own slot of the result, a per-semester failure only
        // costs that one semester.
        let fetches = self
            .options
            .semesters
            .iter()
            .map(|label| async move { (label.clone(), self.fetch_semester(label).await) });
        let results = futures::future::join_all(fetches).await;

        let mut semesters = std::collections::BTreeMap::new();
        for (label, outcome) in results {
            match outcome {
                Ok((timetable, diags)) => {
                    diagnostics.extend(diags);
                    semesters.insert(label, timetable);
                }
                Err(e) => {
                    tracing::warn!(semester = %label, error = %e, "semester fetch failed, substituting placeholder");
                    semesters.insert(label.clone(), SemesterTimetable::placeholder(&label));
                }
            }
        }

        Ok((
            RoutineData {
                teachers,
                labs,
                committee,
                semesters,
                last_updated: Utc::now(),
            },
            diagnostics,
        ))
    }

    /// Fetch and parse one semester grid, consulting the memo first
    async fn fetch_semester(
        &self,
        label: &str,
    ) -> Result<(SemesterTimetable, Diagnostics), FetchError> {
        if let Some(hit) = self
            .memo
            .lock()
            .expect("semester memo poisoned")
            .get(label)
            .cloned()
        {
            tracing::debug!(semester = label, "semester grid served from memo");
            return Ok((hit, Diagnostics::new()));
        }

        let grid = self.fetcher.fetch_sheet(label).await?;
        let mut diags = Diagnostics::new();
        let timetable =
            parse_semester_timetable(&grid, label, &self.options.timetable, &mut diags);

        self.memo
            .lock()
            .expect("semester memo poisoned")
            .insert(label.to_string(), timetable.clone());

        Ok((timetable, diags))
    }
}

/// Resolve each session's teacher initials to a display name
///
/// Explicitly invoked step, separate from parsing. Matching is a
/// case-insensitive exact comparison against `Teacher::initial`; sessions
/// without a match keep their raw initials and no resolved name.
pub fn enrich_sessions(sessions: &mut [ClassSession], teachers: &[Teacher]) {
    for session in sessions.iter_mut() {
        session.teacher_name = teachers
            .iter()
            .find(|t| t.initial.eq_ignore_ascii_case(&session.teacher_initials))
            .map(|t| t.name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teacher(initial: &str, name: &str) -> Teacher {
        Teacher {
            initial: initial.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn session(initials: &str) -> ClassSession {
        ClassSession {
            course_code: "CSE101".to_string(),
            teacher_initials: initials.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_enrichment_is_case_insensitive() {
        let teachers = vec![teacher("mah", "Mahmudul Hasan")];
        let mut sessions = vec![session("MAH")];

        enrich_sessions(&mut sessions, &teachers);
        assert_eq!(sessions[0].teacher_name.as_deref(), Some("Mahmudul Hasan"));
    }

    #[test]
    fn test_enrichment_unmatched_keeps_raw_initials() {
        let teachers = vec![teacher("JD", "Jane Doe")];
        let mut sessions = vec![session("ZZ")];

        enrich_sessions(&mut sessions, &teachers);
        assert_eq!(sessions[0].teacher_name, None);
        assert_eq!(sessions[0].teacher_initials, "ZZ");
    }

    #[test]
    fn test_enrichment_requires_exact_match() {
        let teachers = vec![teacher("MA", "M. Alam")];
        let mut sessions = vec![session("MAH")];

        enrich_sessions(&mut sessions, &teachers);
        assert_eq!(sessions[0].teacher_name, None);
    }

    #[test]
    fn test_default_sync_options_cover_nine_semesters() {
        let opts = SyncOptions::default();
        assert_eq!(opts.semesters.len(), 9);
        assert_eq!(opts.semesters[0], "1st");
        assert_eq!(opts.semesters[8], "9th");
    }
}
