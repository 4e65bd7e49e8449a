//! classroutine - Department class routine aggregator
//!
//! Ingests a department's shared spreadsheet (class timetables, faculty
//! directory, lab listing, committee roster) into a typed snapshot, with a
//! multi-tier fallback cache so the data stays available offline.
//!
//! # Architecture
//!
//! - [`config`] - Configuration management and settings
//! - [`parser`] - Grid parsing, record extraction and the timetable decoder
//! - [`fetch`] - HTTP access to the spreadsheet's export endpoints
//! - [`models`] - Core data structures and types
//! - [`storage`] - Offline snapshot persistence
//! - [`sync`] - Orchestration, fallback chain and connectivity watching
//!
//! # Example
//!
//! ```no_run
//! use classroutine::config::Config;
//! use classroutine::fetch::SheetFetcher;
//! use classroutine::storage::OfflineStore;
//! use classroutine::sync::{RoutineSync, StaticConnectivity};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let fetcher = SheetFetcher::new(&config.sheets.spreadsheet_id, None)?;
//!     let store = OfflineStore::new(&config.storage.data_dir);
//!     let sync = RoutineSync::new(
//!         fetcher,
//!         store,
//!         Arc::new(StaticConnectivity(true)),
//!         config.sync_options(),
//!     );
//!     let report = sync.sync().await?;
//!     println!("{} teachers", report.data.teachers.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod parser;
pub mod storage;
pub mod sync;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::fetch::SheetFetcher;
    pub use crate::models::{
        ClassSession, CommitteeMember, DaySchedule, Lab, RoutineData, Semester,
        SemesterTimetable, Teacher, TimeSlot,
    };
    pub use crate::parser::Diagnostics;
    pub use crate::storage::OfflineStore;
    pub use crate::sync::{enrich_sessions, ConnectivityWatcher, RoutineSync};
}

// Direct re-exports for convenience
pub use models::{ClassSession, RoutineData, Semester, SemesterTimetable, Teacher};
