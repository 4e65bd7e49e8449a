//! Spreadsheet grid parsing and record extraction
//!
//! The parsing layer is pure and infallible by design: human-authored sheet
//! content is full of sparse rows, repeated headers and ragged cells, so
//! every tolerated irregularity is recorded in a [`Diagnostics`] collector
//! (and mirrored to tracing) instead of aborting extraction.

pub mod directory;
pub mod grid;
pub mod timetable;

pub use directory::{parse_committee, parse_labs, parse_teachers, ScanOptions};
pub use grid::{parse_csv, parse_delimited};
pub use timetable::{parse_semester_timetable, RemainderPolicy, TimetableOptions};

/// What kind of irregularity the parser tolerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A row lacked a required identifying field and was dropped
    MissingRequiredField,
    /// A repeated header row was recognized and skipped
    HeaderRowSkipped,
    /// A class cell's line count was not divisible by three
    RaggedClassCell,
    /// A decoded class group had an empty course code and was dropped
    MissingCourseCode,
    /// A slot header did not match the time pattern; default times used
    SlotHeaderFallback,
    /// A semester grid had fewer than two rows and yielded nothing
    InsufficientRows,
}

/// One tolerated irregularity, with enough position info to locate it
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Zero-based row index in the source grid, when applicable
    pub row: Option<usize>,
    /// Slot ordinal, when applicable
    pub slot: Option<u32>,
    pub detail: String,
}

/// Collector for parser diagnostics
///
/// Replaces fire-and-forget console warnings so callers and tests can assert
/// on skip counts. Every push also emits a tracing event at warn level.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        row: Option<usize>,
        slot: Option<u32>,
        detail: impl Into<String>,
    ) {
        let detail = detail.into();
        tracing::warn!(?kind, row, slot, "{detail}");
        self.entries.push(Diagnostic {
            kind,
            row,
            slot,
            detail,
        });
    }

    /// Absorb another collector's entries (used when merging per-semester
    /// parses into one report)
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
