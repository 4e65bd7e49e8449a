//! Record extractors for the directory sheet
//!
//! Each extractor scans a column-aligned grid (the orchestrator slices the
//! wider sheet into the entity's fixed field order) and emits validated
//! records. Repeated header rows are skipped by a case-insensitive
//! fingerprint on the identifying columns; rows missing required identity
//! fields are dropped with a diagnostic.

use crate::models::{CommitteeMember, Lab, Teacher};
use crate::parser::{DiagnosticKind, Diagnostics};

/// Row-scan tuning shared by the three extractors
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// How many consecutive all-blank rows to tolerate before the scan stops.
    /// The default of zero is the strict stop-at-first-blank behavior;
    /// spreadsheet editors sometimes leave stray blank rows mid-list, so the
    /// config layer defaults to a small nonzero value instead.
    pub blank_row_tolerance: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            blank_row_tolerance: 0,
        }
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Tracks the blank-row run so a stray empty row doesn't truncate the list
struct BlankRun {
    seen: usize,
    tolerance: usize,
}

impl BlankRun {
    fn new(tolerance: usize) -> Self {
        Self { seen: 0, tolerance }
    }

    /// Returns true when the scan should stop
    fn observe(&mut self, row_is_blank: bool) -> bool {
        if row_is_blank {
            self.seen += 1;
            self.seen > self.tolerance
        } else {
            self.seen = 0;
            false
        }
    }
}

/// Parse faculty rows: initial, name, designation, department, university,
/// contact, email
pub fn parse_teachers(
    grid: &[Vec<String>],
    opts: &ScanOptions,
    diags: &mut Diagnostics,
) -> Vec<Teacher> {
    let mut teachers = Vec::new();
    let mut blanks = BlankRun::new(opts.blank_row_tolerance);

    for (row_idx, row) in grid.iter().enumerate() {
        let initial = cell(row, 0);
        let name = cell(row, 1);
        let designation = cell(row, 2);
        let department = cell(row, 3);
        let university = cell(row, 4);
        let contact = cell(row, 5);
        let email = cell(row, 6);

        let row_is_blank = [initial, name, designation, department, university, contact, email]
            .iter()
            .all(|v| v.is_empty());
        if blanks.observe(row_is_blank) {
            break;
        }
        if row_is_blank {
            continue;
        }

        if initial.to_lowercase().contains("initial") && name.to_lowercase().contains("name") {
            diags.push(
                DiagnosticKind::HeaderRowSkipped,
                Some(row_idx),
                None,
                "teacher header row",
            );
            continue;
        }

        if initial.is_empty() || name.is_empty() {
            diags.push(
                DiagnosticKind::MissingRequiredField,
                Some(row_idx),
                None,
                "teacher row missing initial or name",
            );
            continue;
        }

        teachers.push(Teacher {
            initial: initial.to_string(),
            name: name.to_string(),
            designation: designation.to_string(),
            department: department.to_string(),
            university: university.to_string(),
            contact: optional(contact),
            email: optional(email),
        });
    }

    tracing::debug!(count = teachers.len(), "parsed teachers");
    teachers
}

/// Parse lab rows: short name, full name, room, in-charge, contact
pub fn parse_labs(grid: &[Vec<String>], opts: &ScanOptions, diags: &mut Diagnostics) -> Vec<Lab> {
    let mut labs = Vec::new();
    let mut blanks = BlankRun::new(opts.blank_row_tolerance);

    for (row_idx, row) in grid.iter().enumerate() {
        let short_name = cell(row, 0);
        let full_name = cell(row, 1);
        let room = cell(row, 2);
        let in_charge = cell(row, 3);
        let contact = cell(row, 4);

        let row_is_blank = [short_name, full_name, room, in_charge, contact]
            .iter()
            .all(|v| v.is_empty());
        if blanks.observe(row_is_blank) {
            break;
        }
        if row_is_blank {
            continue;
        }

        let lower_short = short_name.to_lowercase();
        let lower_full = full_name.to_lowercase();
        let looks_header = (lower_short.contains("lab") || lower_short.contains("short"))
            && (lower_full.contains("name") || lower_full.contains("full"));
        if looks_header {
            diags.push(
                DiagnosticKind::HeaderRowSkipped,
                Some(row_idx),
                None,
                "lab header row",
            );
            continue;
        }

        if short_name.is_empty() && full_name.is_empty() {
            diags.push(
                DiagnosticKind::MissingRequiredField,
                Some(row_idx),
                None,
                "lab row missing both names",
            );
            continue;
        }

        labs.push(Lab {
            short_name: short_name.to_string(),
            full_name: full_name.to_string(),
            room: optional(room),
            in_charge: optional(in_charge),
            contact: optional(contact),
        });
    }

    tracing::debug!(count = labs.len(), "parsed labs");
    labs
}

/// Parse committee rows: initial, name, contact
pub fn parse_committee(
    grid: &[Vec<String>],
    opts: &ScanOptions,
    diags: &mut Diagnostics,
) -> Vec<CommitteeMember> {
    let mut committee = Vec::new();
    let mut blanks = BlankRun::new(opts.blank_row_tolerance);

    for (row_idx, row) in grid.iter().enumerate() {
        let initial = cell(row, 0);
        let name = cell(row, 1);
        let contact = cell(row, 2);

        let row_is_blank = [initial, name, contact].iter().all(|v| v.is_empty());
        if blanks.observe(row_is_blank) {
            break;
        }
        if row_is_blank {
            continue;
        }

        if initial.to_lowercase().contains("initial") && name.to_lowercase().contains("name") {
            diags.push(
                DiagnosticKind::HeaderRowSkipped,
                Some(row_idx),
                None,
                "committee header row",
            );
            continue;
        }

        if initial.is_empty() && name.is_empty() {
            diags.push(
                DiagnosticKind::MissingRequiredField,
                Some(row_idx),
                None,
                "committee row missing initial and name",
            );
            continue;
        }

        committee.push(CommitteeMember {
            initial: initial.to_string(),
            name: name.to_string(),
            contact: optional(contact),
        });
    }

    tracing::debug!(count = committee.len(), "parsed committee");
    committee
}
