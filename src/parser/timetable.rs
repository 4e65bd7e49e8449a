//! Semester timetable extraction
//!
//! Decodes one semester's raw grid into a [`SemesterTimetable`] in two
//! phases: slot discovery over the header row, then day/slot cell decoding
//! with the 3-line-per-class micro-grammar.
//!
//! Every fallback is deterministic and diagnostic-only; this module never
//! returns an error. An empty or unpublished sheet is expected input.
//!
//! Slot header fallback decision table:
//!
//! | header cell                       | result                              |
//! |-----------------------------------|-------------------------------------|
//! | matches `H:MM[ AM/PM] - H:MM..`   | times from header, 24h-normalized   |
//! | `slot` marker, no parseable time  | default table entry for the ordinal |
//! | ordinal beyond default table      | generic 09:00-10:00                 |
//! | non-blank, no time or slot marker | separator column, skipped           |
//! | blank after >=1 recognized slot   | ends the slot block                 |
//! | zero slot headers in the row      | whole default slot table            |

use crate::models::{ClassSession, DaySchedule, SemesterTimetable, TimeSlot};
use crate::models::default_time_slots;
use crate::parser::{DiagnosticKind, Diagnostics};
use regex::Regex;
use std::sync::OnceLock;

/// What to do with leftover lines after greedy 3-line grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Discard the remainder, keep the complete groups
    #[default]
    Discard,
    /// Treat a ragged cell as unusable and drop all of its groups
    Reject,
}

/// Timetable extraction tuning
#[derive(Debug, Clone, Copy, Default)]
pub struct TimetableOptions {
    pub remainder_policy: RemainderPolicy,
}

/// Cell marker meaning "no class scheduled"
const EMPTY_MARKER: &str = "-";

fn time_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d{1,2}):(\d{2})\s*(AM|PM)?\s*-\s*(\d{1,2}):(\d{2})\s*(AM|PM)?")
            .expect("time range pattern")
    })
}

fn section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)([A-Z])\s+Sec").expect("section pattern"))
}

fn room_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Room[\s:]*([A-Z0-9]+)").expect("room pattern"))
}

/// Decode one semester grid into a timetable
///
/// A grid with fewer than two rows (header plus at least one data row)
/// yields an empty timetable rather than an error.
pub fn parse_semester_timetable(
    grid: &[Vec<String>],
    semester: &str,
    opts: &TimetableOptions,
    diags: &mut Diagnostics,
) -> SemesterTimetable {
    if grid.len() < 2 {
        diags.push(
            DiagnosticKind::InsufficientRows,
            None,
            None,
            format!("{semester}: insufficient data ({} rows)", grid.len()),
        );
        return SemesterTimetable::empty(semester);
    }

    let slot_columns = discover_slots(&grid[0], semester, diags);
    let classes = decode_cells(&grid[1..], &slot_columns, opts, diags);

    tracing::debug!(
        semester,
        slots = slot_columns.len(),
        classes = classes.len(),
        "parsed semester timetable"
    );

    SemesterTimetable {
        semester: semester.to_string(),
        schedule: group_by_day(classes),
        time_slots: slot_columns.into_iter().map(|(_, slot)| slot).collect(),
    }
}

/// Phase 1: detect the slot columns and derive their times from the header
///
/// A header cell is a slot header when non-blank and either time-like
/// (contains a colon) or carrying a "slot" marker token. Non-blank cells
/// that are neither ("Break" separators) are skipped; the first blank cell
/// after at least one recognized slot ends the block. Each slot keeps its
/// source column index, since separators leave holes between slot columns.
fn discover_slots(
    header: &[String],
    semester: &str,
    diags: &mut Diagnostics,
) -> Vec<(usize, TimeSlot)> {
    let defaults = default_time_slots();
    let mut slots: Vec<(usize, TimeSlot)> = Vec::new();

    for (column, cell) in header.iter().enumerate().skip(1) {
        let text = cell.trim();
        if text.is_empty() {
            if !slots.is_empty() {
                break;
            }
            continue;
        }
        if !text.contains(':') && !text.to_lowercase().contains("slot") {
            continue;
        }

        let ordinal = slots.len() as u32 + 1;
        let (start_time, end_time) = match parse_time_range(text) {
            Some(pair) => pair,
            None => {
                let fallback = defaults
                    .get(slots.len())
                    .map(|s| (s.start_time.clone(), s.end_time.clone()))
                    .unwrap_or_else(|| ("09:00".to_string(), "10:00".to_string()));
                diags.push(
                    DiagnosticKind::SlotHeaderFallback,
                    Some(0),
                    Some(ordinal),
                    format!("{semester}: slot {ordinal} header {text:?} not time-like, using {}-{}", fallback.0, fallback.1),
                );
                fallback
            }
        };

        slots.push((column, TimeSlot::new(ordinal, start_time, end_time)));
    }

    if slots.is_empty() {
        diags.push(
            DiagnosticKind::SlotHeaderFallback,
            Some(0),
            None,
            format!("{semester}: no slot headers recognized, using default slot table"),
        );
        return defaults
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| (idx + 1, slot))
            .collect();
    }

    slots
}

/// Extract a `H:MM[ AM/PM] - H:MM[ AM/PM]` pair, normalized to 24-hour time
fn parse_time_range(text: &str) -> Option<(String, String)> {
    let caps = time_range_re().captures(text)?;

    let start = to_24h(&caps[1], &caps[2], caps.get(3).map(|m| m.as_str()))?;
    let end = to_24h(&caps[4], &caps[5], caps.get(6).map(|m| m.as_str()))?;
    Some((start, end))
}

/// 12-hour to 24-hour normalization: 12 AM -> 00, 12 PM -> 12, other PM +12
fn to_24h(hour: &str, minute: &str, period: Option<&str>) -> Option<String> {
    let mut hour: u32 = hour.parse().ok()?;
    match period.map(|p| p.to_ascii_uppercase()) {
        Some(p) if p == "PM" && hour != 12 => hour += 12,
        Some(p) if p == "AM" && hour == 12 => hour = 0,
        _ => {}
    }
    Some(format!("{hour:02}:{minute}"))
}

/// Phase 2: walk the data rows and decode populated day/slot cells
fn decode_cells(
    rows: &[Vec<String>],
    slot_columns: &[(usize, TimeSlot)],
    opts: &TimetableOptions,
    diags: &mut Diagnostics,
) -> Vec<ClassSession> {
    let mut classes = Vec::new();
    let mut current_day: Option<String> = None;

    for (row_idx, row) in rows.iter().enumerate() {
        if row.is_empty() {
            continue;
        }

        // Day labels live in merged cells: only the first physical row of a
        // day block carries the label, so it is carried forward until the
        // next non-blank label.
        let day_cell = row.first().map(|c| c.trim()).unwrap_or("");
        if !day_cell.is_empty() && day_cell != EMPTY_MARKER {
            current_day = Some(day_cell.to_string());
        }
        let Some(day) = current_day.clone() else {
            // Rows above the first day label are preamble
            continue;
        };

        for (column, slot) in slot_columns {
            let Some(content) = row.get(*column).map(|c| c.trim()) else {
                continue;
            };
            if content.is_empty() || content == EMPTY_MARKER {
                continue;
            }

            decode_class_cell(content, &day, slot, row_idx, opts, diags, &mut classes);
        }
    }

    classes
}

/// Decode one populated cell: trimmed non-blank lines consumed in groups of
/// three (teacher, course descriptor, room descriptor)
fn decode_class_cell(
    content: &str,
    day: &str,
    slot: &TimeSlot,
    row_idx: usize,
    opts: &TimetableOptions,
    diags: &mut Diagnostics,
    out: &mut Vec<ClassSession>,
) {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.len() % 3 != 0 {
        diags.push(
            DiagnosticKind::RaggedClassCell,
            Some(row_idx),
            Some(slot.slot),
            format!(
                "expected line count divisible by 3, got {} ({day}, slot {})",
                lines.len(),
                slot.slot
            ),
        );
        if opts.remainder_policy == RemainderPolicy::Reject {
            return;
        }
    }

    for group in lines.chunks_exact(3) {
        let teacher_initials = group[0];
        let (course_code, section) = decode_course_line(group[1]);
        let room = decode_room_line(group[2]);

        if course_code.is_empty() {
            diags.push(
                DiagnosticKind::MissingCourseCode,
                Some(row_idx),
                Some(slot.slot),
                format!("class group without course code ({day}, slot {})", slot.slot),
            );
            continue;
        }

        out.push(ClassSession {
            course_name: Some(course_code.clone()),
            course_code,
            teacher_initials: teacher_initials.to_string(),
            teacher_name: None,
            room,
            section,
            day: day.to_string(),
            slot: slot.slot,
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
        });
    }
}

/// Line 2 of a class group: `CSE101 (4th Sem. A Sec)` or a bare course code
fn decode_course_line(line: &str) -> (String, Option<char>) {
    match line.find('(') {
        Some(open) => {
            let code = line[..open].trim().to_string();
            let inside = line[open + 1..]
                .split(')')
                .next()
                .unwrap_or("");
            let section = section_re()
                .captures(inside)
                .and_then(|caps| caps[1].chars().next())
                .map(|c| c.to_ascii_uppercase());
            (code, section)
        }
        None => (line.trim().to_string(), None),
    }
}

/// Line 3 of a class group: a `Room:` label is preferred; otherwise all
/// non-alphanumeric characters are stripped and the remainder is the room
fn decode_room_line(line: &str) -> String {
    if let Some(caps) = room_re().captures(line) {
        return caps[1].to_string();
    }
    line.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Group classes into per-day schedules, days in order of first appearance,
/// keeping only days that produced at least one class
fn group_by_day(classes: Vec<ClassSession>) -> Vec<DaySchedule> {
    let mut schedule: Vec<DaySchedule> = Vec::new();

    for class in classes {
        match schedule.iter_mut().find(|d| d.day == class.day) {
            Some(day) => day.classes.push(class),
            None => schedule.push(DaySchedule {
                day: class.day.clone(),
                classes: vec![class],
            }),
        }
    }

    schedule
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn parse(rows: &[&[&str]]) -> (SemesterTimetable, Diagnostics) {
        let mut diags = Diagnostics::new();
        let t = parse_semester_timetable(
            &grid(rows),
            "4th",
            &TimetableOptions::default(),
            &mut diags,
        );
        (t, diags)
    }

    #[test]
    fn test_short_grid_yields_empty_timetable() {
        let (t, diags) = parse(&[&["Day", "Slot 1"]]);
        assert!(t.schedule.is_empty());
        assert!(t.time_slots.is_empty());
        assert_eq!(diags.count_of(DiagnosticKind::InsufficientRows), 1);
    }

    #[test]
    fn test_slot_header_with_12h_times() {
        let (t, _) = parse(&[
            &["Day", "Slot 1\n8:00 AM - 9:30 AM", "Slot 2\n12:00 PM - 1:15 PM"],
            &["Sunday", "-", "-"],
        ]);
        assert_eq!(t.time_slots.len(), 2);
        assert_eq!(t.time_slots[0].start_time, "08:00");
        assert_eq!(t.time_slots[0].end_time, "09:30");
        assert_eq!(t.time_slots[1].start_time, "12:00");
        assert_eq!(t.time_slots[1].end_time, "13:15");
    }

    #[test]
    fn test_midnight_normalization() {
        assert_eq!(
            parse_time_range("12:00 AM - 1:00 AM"),
            Some(("00:00".to_string(), "01:00".to_string()))
        );
    }

    #[test]
    fn test_unparseable_header_falls_back_to_defaults() {
        let (t, diags) = parse(&[
            &["Day", "Slot 1", "Slot 2"],
            &["Sunday", "-", "-"],
        ]);
        assert_eq!(t.time_slots.len(), 2);
        assert_eq!(t.time_slots[0].start_time, "09:00");
        assert_eq!(t.time_slots[0].end_time, "10:25");
        assert_eq!(diags.count_of(DiagnosticKind::SlotHeaderFallback), 2);
    }

    #[test]
    fn test_no_slot_headers_uses_default_table() {
        let (t, _) = parse(&[&["Day", "", ""], &["Sunday", "-", "-"]]);
        assert_eq!(t.time_slots, crate::models::default_time_slots());
    }

    #[test]
    fn test_slot_scan_stops_at_blank_after_first_slot() {
        let (t, _) = parse(&[
            &["Day", "8:00 - 9:30", "", "10:00 - 11:00"],
            &["Sunday", "-", "-", "-"],
        ]);
        assert_eq!(t.time_slots.len(), 1);
    }

    #[test]
    fn test_separator_column_does_not_truncate_slots() {
        let (t, _) = parse(&[
            &["Day", "8:00 - 9:30", "Break", "10:00 - 11:00"],
            &["Sunday", "MAH\nCSE101\nRoom: 1", "-", "JD\nCSE102\nRoom: 2"],
        ]);
        assert_eq!(t.time_slots.len(), 2);
        assert_eq!(t.time_slots[1].slot, 2);
        assert_eq!(t.time_slots[1].start_time, "10:00");

        // Sessions past the separator map to the right slot and times
        let classes = &t.schedule[0].classes;
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[1].course_code, "CSE102");
        assert_eq!(classes[1].slot, 2);
        assert_eq!(classes[1].start_time, "10:00");
        assert_eq!(classes[1].end_time, "11:00");
    }

    #[test]
    fn test_class_cell_micro_grammar() {
        let (t, _) = parse(&[
            &["Day", "8:00 AM - 9:30 AM"],
            &["Sunday", "MAH\nCSE101 (4th Sem. A Sec)\nRoom: 311"],
        ]);
        assert_eq!(t.schedule.len(), 1);
        let class = &t.schedule[0].classes[0];
        assert_eq!(class.teacher_initials, "MAH");
        assert_eq!(class.course_code, "CSE101");
        assert_eq!(class.section, Some('A'));
        assert_eq!(class.room, "311");
        assert_eq!(class.day, "Sunday");
        assert_eq!(class.slot, 1);
        assert_eq!(class.start_time, "08:00");
        assert_eq!(class.end_time, "09:30");
        assert_eq!(class.teacher_name, None);
    }

    #[test]
    fn test_two_groups_in_one_cell() {
        let cell = "MAH\nCSE101 (4th Sem. A Sec)\nRoom: 311\nJD\nCSE102 (4th Sem. B Sec)\nRoom: 214";
        let (t, _) = parse(&[&["Day", "8:00 - 9:30"], &["Sunday", cell]]);
        assert_eq!(t.schedule[0].classes.len(), 2);
        assert_eq!(t.schedule[0].classes[1].course_code, "CSE102");
        assert_eq!(t.schedule[0].classes[1].section, Some('B'));
    }

    #[test]
    fn test_ragged_cell_discards_remainder() {
        let cell = "MAH\nCSE101\nRoom: 311\nJD\nCSE102";
        let (t, diags) = parse(&[&["Day", "8:00 - 9:30"], &["Sunday", cell]]);
        assert_eq!(t.schedule[0].classes.len(), 1);
        assert_eq!(diags.count_of(DiagnosticKind::RaggedClassCell), 1);
    }

    #[test]
    fn test_ragged_cell_reject_policy_drops_cell() {
        let cell = "MAH\nCSE101\nRoom: 311\nJD\nCSE102";
        let mut diags = Diagnostics::new();
        let opts = TimetableOptions {
            remainder_policy: RemainderPolicy::Reject,
        };
        let t = parse_semester_timetable(
            &grid(&[&["Day", "8:00 - 9:30"], &["Sunday", cell]]),
            "4th",
            &opts,
            &mut diags,
        );
        assert!(t.schedule.is_empty());
    }

    #[test]
    fn test_missing_course_code_drops_group() {
        let cell = "MAH\n(4th Sem. A Sec)\nRoom: 311";
        let (t, diags) = parse(&[&["Day", "8:00 - 9:30"], &["Sunday", cell]]);
        assert!(t.schedule.is_empty());
        assert_eq!(diags.count_of(DiagnosticKind::MissingCourseCode), 1);
    }

    #[test]
    fn test_day_carry_forward_across_merged_rows() {
        let (t, _) = parse(&[
            &["Day", "8:00 - 9:30"],
            &["Sunday", "MAH\nCSE101\nRoom: 311"],
            &["", "JD\nCSE102\nRoom: 214"],
            &["Monday", "MA\nCSE201\nRoom: 101"],
        ]);
        assert_eq!(t.schedule.len(), 2);
        assert_eq!(t.schedule[0].day, "Sunday");
        assert_eq!(t.schedule[0].classes.len(), 2);
        assert_eq!(t.schedule[1].day, "Monday");
    }

    #[test]
    fn test_rows_before_first_day_label_skipped() {
        let (t, _) = parse(&[
            &["Day", "8:00 - 9:30"],
            &["", "MAH\nCSE101\nRoom: 311"],
            &["Sunday", "JD\nCSE102\nRoom: 214"],
        ]);
        assert_eq!(t.schedule.len(), 1);
        assert_eq!(t.schedule[0].classes.len(), 1);
        assert_eq!(t.schedule[0].classes[0].course_code, "CSE102");
    }

    #[test]
    fn test_bare_course_line_and_bare_room() {
        let (t, _) = parse(&[
            &["Day", "8:00 - 9:30"],
            &["Sunday", "MAH\nCSE303\n311-B"],
        ]);
        let class = &t.schedule[0].classes[0];
        assert_eq!(class.course_code, "CSE303");
        assert_eq!(class.section, None);
        assert_eq!(class.room, "311B");
    }

    #[test]
    fn test_dash_and_blank_cells_mean_no_class() {
        let (t, _) = parse(&[
            &["Day", "8:00 - 9:30", "9:30 - 11:00"],
            &["Sunday", "-", ""],
        ]);
        assert!(t.schedule.is_empty());
    }

    #[test]
    fn test_session_slots_reference_emitted_slots() {
        let (t, _) = parse(&[
            &["Day", "8:00 - 9:30", "9:30 - 11:00"],
            &["Sunday", "MAH\nCSE101\nRoom: 1", "JD\nCSE102\nRoom: 2"],
        ]);
        let ordinals: Vec<u32> = t.time_slots.iter().map(|s| s.slot).collect();
        for day in &t.schedule {
            for class in &day.classes {
                assert!(ordinals.contains(&class.slot));
            }
        }
    }
}
