//! End-to-end parsing tests: raw CSV export text through the grid scanner
//! and the extractors, the way the orchestrator drives them.

use classroutine::parser::{
    parse_csv, parse_semester_timetable, parse_teachers, Diagnostics, ScanOptions,
    TimetableOptions,
};

/// A realistic CSV export of a semester sheet: quoted multi-line class
/// cells, a merged day column, CRLF line endings between records.
const SEMESTER_CSV: &str = concat!(
    "\"Day\",\"Slot 1\n8:00 AM - 9:30 AM\",\"Slot 2\n9:30 AM - 11:00 AM\"\r\n",
    "\"Sunday\",\"MAH\nCSE101 (4th Sem. A Sec)\nRoom: 311\",\"-\"\r\n",
    "\"\",\"JD\nCSE103 (4th Sem. B Sec)\nRoom: 214\",\"MAH\nCSE105\nRoom: 101\"\r\n",
    "\"Monday\",\"-\",\"JD\nCSE107 (4th Sem. A Sec)\nRoom: 311\"\r\n",
);

#[test]
fn test_semester_sheet_from_csv_export() {
    let grid = parse_csv(SEMESTER_CSV);
    assert_eq!(grid.len(), 4);
    // Embedded newlines survived quoting
    assert!(grid[0][1].contains('\n'));

    let mut diags = Diagnostics::new();
    let timetable =
        parse_semester_timetable(&grid, "4th", &TimetableOptions::default(), &mut diags);

    assert_eq!(timetable.semester, "4th");
    assert_eq!(timetable.time_slots.len(), 2);
    assert_eq!(timetable.time_slots[0].start_time, "08:00");
    assert_eq!(timetable.time_slots[1].end_time, "11:00");

    // Sunday picks up the merged continuation row, Monday follows
    assert_eq!(timetable.schedule.len(), 2);
    let sunday = &timetable.schedule[0];
    assert_eq!(sunday.day, "Sunday");
    assert_eq!(sunday.classes.len(), 3);

    let first = &sunday.classes[0];
    assert_eq!(first.course_code, "CSE101");
    assert_eq!(first.teacher_initials, "MAH");
    assert_eq!(first.section, Some('A'));
    assert_eq!(first.room, "311");
    assert_eq!(first.slot, 1);
    assert_eq!(first.start_time, "08:00");
    assert_eq!(first.end_time, "09:30");

    let monday = &timetable.schedule[1];
    assert_eq!(monday.classes.len(), 1);
    assert_eq!(monday.classes[0].slot, 2);

    assert!(diags.is_empty(), "clean sheet should parse without diagnostics");
}

#[test]
fn test_co_scheduled_classes_in_one_cell() {
    let csv = concat!(
        "Day,\"8:00 - 9:30\"\n",
        "Sunday,\"MAH\nCSE101 (4th Sem. A Sec)\nRoom: 311\nJD\nCSE101 (4th Sem. B Sec)\nRoom: 214\"\n",
    );
    let grid = parse_csv(csv);
    let mut diags = Diagnostics::new();
    let timetable =
        parse_semester_timetable(&grid, "4th", &TimetableOptions::default(), &mut diags);

    let classes = &timetable.schedule[0].classes;
    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0].section, Some('A'));
    assert_eq!(classes[1].section, Some('B'));
    // Parallel sections share the day and slot
    assert_eq!(classes[0].slot, classes[1].slot);
}

#[test]
fn test_directory_csv_with_quoted_commas() {
    let csv = concat!(
        "Initial,Name,Designation,Department,University,Contact,Email\n",
        "JD,\"Doe, Jane\",Professor,CSE,Example University,,jd@example.edu\n",
        "MAH,Mahmudul Hasan,Lecturer,CSE,Example University,01700000000,\n",
    );
    let grid = parse_csv(csv);
    let mut diags = Diagnostics::new();
    let teachers = parse_teachers(&grid, &ScanOptions::default(), &mut diags);

    assert_eq!(teachers.len(), 2);
    assert_eq!(teachers[0].name, "Doe, Jane");
    assert_eq!(teachers[0].contact, None);
    assert_eq!(teachers[0].email.as_deref(), Some("jd@example.edu"));
    assert_eq!(teachers[1].contact.as_deref(), Some("01700000000"));
    assert_eq!(teachers[1].email, None);
}

#[test]
fn test_empty_export_yields_empty_timetable() {
    let grid = parse_csv("");
    let mut diags = Diagnostics::new();
    let timetable =
        parse_semester_timetable(&grid, "9th", &TimetableOptions::default(), &mut diags);

    assert!(timetable.schedule.is_empty());
    assert!(timetable.time_slots.is_empty());
}
