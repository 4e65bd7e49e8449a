// Core data structures for the routine aggregator

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Faculty member parsed from the directory sheet
///
/// The `initial` short code is the join key used when enriching class
/// sessions with a display name. Records are rebuilt on every fetch; no
/// identity persists across snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Teacher {
    pub initial: String,
    pub name: String,
    pub designation: String,
    pub department: String,
    pub university: String,
    pub contact: Option<String>,
    pub email: Option<String>,
}

/// Lab listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Lab {
    pub short_name: String,
    pub full_name: String,
    pub room: Option<String>,
    pub in_charge: Option<String>,
    pub contact: Option<String>,
}

/// Routine committee member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CommitteeMember {
    pub initial: String,
    pub name: String,
    pub contact: Option<String>,
}

/// One period column of a semester timetable
///
/// `slot` ordinals are 1-based and contiguous within a timetable. Times are
/// 24-hour `HH:MM` strings as they appear in the snapshot serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub slot: u32,
    pub start_time: String,
    pub end_time: String,
}

impl TimeSlot {
    pub fn new(slot: u32, start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            slot,
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }
}

/// A single timetabled class
///
/// `teacher_name` is filled by the enrichment step, never by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClassSession {
    pub course_code: String,
    pub course_name: Option<String>,
    pub teacher_initials: String,
    pub teacher_name: Option<String>,
    pub room: String,
    pub section: Option<char>,
    pub day: String,
    pub slot: u32,
    pub start_time: String,
    pub end_time: String,
}

/// All classes of one weekday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day: String,
    pub classes: Vec<ClassSession>,
}

/// One semester's decoded timetable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterTimetable {
    pub semester: String,
    pub schedule: Vec<DaySchedule>,
    pub time_slots: Vec<TimeSlot>,
}

impl SemesterTimetable {
    /// Timetable for an unpublished or empty sheet: no slots, no schedule
    pub fn empty(semester: impl Into<String>) -> Self {
        Self {
            semester: semester.into(),
            schedule: Vec::new(),
            time_slots: Vec::new(),
        }
    }

    /// Placeholder substituted when a semester fetch fails: default slot
    /// table, every operating day present with no classes
    pub fn placeholder(semester: impl Into<String>) -> Self {
        Self {
            semester: semester.into(),
            schedule: DAYS
                .iter()
                .map(|day| DaySchedule {
                    day: (*day).to_string(),
                    classes: Vec::new(),
                })
                .collect(),
            time_slots: default_time_slots(),
        }
    }

    /// Total number of classes across all days
    pub fn class_count(&self) -> usize {
        self.schedule.iter().map(|d| d.classes.len()).sum()
    }
}

/// The aggregate snapshot: unit of caching, persistence and fallback
///
/// Always produced and consumed whole. `semesters` holds one entry per
/// configured semester label, present even when the sheet was empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineData {
    pub teachers: Vec<Teacher>,
    pub labs: Vec<Lab>,
    pub committee: Vec<CommitteeMember>,
    pub semesters: BTreeMap<String, SemesterTimetable>,
    pub last_updated: DateTime<Utc>,
}

impl RoutineData {
    /// Create an empty snapshot stamped now
    pub fn new_with_timestamp() -> Self {
        Self {
            teachers: Vec::new(),
            labs: Vec::new(),
            committee: Vec::new(),
            semesters: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }

    /// Iterate over every class session in the snapshot
    pub fn all_sessions(&self) -> impl Iterator<Item = &ClassSession> {
        self.semesters
            .values()
            .flat_map(|t| t.schedule.iter())
            .flat_map(|d| d.classes.iter())
    }
}

/// Semester labels, in academic order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Semester {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
    Eighth,
    Ninth,
}

impl Semester {
    /// Sheet tab label, e.g. "4th"
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "1st",
            Self::Second => "2nd",
            Self::Third => "3rd",
            Self::Fourth => "4th",
            Self::Fifth => "5th",
            Self::Sixth => "6th",
            Self::Seventh => "7th",
            Self::Eighth => "8th",
            Self::Ninth => "9th",
        }
    }

    /// Parse from a sheet tab label
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1st" | "1" | "first" => Some(Self::First),
            "2nd" | "2" | "second" => Some(Self::Second),
            "3rd" | "3" | "third" => Some(Self::Third),
            "4th" | "4" | "fourth" => Some(Self::Fourth),
            "5th" | "5" | "fifth" => Some(Self::Fifth),
            "6th" | "6" | "sixth" => Some(Self::Sixth),
            "7th" | "7" | "seventh" => Some(Self::Seventh),
            "8th" | "8" | "eighth" => Some(Self::Eighth),
            "9th" | "9" | "ninth" => Some(Self::Ninth),
            _ => None,
        }
    }

    /// All nine configured semesters
    pub fn all() -> Vec<Self> {
        vec![
            Self::First,
            Self::Second,
            Self::Third,
            Self::Fourth,
            Self::Fifth,
            Self::Sixth,
            Self::Seventh,
            Self::Eighth,
            Self::Ninth,
        ]
    }
}

impl std::fmt::Display for Semester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operating weekdays, Sunday through Thursday
pub const DAYS: [&str; 5] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday"];

/// Fallback slot table used when a sheet carries no parseable time headers
pub fn default_time_slots() -> Vec<TimeSlot> {
    vec![
        TimeSlot::new(1, "09:00", "10:25"),
        TimeSlot::new(2, "10:25", "11:50"),
        TimeSlot::new(3, "11:50", "13:15"),
        TimeSlot::new(4, "13:15", "15:10"),
        TimeSlot::new(5, "15:10", "16:35"),
        TimeSlot::new(6, "16:35", "18:00"),
    ]
}

/// Find the next upcoming class relative to `now`
///
/// Looks at the remaining classes of the current day first, then scans the
/// following days of the week in order. Returns `None` when the week holds
/// no further classes.
pub fn next_class<'a>(
    sessions: &'a [ClassSession],
    now: DateTime<Utc>,
) -> Option<&'a ClassSession> {
    use chrono::{Datelike, Timelike};

    const WEEK: [&str; 7] = [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ];

    let day_index = now.weekday().num_days_from_sunday() as usize;
    let now_minutes = now.hour() * 60 + now.minute();

    let start_minutes = |s: &ClassSession| -> Option<u32> {
        let t = NaiveTime::parse_from_str(&s.start_time, "%H:%M").ok()?;
        Some(t.hour() * 60 + t.minute())
    };

    let mut today: Vec<&ClassSession> = sessions
        .iter()
        .filter(|s| s.day == WEEK[day_index])
        .filter(|s| start_minutes(s).is_some_and(|m| m > now_minutes))
        .collect();
    today.sort_by_key(|s| start_minutes(s).unwrap_or(u32::MAX));
    if let Some(first) = today.first() {
        return Some(first);
    }

    for day in &WEEK[day_index + 1..] {
        let mut upcoming: Vec<&ClassSession> =
            sessions.iter().filter(|s| s.day == *day).collect();
        if !upcoming.is_empty() {
            upcoming.sort_by_key(|s| start_minutes(s));
            return upcoming.into_iter().next();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(day: &str, start: &str, code: &str) -> ClassSession {
        ClassSession {
            course_code: code.to_string(),
            teacher_initials: "XY".to_string(),
            day: day.to_string(),
            slot: 1,
            start_time: start.to_string(),
            end_time: "23:59".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_semester_labels() {
        assert_eq!(Semester::Fourth.as_str(), "4th");
        assert_eq!(Semester::parse("4th"), Some(Semester::Fourth));
        assert_eq!(Semester::parse("FOURTH"), Some(Semester::Fourth));
        assert_eq!(Semester::parse("10th"), None);
        assert_eq!(Semester::all().len(), 9);
    }

    #[test]
    fn test_placeholder_timetable_shape() {
        let t = SemesterTimetable::placeholder("3rd");
        assert_eq!(t.schedule.len(), DAYS.len());
        assert!(t.schedule.iter().all(|d| d.classes.is_empty()));
        assert_eq!(t.time_slots, default_time_slots());
        assert_eq!(t.class_count(), 0);
    }

    #[test]
    fn test_empty_timetable_has_no_slots() {
        let t = SemesterTimetable::empty("2nd");
        assert!(t.schedule.is_empty());
        assert!(t.time_slots.is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_timestamp() {
        let mut data = RoutineData::new_with_timestamp();
        data.teachers.push(Teacher {
            initial: "JD".to_string(),
            name: "Jane Doe".to_string(),
            ..Default::default()
        });

        let json = serde_json::to_string(&data).unwrap();
        let restored: RoutineData = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.last_updated, data.last_updated);
        assert_eq!(restored.teachers.len(), 1);
    }

    #[test]
    fn test_next_class_prefers_later_today() {
        // 2026-08-23 is a Sunday
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 0).unwrap();
        let sessions = vec![
            session("Sunday", "09:00", "EARLY"),
            session("Sunday", "11:50", "LATE"),
            session("Monday", "09:00", "TOMORROW"),
        ];
        let next = next_class(&sessions, now).unwrap();
        assert_eq!(next.course_code, "LATE");
    }

    #[test]
    fn test_next_class_rolls_to_next_day() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 20, 0, 0).unwrap();
        let sessions = vec![
            session("Sunday", "09:00", "GONE"),
            session("Tuesday", "13:15", "NEXT"),
        ];
        let next = next_class(&sessions, now).unwrap();
        assert_eq!(next.course_code, "NEXT");
    }

    #[test]
    fn test_next_class_empty_week() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 10, 0, 0).unwrap();
        assert!(next_class(&[], now).is_none());
    }
}
