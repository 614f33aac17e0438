use crate::roster::{Student, WeekRecord};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Bucket {
    MainCenterAttended,
    Absent,
    AttendedElsewhere,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [
        Bucket::MainCenterAttended,
        Bucket::Absent,
        Bucket::AttendedElsewhere,
    ];
}

/// A fully chosen grade/center/week filter. `week: None` aggregates all weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Criteria<'a> {
    pub grade: &'a str,
    pub center: &'a str,
    pub week: Option<u32>,
}

/// Drops only the first period, so "1st." and "1st" match but "1.st." stays "1st.".
fn normalize_grade(g: &str) -> String {
    g.to_lowercase().replacen('.', "", 1)
}

/// Grades compare case-insensitively with one period ignored ("1st." == "1ST").
pub fn grade_matches(a: &str, b: &str) -> bool {
    normalize_grade(a) == normalize_grade(b)
}

pub fn center_matches(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn center_opt_matches(a: Option<&str>, b: &str) -> bool {
    a.map(|a| center_matches(a, b)).unwrap_or(false)
}

fn attended_at(w: &WeekRecord, center: &str) -> bool {
    w.attended && center_opt_matches(w.last_attendance_center.as_deref(), center)
}

/// Attended at the selected center, whatever the student's main center is.
pub fn attended_at_center(student: &Student, c: &Criteria<'_>) -> bool {
    match c.week {
        Some(week) => student
            .week(week)
            .map(|w| attended_at(w, c.center))
            .unwrap_or(false),
        None => student.recorded_weeks().any(|w| attended_at(w, c.center)),
    }
}

pub fn is_main_center_attended(student: &Student, c: &Criteria<'_>) -> bool {
    grade_matches(&student.grade, c.grade) && attended_at_center(student, c)
}

pub fn is_absent(student: &Student, c: &Criteria<'_>) -> bool {
    if !grade_matches(&student.grade, c.grade) || !center_matches(&student.main_center, c.center) {
        return false;
    }
    match c.week {
        Some(week) => student.week(week).map(|w| !w.attended).unwrap_or(true),
        None => !student.recorded_weeks().any(|w| w.attended),
    }
}

/// Only defined for a specific week; aggregate mode never yields this bucket.
pub fn is_attended_elsewhere(student: &Student, c: &Criteria<'_>) -> bool {
    let Some(week) = c.week else {
        return false;
    };
    if !grade_matches(&student.grade, c.grade) || !center_matches(&student.main_center, c.center) {
        return false;
    }
    student
        .week(week)
        .map(|w| w.attended && !center_opt_matches(w.last_attendance_center.as_deref(), c.center))
        .unwrap_or(false)
}

pub fn in_bucket(student: &Student, bucket: Bucket, c: &Criteria<'_>) -> bool {
    match bucket {
        Bucket::MainCenterAttended => is_main_center_attended(student, c),
        Bucket::Absent => is_absent(student, c),
        Bucket::AttendedElsewhere => is_attended_elsewhere(student, c),
    }
}
