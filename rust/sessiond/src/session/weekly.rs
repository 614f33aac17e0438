use crate::roster::{Student, WeekRecord};
use serde::Serialize;

/// The attendance view of one student for one week, or for all weeks at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSnapshot {
    pub attended: bool,
    pub last_attendance_center: Option<String>,
    pub hw_done: bool,
    pub quiz_degree: Option<String>,
    pub comment: Option<String>,
    #[serde(rename = "message_state")]
    pub message_state: bool,
    /// `None` in aggregate mode.
    pub current_week_number: Option<u32>,
}

impl WeekSnapshot {
    fn from_record(record: &WeekRecord, week_number: Option<u32>) -> Self {
        Self {
            attended: record.attended,
            last_attendance_center: record.last_attendance_center.clone(),
            hw_done: record.hw_done,
            quiz_degree: record.quiz_degree.clone(),
            comment: record.comment.clone(),
            message_state: record.message_state,
            current_week_number: week_number,
        }
    }

    fn missing(week_number: u32) -> Self {
        Self {
            current_week_number: Some(week_number),
            ..Self::default()
        }
    }
}

/// Resolves `student`'s snapshot for `week_number`.
///
/// With a week number the record at `weeks[week - 1]` is returned verbatim, or a
/// "not attended, no center" snapshot is synthesized when there is none. Without
/// one, `attended` is true iff any recorded week was attended; the remaining
/// display fields come from the latest recorded week and no center is reported.
pub fn resolve_week(student: &Student, week_number: Option<u32>) -> WeekSnapshot {
    match week_number {
        Some(week) => match student.week(week) {
            Some(record) => WeekSnapshot::from_record(record, Some(week)),
            None => WeekSnapshot::missing(week),
        },
        None => {
            let attended = student.recorded_weeks().any(|w| w.attended);
            let mut snap = student
                .recorded_weeks()
                .last()
                .map(|latest| WeekSnapshot::from_record(latest, None))
                .unwrap_or_default();
            snap.attended = attended;
            snap.last_attendance_center = None;
            snap
        }
    }
}
