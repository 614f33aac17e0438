use super::weekly::resolve_week;
use crate::roster::Student;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LessonCategory {
    Absent,
    Hw,
    Quiz,
}

impl LessonCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "absent" => Some(LessonCategory::Absent),
            "hw" => Some(LessonCategory::Hw),
            "quiz" => Some(LessonCategory::Quiz),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDetail {
    pub student_id: String,
    pub student_name: String,
    pub category: LessonCategory,
    pub week_number: Option<u32>,
    pub attended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attendance_center: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hw_done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_degree: Option<String>,
    pub comment: Option<String>,
}

/// Resolves the "open lesson detail" event for one row of a result table.
pub fn lesson_detail(
    student: &Student,
    week_number: Option<u32>,
    category: LessonCategory,
) -> LessonDetail {
    let snap = resolve_week(student, week_number);
    let mut detail = LessonDetail {
        student_id: student.id.clone(),
        student_name: student.name.clone(),
        category,
        week_number: snap.current_week_number,
        attended: snap.attended,
        last_attendance_center: None,
        hw_done: None,
        quiz_degree: None,
        comment: snap.comment,
    };
    match category {
        LessonCategory::Absent => detail.last_attendance_center = snap.last_attendance_center,
        LessonCategory::Hw => detail.hw_done = Some(snap.hw_done),
        LessonCategory::Quiz => detail.quiz_degree = snap.quiz_degree,
    }
    detail
}
