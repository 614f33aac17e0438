use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

/// Accepts an explicit `null` wherever a missing key would be accepted.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccountState {
    #[default]
    Active,
    Deactivated,
}

impl AccountState {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountState::Active => "Active",
            AccountState::Deactivated => "Deactivated",
        }
    }

    /// Anything other than an explicit "Deactivated" counts as active.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("deactivated") {
            AccountState::Deactivated
        } else {
            AccountState::Active
        }
    }
}

/// One week's attendance entry as recorded by the center.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeekRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub attended: bool,
    pub last_attendance_center: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub hw_done: bool,
    pub quiz_degree: Option<String>,
    pub comment: Option<String>,
    #[serde(rename = "message_state", deserialize_with = "null_as_default")]
    pub message_state: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub grade: String,
    #[serde(default, rename = "main_center", deserialize_with = "null_as_default")]
    pub main_center: String,
    #[serde(default, rename = "account_state", deserialize_with = "null_as_default")]
    pub account_state: AccountState,
    /// Indexed by week number minus one. `None` marks a week with no record.
    #[serde(default, deserialize_with = "null_as_default")]
    pub weeks: Vec<Option<WeekRecord>>,
}

impl Student {
    pub fn is_active(&self) -> bool {
        self.account_state != AccountState::Deactivated
    }

    pub fn week(&self, week_number: u32) -> Option<&WeekRecord> {
        let idx = (week_number as usize).checked_sub(1)?;
        self.weeks.get(idx).and_then(|w| w.as_ref())
    }

    pub fn recorded_weeks(&self) -> impl Iterator<Item = &WeekRecord> {
        self.weeks.iter().flatten()
    }
}

/// Supplies one coherent roster snapshot per call.
pub trait RosterSource {
    fn all_students(&self) -> anyhow::Result<Vec<Student>>;
}

pub struct SqliteRoster<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteRoster<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl RosterSource for SqliteRoster<'_> {
    fn all_students(&self) -> anyhow::Result<Vec<Student>> {
        load_students(self.conn)
    }
}

fn load_students(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, grade, main_center, account_state
         FROM students
         ORDER BY sort_order",
    )?;
    let mut students = stmt
        .query_map([], |r| {
            Ok(Student {
                id: r.get(0)?,
                name: r.get(1)?,
                grade: r.get(2)?,
                main_center: r.get(3)?,
                account_state: AccountState::parse(&r.get::<_, String>(4)?),
                weeks: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut by_id: HashMap<String, usize> = HashMap::new();
    for (idx, s) in students.iter().enumerate() {
        by_id.insert(s.id.clone(), idx);
    }

    let mut stmt = conn.prepare(
        "SELECT student_id, week_number, attended, last_attendance_center,
                hw_done, quiz_degree, comment, message_state
         FROM student_weeks
         ORDER BY student_id, week_number",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, i64>(1)?,
                WeekRecord {
                    attended: r.get::<_, i64>(2)? != 0,
                    last_attendance_center: r.get(3)?,
                    hw_done: r.get::<_, i64>(4)? != 0,
                    quiz_degree: r.get(5)?,
                    comment: r.get(6)?,
                    message_state: r.get::<_, i64>(7)? != 0,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (student_id, week_number, record) in rows {
        let Some(&idx) = by_id.get(&student_id) else {
            continue;
        };
        if week_number < 1 {
            continue;
        }
        let slot = (week_number - 1) as usize;
        let weeks = &mut students[idx].weeks;
        if weeks.len() <= slot {
            weeks.resize(slot + 1, None);
        }
        weeks[slot] = Some(record);
    }
    Ok(students)
}

pub fn find_student(conn: &Connection, student_id: &str) -> anyhow::Result<Option<Student>> {
    let exists = conn
        .query_row("SELECT 1 FROM students WHERE id = ?", [student_id], |r| {
            r.get::<_, i64>(0)
        })
        .optional()?
        .is_some();
    if !exists {
        return Ok(None);
    }
    Ok(load_students(conn)?
        .into_iter()
        .find(|s| s.id == student_id))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub students: usize,
    pub weeks: usize,
    pub generated_ids: usize,
}

/// First non-blank id that occurs more than once, compared after trimming.
pub fn duplicate_id(students: &[Student]) -> Option<&str> {
    let mut seen = HashSet::new();
    students
        .iter()
        .map(|s| s.id.trim())
        .filter(|id| !id.is_empty())
        .find(|id| !seen.insert(*id))
}

/// Replaces the stored roster with `students` in a single transaction.
/// A snapshot with a repeated id is refused and leaves the stored roster as is.
pub fn replace_roster(
    conn: &Connection,
    students: &[Student],
) -> anyhow::Result<ImportSummary> {
    if let Some(id) = duplicate_id(students) {
        anyhow::bail!("duplicate student id: {}", id);
    }
    let imported_at = chrono::Utc::now().to_rfc3339();
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM student_weeks", [])?;
    tx.execute("DELETE FROM students", [])?;

    let mut summary = ImportSummary::default();
    for (sort_order, student) in students.iter().enumerate() {
        let id = if student.id.trim().is_empty() {
            summary.generated_ids += 1;
            uuid::Uuid::new_v4().to_string()
        } else {
            student.id.trim().to_string()
        };
        tx.execute(
            "INSERT INTO students(id, name, grade, main_center, account_state, sort_order, imported_at)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &id,
                &student.name,
                &student.grade,
                &student.main_center,
                student.account_state.as_str(),
                sort_order as i64,
                &imported_at,
            ),
        )?;
        summary.students += 1;

        for (idx, week) in student.weeks.iter().enumerate() {
            let Some(w) = week else { continue };
            tx.execute(
                "INSERT INTO student_weeks(student_id, week_number, attended, last_attendance_center,
                                           hw_done, quiz_degree, comment, message_state)
                 VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    &id,
                    (idx + 1) as i64,
                    w.attended as i64,
                    &w.last_attendance_center,
                    w.hw_done as i64,
                    &w.quiz_degree,
                    &w.comment,
                    w.message_state as i64,
                ),
            )?;
            summary.weeks += 1;
        }
    }
    tx.commit()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn student_parses_sparse_weeks_and_missing_fields() {
        let raw = json!({
            "id": "s1",
            "name": "Mona",
            "grade": "1st.",
            "main_center": "Nasr City Center",
            "weeks": [
                { "attended": true, "lastAttendanceCenter": "Nasr City Center" },
                null,
                { "hwDone": true, "quizDegree": "8/10", "message_state": true }
            ]
        });
        let s: Student = serde_json::from_value(raw).expect("parse student");
        assert_eq!(s.account_state, AccountState::Active);
        assert_eq!(s.weeks.len(), 3);
        assert!(s.week(1).map(|w| w.attended).unwrap_or(false));
        assert!(s.week(2).is_none());
        let w3 = s.week(3).expect("week 3");
        assert!(!w3.attended);
        assert!(w3.hw_done);
        assert!(w3.message_state);
        assert_eq!(w3.quiz_degree.as_deref(), Some("8/10"));
        assert!(s.week(0).is_none());
        assert!(s.week(4).is_none());
    }

    #[test]
    fn explicit_nulls_degrade_to_defaults() {
        let raw = json!({
            "id": "s2",
            "name": null,
            "grade": "2nd",
            "main_center": null,
            "account_state": null,
            "weeks": [
                {
                    "attended": true,
                    "lastAttendanceCenter": null,
                    "hwDone": null,
                    "quizDegree": null,
                    "comment": null,
                    "message_state": null
                },
                { "attended": null }
            ]
        });
        let s: Student = serde_json::from_value(raw).expect("parse student with nulls");
        assert_eq!(s.name, "");
        assert_eq!(s.main_center, "");
        assert_eq!(s.account_state, AccountState::Active);
        let w1 = s.week(1).expect("week 1");
        assert!(w1.attended);
        assert!(!w1.hw_done);
        assert!(!w1.message_state);
        assert!(!s.week(2).expect("week 2").attended);

        let no_weeks: Student =
            serde_json::from_value(json!({ "id": "s3", "weeks": null })).expect("null weeks");
        assert!(no_weeks.weeks.is_empty());
    }

    #[test]
    fn repeated_ids_are_refused_without_touching_the_stored_roster() {
        let conn = Connection::open_in_memory().expect("open");
        crate::db::create_schema(&conn).expect("schema");
        let first = Student {
            id: "d".into(),
            name: "A".into(),
            weeks: vec![
                None,
                None,
                Some(WeekRecord {
                    attended: true,
                    ..WeekRecord::default()
                }),
            ],
            ..Student::default()
        };
        replace_roster(&conn, std::slice::from_ref(&first)).expect("seed");

        let second = Student {
            id: " d ".into(),
            name: "B".into(),
            ..Student::default()
        };
        let batch = vec![first.clone(), second];
        assert_eq!(duplicate_id(&batch), Some("d"));
        assert!(replace_roster(&conn, &batch).is_err());

        let loaded = SqliteRoster::new(&conn).all_students().expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "A");
        assert!(loaded[0].week(3).map(|w| w.attended).unwrap_or(false));

        let blanks = vec![Student::default(), Student::default()];
        assert_eq!(duplicate_id(&blanks), None);
    }

    #[test]
    fn account_state_parse_is_lenient() {
        assert_eq!(AccountState::parse("Deactivated"), AccountState::Deactivated);
        assert_eq!(AccountState::parse(" deactivated "), AccountState::Deactivated);
        assert_eq!(AccountState::parse("Active"), AccountState::Active);
        assert_eq!(AccountState::parse(""), AccountState::Active);
    }

    #[test]
    fn replace_roster_round_trips_through_sqlite() {
        let conn = Connection::open_in_memory().expect("open");
        crate::db::create_schema(&conn).expect("schema");
        let students = vec![
            Student {
                id: "a".into(),
                name: "A".into(),
                grade: "2nd".into(),
                main_center: "Rehab Center".into(),
                account_state: AccountState::Active,
                weeks: vec![
                    None,
                    Some(WeekRecord {
                        attended: true,
                        last_attendance_center: Some("Rehab Center".into()),
                        ..WeekRecord::default()
                    }),
                ],
            },
            Student {
                id: String::new(),
                name: "B".into(),
                grade: "2nd".into(),
                main_center: "Rehab Center".into(),
                account_state: AccountState::Deactivated,
                weeks: Vec::new(),
            },
        ];
        let summary = replace_roster(&conn, &students).expect("import");
        assert_eq!(summary.students, 2);
        assert_eq!(summary.weeks, 1);
        assert_eq!(summary.generated_ids, 1);

        let loaded = SqliteRoster::new(&conn).all_students().expect("load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].weeks.len(), 2);
        assert!(loaded[0].weeks[0].is_none());
        assert!(loaded[0].week(2).map(|w| w.attended).unwrap_or(false));
        assert_eq!(loaded[1].account_state, AccountState::Deactivated);
        assert!(!loaded[1].id.is_empty());

        let again = replace_roster(&conn, &students[..1]).expect("reimport");
        assert_eq!(again.students, 1);
        assert_eq!(SqliteRoster::new(&conn).all_students().expect("load").len(), 1);
    }
}
