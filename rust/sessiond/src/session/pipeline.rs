use super::classify::{in_bucket, Bucket, Criteria};
use super::weekly::{resolve_week, WeekSnapshot};
use crate::roster::Student;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekChoice {
    AllWeeks,
    Week(u32),
}

impl WeekChoice {
    pub fn week_number(self) -> Option<u32> {
        match self {
            WeekChoice::AllWeeks => None,
            WeekChoice::Week(n) => Some(n),
        }
    }

    /// Persisted form: "all" or the week number.
    pub fn to_pref(self) -> String {
        match self {
            WeekChoice::AllWeeks => "all".to_string(),
            WeekChoice::Week(n) => n.to_string(),
        }
    }

    pub fn from_pref(raw: &str) -> Option<Self> {
        let t = raw.trim();
        if t.eq_ignore_ascii_case("all") {
            return Some(WeekChoice::AllWeeks);
        }
        match t.parse::<u32>() {
            Ok(n) if n >= 1 => Some(WeekChoice::Week(n)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub grade: Option<String>,
    pub center: Option<String>,
    pub week: Option<WeekChoice>,
}

impl Selection {
    /// Present only when grade, center and week are all chosen.
    pub fn criteria(&self) -> Option<Criteria<'_>> {
        let grade = self.grade.as_deref().filter(|g| !g.trim().is_empty())?;
        let center = self.center.as_deref().filter(|c| !c.trim().is_empty())?;
        let week = self.week?;
        Some(Criteria {
            grade,
            center,
            week: week.week_number(),
        })
    }

    pub fn all_filters_selected(&self) -> bool {
        self.criteria().is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedStudent<'a> {
    pub student: &'a Student,
    pub display_snapshot: WeekSnapshot,
    pub bucket: Bucket,
}

#[derive(Debug, Clone, Default)]
pub struct Classified<'a> {
    pub attended: Vec<ClassifiedStudent<'a>>,
    pub absent: Vec<ClassifiedStudent<'a>>,
    pub attended_elsewhere: Vec<ClassifiedStudent<'a>>,
}

impl<'a> Classified<'a> {
    pub fn bucket(&self, bucket: Bucket) -> &[ClassifiedStudent<'a>] {
        match bucket {
            Bucket::MainCenterAttended => &self.attended,
            Bucket::Absent => &self.absent,
            Bucket::AttendedElsewhere => &self.attended_elsewhere,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<ClassifiedStudent<'a>> {
        match bucket {
            Bucket::MainCenterAttended => &mut self.attended,
            Bucket::Absent => &mut self.absent,
            Bucket::AttendedElsewhere => &mut self.attended_elsewhere,
        }
    }
}

pub fn active_students(roster: &[Student]) -> impl Iterator<Item = &Student> {
    roster.iter().filter(|s| s.is_active())
}

/// Classifies the active part of `roster` into the three buckets.
///
/// Every bucket is empty until the selection is complete. Each bucket is an
/// independent scan, so a student may land in none of them.
pub fn classify_roster<'a>(roster: &'a [Student], selection: &Selection) -> Classified<'a> {
    let mut out = Classified::default();
    let Some(criteria) = selection.criteria() else {
        return out;
    };
    for bucket in Bucket::ALL {
        let items = active_students(roster)
            .filter(|s| in_bucket(s, bucket, &criteria))
            .map(|s| ClassifiedStudent {
                student: s,
                display_snapshot: resolve_week(s, criteria.week),
                bucket,
            });
        out.bucket_mut(bucket).extend(items);
    }
    out
}
