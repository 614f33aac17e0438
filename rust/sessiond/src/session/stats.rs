use super::classify::{attended_at_center, center_matches, grade_matches, Criteria};
use super::pipeline::{active_students, Classified};
use crate::roster::Student;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Attended at the selected center, enrolled there.
    pub mc: usize,
    /// Attended at the selected center, enrolled elsewhere.
    pub nmc: usize,
    pub main_center_total: usize,
    pub total_attended: usize,
    pub absent_count: usize,
    pub attended_elsewhere_count: usize,
    pub main_center_percent: i64,
    pub absent_percent: i64,
}

/// `round(x / denom * 100)`, or 0 when there is nothing to divide by.
pub fn percentage(x: usize, denom: usize) -> i64 {
    if denom == 0 {
        return 0;
    }
    ((x as f64 / denom as f64) * 100.0).round() as i64
}

pub fn aggregate(
    roster: &[Student],
    criteria: Option<&Criteria<'_>>,
    classified: &Classified<'_>,
) -> SessionStats {
    let Some(c) = criteria else {
        return SessionStats::default();
    };

    let mut stats = SessionStats::default();
    for s in active_students(roster) {
        if !grade_matches(&s.grade, c.grade) {
            continue;
        }
        let enrolled_here = center_matches(&s.main_center, c.center);
        if enrolled_here {
            stats.main_center_total += 1;
        }
        if attended_at_center(s, c) {
            if enrolled_here {
                stats.mc += 1;
            } else {
                stats.nmc += 1;
            }
        }
    }
    stats.total_attended = stats.mc + stats.nmc;
    stats.absent_count = classified.absent.len();
    stats.attended_elsewhere_count = classified.attended_elsewhere.len();
    stats.main_center_percent = percentage(stats.mc, stats.main_center_total);
    stats.absent_percent = percentage(stats.absent_count, stats.main_center_total);
    stats
}
