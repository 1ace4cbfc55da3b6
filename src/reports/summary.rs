//! Pure aggregation over fetched report rows: global statistics,
//! per-session summaries and the top-10 ranking.

use crate::db::reports::{ResultDetail, SessionContext};
use crate::domain::models::ResultStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const TOP_PERFORMERS_LIMIT: usize = 10;
/// Grades are expressed out of 20, derived from the percentage.
pub const MAX_GRADE: f64 = 20.0;

#[derive(Debug, Serialize)]
pub struct PeriodicReport {
    pub total_sessions: usize,
    pub total_participants: usize,
    pub average_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    pub sessions: Vec<SessionSummary>,
    pub top_performers: Vec<TopPerformer>,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub title: String,
    pub quiz_title: String,
    pub teacher_name: String,
    pub participants: usize,
    pub average_score: f64,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct TopPerformer {
    pub student_name: String,
    pub class_name: Option<String>,
    pub session_title: String,
    pub score: f64,
    pub grade: f64,
}

/// Counts by status plus the published average, for the per-session report.
#[derive(Debug, Serialize)]
pub struct SessionStats {
    pub total_participants: usize,
    pub submitted: usize,
    pub graded: usize,
    pub published: usize,
    pub average_score: f64,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregate the completed sessions of one institution and their published
/// results into the periodic report payload.
pub fn build_periodic_report(
    sessions: &[SessionContext],
    results: &[ResultDetail],
) -> PeriodicReport {
    let percentages: Vec<f64> = results.iter().map(|r| r.percentage).collect();
    let average = if percentages.is_empty() {
        0.0
    } else {
        percentages.iter().sum::<f64>() / percentages.len() as f64
    };
    let highest = percentages.iter().copied().fold(f64::NAN, f64::max);
    let lowest = percentages.iter().copied().fold(f64::NAN, f64::min);

    let session_summaries = sessions
        .iter()
        .map(|session| {
            let scores: Vec<f64> = results
                .iter()
                .filter(|r| r.quiz_session_id == session.id)
                .map(|r| r.percentage)
                .collect();
            let avg = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            };
            SessionSummary {
                session_id: session.id,
                title: session.title.clone(),
                quiz_title: session.quiz_title.clone(),
                teacher_name: session.teacher_name.clone(),
                participants: scores.len(),
                average_score: round2(avg),
                completed_at: session.completed_at,
            }
        })
        .collect();

    let mut ranked: Vec<&ResultDetail> = results.iter().collect();
    ranked.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    let top_performers = ranked
        .into_iter()
        .take(TOP_PERFORMERS_LIMIT)
        .map(|r| TopPerformer {
            student_name: r.student_name.clone(),
            class_name: r.class_name.clone(),
            session_title: r.session_title.clone(),
            score: round2(r.percentage),
            grade: round2(r.grade),
        })
        .collect();

    PeriodicReport {
        total_sessions: sessions.len(),
        total_participants: results.len(),
        average_score: round2(if average.is_nan() { 0.0 } else { average }),
        highest_score: round2(if highest.is_nan() { 0.0 } else { highest }),
        lowest_score: round2(if lowest.is_nan() { 0.0 } else { lowest }),
        sessions: session_summaries,
        top_performers,
    }
}

/// Status breakdown over every result of one session. The average only
/// counts published rows.
pub fn build_session_stats(results: &[ResultDetail]) -> SessionStats {
    let published: Vec<&ResultDetail> = results
        .iter()
        .filter(|r| r.status == ResultStatus::Published)
        .collect();
    let average = if published.is_empty() {
        0.0
    } else {
        published.iter().map(|r| r.percentage).sum::<f64>() / published.len() as f64
    };

    SessionStats {
        total_participants: results.len(),
        submitted: results
            .iter()
            .filter(|r| r.status == ResultStatus::Submitted)
            .count(),
        graded: results
            .iter()
            .filter(|r| r.status == ResultStatus::Graded)
            .count(),
        published: published.len(),
        average_score: round2(average),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(id: Uuid, title: &str) -> SessionContext {
        SessionContext {
            id,
            title: title.into(),
            quiz_title: format!("{title} quiz"),
            teacher_name: "T. Mensah".into(),
            institution_id: Some(Uuid::new_v4()),
            institution_name: Some("ESG Institute".into()),
            starts_at: Utc.with_ymd_and_hms(2025, 10, 6, 8, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 10, 6, 10, 0, 0).unwrap(),
            completed_at: Some(Utc.with_ymd_and_hms(2025, 10, 6, 10, 5, 0).unwrap()),
        }
    }

    fn result(session_id: Uuid, name: &str, pct: f64, status: ResultStatus) -> ResultDetail {
        ResultDetail {
            quiz_session_id: session_id,
            session_title: "Midterm".into(),
            student_name: name.into(),
            class_name: Some("L3-A".into()),
            status,
            percentage: pct,
            grade: pct / 100.0 * MAX_GRADE,
            submitted_at: None,
        }
    }

    #[test]
    fn aggregates_mean_max_min() {
        let sid = Uuid::new_v4();
        let sessions = vec![session(sid, "Midterm")];
        let results = vec![
            result(sid, "Ama", 80.0, ResultStatus::Published),
            result(sid, "Kofi", 60.0, ResultStatus::Published),
            result(sid, "Esi", 70.0, ResultStatus::Published),
        ];
        let report = build_periodic_report(&sessions, &results);
        assert_eq!(report.total_sessions, 1);
        assert_eq!(report.total_participants, 3);
        assert_eq!(report.average_score, 70.0);
        assert_eq!(report.highest_score, 80.0);
        assert_eq!(report.lowest_score, 60.0);
        assert_eq!(report.sessions[0].participants, 3);
        assert_eq!(report.sessions[0].average_score, 70.0);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let sid = Uuid::new_v4();
        let sessions = vec![session(sid, "Final")];
        let results = vec![
            result(sid, "Ama", 66.666, ResultStatus::Published),
            result(sid, "Kofi", 33.333, ResultStatus::Published),
        ];
        let report = build_periodic_report(&sessions, &results);
        assert_eq!(report.average_score, 50.0);
        assert_eq!(report.highest_score, 66.67);
        assert_eq!(report.lowest_score, 33.33);
    }

    #[test]
    fn top_performers_are_sorted_and_capped() {
        let sid = Uuid::new_v4();
        let sessions = vec![session(sid, "Final")];
        let results: Vec<ResultDetail> = (0..15)
            .map(|i| result(sid, &format!("s{i}"), i as f64 * 5.0, ResultStatus::Published))
            .collect();
        let report = build_periodic_report(&sessions, &results);
        assert_eq!(report.top_performers.len(), TOP_PERFORMERS_LIMIT);
        assert_eq!(report.top_performers[0].score, 70.0);
        let scores: Vec<f64> = report.top_performers.iter().map(|p| p.score).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(scores, sorted);
    }

    #[test]
    fn empty_results_produce_zeroed_report() {
        let sessions = vec![session(Uuid::new_v4(), "Empty")];
        let report = build_periodic_report(&sessions, &[]);
        assert_eq!(report.total_participants, 0);
        assert_eq!(report.average_score, 0.0);
        assert_eq!(report.highest_score, 0.0);
        assert_eq!(report.lowest_score, 0.0);
        assert!(report.top_performers.is_empty());
        assert_eq!(report.sessions[0].participants, 0);
    }

    #[test]
    fn session_stats_count_by_status() {
        let sid = Uuid::new_v4();
        let results = vec![
            result(sid, "a", 90.0, ResultStatus::Published),
            result(sid, "b", 50.0, ResultStatus::Published),
            result(sid, "c", 0.0, ResultStatus::Submitted),
            result(sid, "d", 0.0, ResultStatus::Graded),
            result(sid, "e", 0.0, ResultStatus::InProgress),
        ];
        let stats = build_session_stats(&results);
        assert_eq!(stats.total_participants, 5);
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.graded, 1);
        assert_eq!(stats.published, 2);
        // Only published rows count toward the average.
        assert_eq!(stats.average_score, 70.0);
    }
}
