//! HTML rendering for report emails: a greeting block, global statistics,
//! and inline-styled tables (mail clients ignore stylesheets).

use crate::db::reports::{ResultDetail, SessionContext};
use crate::domain::models::ResultStatus;
use crate::reports::summary::{PeriodicReport, SessionStats};
use chrono::{DateTime, Utc};

const TH: &str = "border: 1px solid #dee2e6; padding: 8px; text-align: left;";
const TH_CENTER: &str = "border: 1px solid #dee2e6; padding: 8px; text-align: center;";
const TD: &str = "border: 1px solid #dee2e6; padding: 8px;";
const TD_CENTER: &str = "border: 1px solid #dee2e6; padding: 8px; text-align: center;";
const TABLE: &str = "border-collapse: collapse; width: 100%;";
const HEAD_ROW: &str = "background-color: #f8f9fa;";

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn format_date(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%d/%m/%Y").to_string(),
        None => "-".to_string(),
    }
}

fn format_datetime(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%d/%m/%Y %H:%M").to_string(),
        None => "-".to_string(),
    }
}

/// Full body of the periodic report email for one institution.
pub fn periodic_report_html(
    institution_name: &str,
    period_label: &str,
    window: (DateTime<Utc>, DateTime<Utc>),
    report: &PeriodicReport,
) -> String {
    let mut html = String::new();
    html.push_str("<h2>Periodic results report</h2>\n");
    html.push_str(&format!(
        "<p><strong>Period:</strong> {} ({} &ndash; {})<br>\n",
        escape_html(period_label),
        window.0.format("%d/%m/%Y %H:%M"),
        window.1.format("%d/%m/%Y %H:%M"),
    ));
    html.push_str(&format!(
        "<strong>Institution:</strong> {}</p>\n",
        escape_html(institution_name)
    ));

    html.push_str("<h3>Overall statistics</h3>\n<ul>\n");
    html.push_str(&format!(
        "<li>Completed sessions: {}</li>\n",
        report.total_sessions
    ));
    html.push_str(&format!(
        "<li>Total participants: {}</li>\n",
        report.total_participants
    ));
    html.push_str(&format!("<li>Average score: {}%</li>\n", report.average_score));
    html.push_str(&format!("<li>Highest score: {}%</li>\n", report.highest_score));
    html.push_str(&format!("<li>Lowest score: {}%</li>\n", report.lowest_score));
    html.push_str("</ul>\n");

    html.push_str("<h3>Session breakdown</h3>\n");
    html.push_str(&sessions_table(report));

    html.push_str("<h3>Top performers</h3>\n");
    html.push_str(&top_performers_table(report));

    html.push_str(&format!(
        "<p>Kind regards,<br>The {} team</p>\n",
        escape_html(institution_name)
    ));
    html
}

fn sessions_table(report: &PeriodicReport) -> String {
    let mut html = format!(
        "<table style='{TABLE}'>\n<thead>\n<tr style='{HEAD_ROW}'>\
         <th style='{TH}'>Session</th>\
         <th style='{TH}'>Quiz</th>\
         <th style='{TH}'>Teacher</th>\
         <th style='{TH_CENTER}'>Participants</th>\
         <th style='{TH_CENTER}'>Average</th>\
         <th style='{TH_CENTER}'>Completed</th>\
         </tr>\n</thead>\n<tbody>\n"
    );
    for session in &report.sessions {
        html.push_str(&format!(
            "<tr><td style='{TD}'>{}</td><td style='{TD}'>{}</td><td style='{TD}'>{}</td>\
             <td style='{TD_CENTER}'>{}</td><td style='{TD_CENTER}'>{}%</td>\
             <td style='{TD_CENTER}'>{}</td></tr>\n",
            escape_html(&session.title),
            escape_html(&session.quiz_title),
            escape_html(&session.teacher_name),
            session.participants,
            session.average_score,
            format_date(session.completed_at),
        ));
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

fn top_performers_table(report: &PeriodicReport) -> String {
    let mut html = format!(
        "<table style='{TABLE}'>\n<thead>\n<tr style='{HEAD_ROW}'>\
         <th style='{TH}'>Student</th>\
         <th style='{TH}'>Class</th>\
         <th style='{TH}'>Session</th>\
         <th style='{TH_CENTER}'>Score (%)</th>\
         <th style='{TH_CENTER}'>Grade /20</th>\
         </tr>\n</thead>\n<tbody>\n"
    );
    for performer in &report.top_performers {
        html.push_str(&format!(
            "<tr><td style='{TD}'>{}</td><td style='{TD}'>{}</td><td style='{TD}'>{}</td>\
             <td style='{TD_CENTER}'>{}%</td><td style='{TD_CENTER}'>{}</td></tr>\n",
            escape_html(&performer.student_name),
            escape_html(performer.class_name.as_deref().unwrap_or("N/A")),
            escape_html(&performer.session_title),
            performer.score,
            performer.grade,
        ));
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

/// Full body of the single-session report email.
pub fn session_report_html(
    session: &SessionContext,
    results: &[ResultDetail],
    stats: &SessionStats,
) -> String {
    let institution = session.institution_name.as_deref().unwrap_or("Institution");

    let mut html = String::new();
    html.push_str("<h2>Session results report</h2>\n");
    html.push_str(&format!(
        "<p><strong>Session:</strong> {}<br>\n<strong>Quiz:</strong> {}<br>\n\
         <strong>Schedule:</strong> {} &ndash; {}<br>\n<strong>Teacher:</strong> {}</p>\n",
        escape_html(&session.title),
        escape_html(&session.quiz_title),
        session.starts_at.format("%d/%m/%Y %H:%M"),
        session.ends_at.format("%d/%m/%Y %H:%M"),
        escape_html(&session.teacher_name),
    ));

    html.push_str("<h3>Overall statistics</h3>\n<ul>\n");
    html.push_str(&format!(
        "<li>Total participants: {}</li>\n",
        stats.total_participants
    ));
    html.push_str(&format!("<li>Submitted: {}</li>\n", stats.submitted));
    html.push_str(&format!("<li>Graded: {}</li>\n", stats.graded));
    html.push_str(&format!("<li>Published: {}</li>\n", stats.published));
    html.push_str(&format!("<li>Average score: {}%</li>\n", stats.average_score));
    html.push_str("</ul>\n");

    html.push_str("<h3>Detailed results</h3>\n");
    html.push_str(&results_table(results));

    html.push_str(&format!(
        "<p>Kind regards,<br>The {} team</p>\n",
        escape_html(institution)
    ));
    html
}

fn results_table(results: &[ResultDetail]) -> String {
    let mut html = format!(
        "<table style='{TABLE}'>\n<thead>\n<tr style='{HEAD_ROW}'>\
         <th style='{TH}'>Student</th>\
         <th style='{TH_CENTER}'>Class</th>\
         <th style='{TH_CENTER}'>Status</th>\
         <th style='{TH_CENTER}'>Score (%)</th>\
         <th style='{TH_CENTER}'>Grade /20</th>\
         <th style='{TH_CENTER}'>Submitted</th>\
         </tr>\n</thead>\n<tbody>\n"
    );
    for result in results {
        // Scores are only shown once the result is published.
        let (score, grade) = if result.status == ResultStatus::Published {
            (
                format!("{}%", crate::reports::summary::round2(result.percentage)),
                format!("{}", crate::reports::summary::round2(result.grade)),
            )
        } else {
            ("-".to_string(), "-".to_string())
        };
        html.push_str(&format!(
            "<tr><td style='{TD}'>{}</td><td style='{TD_CENTER}'>{}</td>\
             <td style='{TD_CENTER}'>{}</td><td style='{TD_CENTER}'>{}</td>\
             <td style='{TD_CENTER}'>{}</td><td style='{TD_CENTER}'>{}</td></tr>\n",
            escape_html(&result.student_name),
            escape_html(result.class_name.as_deref().unwrap_or("N/A")),
            result.status.label(),
            score,
            grade,
            format_datetime(result.submitted_at),
        ));
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::summary::{build_periodic_report, build_session_stats};
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }

    fn sample_session() -> SessionContext {
        SessionContext {
            id: Uuid::new_v4(),
            title: "Midterm <Algebra>".into(),
            quiz_title: "Algebra I".into(),
            teacher_name: "K. Asante".into(),
            institution_id: Some(Uuid::new_v4()),
            institution_name: Some("ESG Institute".into()),
            starts_at: Utc.with_ymd_and_hms(2025, 10, 6, 8, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 10, 6, 10, 0, 0).unwrap(),
            completed_at: Some(Utc.with_ymd_and_hms(2025, 10, 6, 10, 0, 0).unwrap()),
        }
    }

    fn sample_result(session: &SessionContext, status: ResultStatus) -> ResultDetail {
        ResultDetail {
            quiz_session_id: session.id,
            session_title: session.title.clone(),
            student_name: "Ama <Script>".into(),
            class_name: None,
            status,
            percentage: 87.5,
            grade: 17.5,
            submitted_at: Some(Utc.with_ymd_and_hms(2025, 10, 6, 9, 45, 0).unwrap()),
        }
    }

    #[test]
    fn periodic_report_escapes_and_tabulates() {
        let session = sample_session();
        let results = vec![sample_result(&session, ResultStatus::Published)];
        let sessions = vec![session];
        let report = build_periodic_report(&sessions, &results);
        let (start, end) = crate::reports::ReportPeriod::Daily
            .window(chrono::NaiveDate::from_ymd_opt(2025, 10, 6).unwrap());

        let html = periodic_report_html("ESG Institute", "Daily", (start, end), &report);
        assert!(html.contains("Midterm &lt;Algebra&gt;"));
        assert!(html.contains("Ama &lt;Script&gt;"));
        assert!(html.contains("Average score: 87.5%"));
        assert!(html.contains("<table"));
        assert!(!html.contains("<Script>"));
    }

    #[test]
    fn session_report_hides_unpublished_scores() {
        let session = sample_session();
        let results = vec![
            sample_result(&session, ResultStatus::Published),
            sample_result(&session, ResultStatus::Submitted),
        ];
        let stats = build_session_stats(&results);
        let html = session_report_html(&session, &results, &stats);
        assert!(html.contains("87.5%"));
        // The submitted row renders a placeholder instead of a score.
        assert!(html.contains("<td style='border: 1px solid #dee2e6; padding: 8px; text-align: center;'>-</td>"));
        assert!(html.contains("Submitted"));
    }
}
