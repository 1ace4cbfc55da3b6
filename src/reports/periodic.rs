//! The periodic report pipeline: find institutions with completed sessions
//! in the window, aggregate their published results and fan the rendered
//! report out to every administrator. Per-recipient failures are logged and
//! never abort the remaining sends.

use crate::db::reports as queries;
use crate::reports::fanout::deliver_to_recipients;
use crate::reports::render;
use crate::reports::summary::build_periodic_report;
use crate::reports::ReportPeriod;
use crate::services::notifications;
use crate::state::SharedState;
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug)]
pub struct InstitutionOutcome {
    pub institution: String,
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct PeriodicRunSummary {
    pub window: (DateTime<Utc>, DateTime<Utc>),
    pub institutions: usize,
    pub reports_sent: usize,
    pub outcomes: Vec<InstitutionOutcome>,
}

pub async fn send_periodic_reports(
    state: &SharedState,
    period: ReportPeriod,
    reference: NaiveDate,
) -> Result<PeriodicRunSummary> {
    let window = period.window(reference);
    tracing::info!(
        "Generating {} report for window {} - {}",
        period.label(),
        window.0,
        window.1
    );

    let institutions =
        queries::institutions_with_completed_sessions(&state.pool, window.0, window.1).await?;

    if institutions.is_empty() {
        tracing::info!("No institution with completed sessions in this window");
        return Ok(PeriodicRunSummary {
            window,
            institutions: 0,
            reports_sent: 0,
            outcomes: Vec::new(),
        });
    }

    let mut outcomes = Vec::new();
    let mut reports_sent = 0;

    for institution in &institutions {
        tracing::info!("Processing institution {}", institution.name);

        let sessions = queries::completed_sessions_for_institution(
            &state.pool,
            institution.id,
            window.0,
            window.1,
        )
        .await?;
        if sessions.is_empty() {
            tracing::info!("No sessions found for {}", institution.name);
            continue;
        }

        let session_ids: Vec<_> = sessions.iter().map(|s| s.id).collect();
        let results = queries::published_results_for_sessions(&state.pool, &session_ids).await?;
        let report = build_periodic_report(&sessions, &results);

        let administrators =
            queries::administrators_for_institution(&state.pool, institution.id).await?;
        if administrators.is_empty() {
            tracing::warn!("No administrator found for {}", institution.name);
            continue;
        }

        let html =
            render::periodic_report_html(&institution.name, period.label(), window, &report);
        let subject = format!(
            "Periodic results report - {} - {}",
            period.label(),
            institution.name
        );

        let outcome =
            deliver_to_recipients(state.mailer.as_ref(), &administrators, &subject, &html).await;

        for admin in &administrators {
            let data = serde_json::json!({
                "period": period.label(),
                "institution_id": institution.id,
                "institution": institution.name,
                "window_start": window.0,
                "window_end": window.1,
                "total_sessions": report.total_sessions,
            });
            if let Err(e) =
                notifications::notify_report_available(&state.pool, admin.user_id, data).await
            {
                tracing::error!(
                    "Failed to record report notification for {}: {}",
                    admin.email,
                    e
                );
            }
        }

        tracing::info!(
            "Report for {} delivered to {} administrator(s), {} failed",
            institution.name,
            outcome.sent,
            outcome.failed
        );
        reports_sent += outcome.sent;
        outcomes.push(InstitutionOutcome {
            institution: institution.name.clone(),
            sent: outcome.sent,
            failed: outcome.failed,
        });
    }

    tracing::info!(
        "Periodic reports finished: {} sent across {} institution(s)",
        reports_sent,
        outcomes.len()
    );

    Ok(PeriodicRunSummary {
        window,
        institutions: institutions.len(),
        reports_sent,
        outcomes,
    })
}
