//! Per-session report job, dispatched in the background when a session
//! completes. Emails every administrator of the session's institution (or a
//! given subset) and records a platform notification per recipient.

use crate::db::reports as queries;
use crate::reports::fanout::deliver_to_recipients;
use crate::reports::render;
use crate::reports::summary::build_session_stats;
use crate::services::notifications;
use crate::state::SharedState;
use anyhow::Result;
use uuid::Uuid;

pub async fn send_session_report(
    state: &SharedState,
    session_id: Uuid,
    administrator_ids: &[Uuid],
) -> Result<()> {
    let Some(session) = queries::session_context(&state.pool, session_id).await? else {
        tracing::error!("Session not found for report: {}", session_id);
        return Ok(());
    };

    let results = queries::session_results_detail(&state.pool, session_id).await?;
    if results.is_empty() {
        tracing::info!("No results found for session: {}", session_id);
        return Ok(());
    }

    let administrators = if administrator_ids.is_empty() {
        let Some(institution_id) = session.institution_id else {
            tracing::warn!(
                "Session {} has no institution, skipping report",
                session_id
            );
            return Ok(());
        };
        queries::administrators_for_institution(&state.pool, institution_id).await?
    } else {
        queries::administrators_by_ids(&state.pool, administrator_ids).await?
    };
    if administrators.is_empty() {
        tracing::warn!("No administrators found for session report: {}", session_id);
        return Ok(());
    }

    let stats = build_session_stats(&results);
    let html = render::session_report_html(&session, &results, &stats);
    let subject = format!("Results report - {}", session.title);

    let outcome =
        deliver_to_recipients(state.mailer.as_ref(), &administrators, &subject, &html).await;

    let recipient_ids: Vec<Uuid> = administrators.iter().map(|a| a.user_id).collect();
    let data = serde_json::json!({
        "session_id": session.id,
        "title": session.title,
        "quiz_title": session.quiz_title,
        "completed_at": session.completed_at,
        "total_results": results.len(),
    });
    let created =
        notifications::notify_session_completed(&state.pool, &recipient_ids, &session.title, data)
            .await?;

    tracing::info!(
        "Session report done. Session: {}, emails sent: {}, failed: {}, platform notifications: {}",
        session_id,
        outcome.sent,
        outcome.failed,
        created
    );
    Ok(())
}
