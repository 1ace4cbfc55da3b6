use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use quizdesk::db::{notifications, seed};
use quizdesk::middleware::RateLimiter;
use quizdesk::reports::{periodic::send_periodic_reports, ReportPeriod};
use quizdesk::services::mailer;
use quizdesk::state::{AppState, SharedState};
use quizdesk::web;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL missing");
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            e
        })?;
    tracing::info!("Database migrations completed");

    let session_key_b64 = std::env::var("SESSION_KEY").expect("SESSION_KEY missing");
    let session_key = general_purpose::STANDARD
        .decode(session_key_b64)
        .expect("SESSION_KEY must be base64");

    seed::seed_admin(&pool).await?;

    let shared: SharedState = Arc::new(AppState {
        pool,
        mailer: mailer::from_env(),
        session_key,
        login_limiter: RateLimiter::new(5, 300),
    });

    // Scheduler for periodic reports and notification cleanup
    let scheduler = JobScheduler::new().await?;

    // Daily report at 06:00 UTC, covering the previous calendar day
    let shared_for_daily = shared.clone();
    scheduler
        .add(Job::new_async("0 0 6 * * *", move |_uuid, _l| {
            let state = shared_for_daily.clone();
            Box::pin(async move {
                let reference = Utc::now().date_naive() - Duration::days(1);
                if let Err(e) = send_periodic_reports(&state, ReportPeriod::Daily, reference).await {
                    tracing::error!("Daily report run failed: {}", e);
                }
            })
        })?)
        .await?;

    // Weekly report on Monday at 06:30 UTC, covering the previous ISO week
    let shared_for_weekly = shared.clone();
    scheduler
        .add(Job::new_async("0 30 6 * * MON", move |_uuid, _l| {
            let state = shared_for_weekly.clone();
            Box::pin(async move {
                let reference = Utc::now().date_naive() - Duration::days(7);
                if let Err(e) = send_periodic_reports(&state, ReportPeriod::Weekly, reference).await {
                    tracing::error!("Weekly report run failed: {}", e);
                }
            })
        })?)
        .await?;

    // Monthly report on the 1st at 07:00 UTC, covering the previous month
    let shared_for_monthly = shared.clone();
    scheduler
        .add(Job::new_async("0 0 7 1 * *", move |_uuid, _l| {
            let state = shared_for_monthly.clone();
            Box::pin(async move {
                let reference = Utc::now().date_naive() - Duration::days(1);
                if let Err(e) = send_periodic_reports(&state, ReportPeriod::Monthly, reference).await
                {
                    tracing::error!("Monthly report run failed: {}", e);
                }
            })
        })?)
        .await?;

    // Expired notification cleanup every hour
    let shared_for_cleanup = shared.clone();
    scheduler
        .add(Job::new_async("0 0 * * * *", move |_uuid, _l| {
            let state = shared_for_cleanup.clone();
            Box::pin(async move {
                match notifications::delete_expired(&state.pool).await {
                    Ok(0) => {}
                    Ok(deleted) => {
                        tracing::info!("Deleted {} expired notifications", deleted);
                    }
                    Err(e) => {
                        tracing::error!("Notification cleanup failed: {}", e);
                    }
                }
                state.login_limiter.cleanup().await;
            })
        })?)
        .await?;

    scheduler.start().await?;
    tracing::info!("Scheduler started:");
    tracing::info!("  - Daily reports: 06:00 UTC");
    tracing::info!("  - Weekly reports: Mondays 06:30 UTC");
    tracing::info!("  - Monthly reports: 1st of the month 07:00 UTC");
    tracing::info!("  - Notification cleanup: hourly");

    let app = web::routes(shared.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
        let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        format!("0.0.0.0:{}", port)
    });
    tracing::info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
