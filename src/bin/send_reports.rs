//! Console entry point for the periodic report pipeline.
//!
//! `send_reports daily` emails today's report to every institution with
//! completed sessions in the window; `--date` rewinds the reference day.

use chrono::{NaiveDate, Utc};
use clap::Parser;
use quizdesk::middleware::RateLimiter;
use quizdesk::reports::{periodic::send_periodic_reports, ReportPeriod};
use quizdesk::services::mailer;
use quizdesk::state::AppState;
use sqlx::postgres::PgPoolOptions;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "send_reports", about = "Send periodic result reports by email")]
struct Args {
    /// Report period: daily, weekly or monthly
    period: String,

    /// Reference date inside the reporting window (defaults to today, UTC)
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let period: ReportPeriod = match args.period.parse() {
        Ok(period) => period,
        Err(e) => {
            eprintln!("{e}. Use daily, weekly or monthly.");
            return ExitCode::FAILURE;
        }
    };
    let reference = args.date.unwrap_or_else(|| Utc::now().date_naive());

    match run(period, reference).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Report run failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(period: ReportPeriod, reference: NaiveDate) -> anyhow::Result<()> {
    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let state = Arc::new(AppState {
        pool,
        mailer: mailer::from_env(),
        session_key: Vec::new(),
        login_limiter: RateLimiter::new(5, 300),
    });

    let summary = send_periodic_reports(&state, period, reference).await?;

    println!(
        "{} report for {} - {}",
        period.label(),
        summary.window.0,
        summary.window.1
    );
    println!(
        "Institutions: {}, reports sent: {}",
        summary.institutions, summary.reports_sent
    );
    for outcome in &summary.outcomes {
        println!(
            "  {}: {} sent, {} failed",
            outcome.institution, outcome.sent, outcome.failed
        );
    }
    Ok(())
}
