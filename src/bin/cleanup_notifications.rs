//! Console entry point that purges expired platform notifications.

use clap::Parser;
use quizdesk::db::notifications;
use sqlx::postgres::PgPoolOptions;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PREVIEW_LIMIT: i64 = 10;

#[derive(Parser)]
#[command(
    name = "cleanup_notifications",
    about = "Delete platform notifications whose expiry date has passed"
)]
struct Args {
    /// Show what would be deleted without deleting anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    match run(args.dry_run).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Cleanup failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(dry_run: bool) -> anyhow::Result<()> {
    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    let expired = notifications::count_expired(&pool).await?;
    if expired == 0 {
        println!("No expired notifications to clean up.");
        return Ok(());
    }

    if dry_run {
        println!("{expired} expired notifications would be deleted.");
        let preview = notifications::preview_expired(&pool, PREVIEW_LIMIT).await?;
        for notification in &preview {
            println!(
                "  [{}] {} (expired {})",
                notification.kind,
                notification.title,
                notification
                    .expires_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default()
            );
        }
        if expired > preview.len() as i64 {
            println!("  ... and {} more", expired - preview.len() as i64);
        }
        return Ok(());
    }

    let deleted = notifications::delete_expired(&pool).await?;
    let remaining = notifications::count_all(&pool).await?;
    let unread = notifications::count_unread_all(&pool).await?;
    println!("Deleted {deleted} expired notifications.");
    println!("Remaining: {remaining} total, {unread} unread.");
    Ok(())
}
