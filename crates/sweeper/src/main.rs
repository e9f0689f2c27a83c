//! Scheduled cleanup entry point.
//!
//! Invoked by an external scheduler (cron or similar) with no arguments.
//! Exit code 0 on a completed run, including runs with per-item failures
//! (logged and counted but left for the next invocation), and
//! non-zero only when the run could not happen at all (database unreachable,
//! expired-events query failed).

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proofroom_core::retention::{RetentionPolicy, DEFAULT_RETENTION_DAYS};
use proofroom_storage::cdn::{CdnConfig, CdnStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proofroom_sweeper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let retention_days: i64 = std::env::var("RETENTION_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RETENTION_DAYS);
    let policy = RetentionPolicy::from_days(retention_days);

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::error!("DATABASE_URL must be set");
            std::process::exit(1);
        }
    };

    let pool = match proofroom_db::create_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(e) = proofroom_db::health_check(&pool).await {
        tracing::error!(error = %e, "Database health check failed");
        std::process::exit(1);
    }

    let store = CdnStore::new(CdnConfig::from_env());

    // Ctrl-C / SIGTERM stops the sweep between items; whatever is left
    // simply waits for the next scheduled run.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Termination signal received, finishing current item");
            signal_cancel.cancel();
        }
    });

    match proofroom_sweeper::run_sweep(&pool, &store, policy, &cancel).await {
        Ok(report) => {
            if !report.fully_clean() {
                tracing::warn!(
                    failures = report.errors.len(),
                    "Sweep completed with per-item failures; they will be retried next run"
                );
            }
            std::process::exit(0);
        }
        Err(e) => {
            tracing::error!(error = %e, "Sweep aborted: expired-events query failed");
            std::process::exit(1);
        }
    }
}
