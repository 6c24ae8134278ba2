// src/main.rs

use std::{net::SocketAddr, time::Duration};

use quiz_backend::{config::Config, routes, state::AppState};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DB_CONNECT_ATTEMPTS: u32 = 5;
const DB_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    // The guard flushes the file writer on exit; keep it alive until then.
    let _log_guard = init_tracing(&config.rust_log);

    let pool = connect_with_retry(&config.database_url).await?;
    tracing::info!("Database connected");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(pool, config)?;
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Quiz backend listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Stdout plus a daily-rolling `logs/app.log`, filtered by `RUST_LOG`.
fn init_tracing(filter: &str) -> WorkerGuard {
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily("logs", "app.log"));

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(fmt::layer().with_writer(std::io::stdout).with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    guard
}

/// Retries while the database is still starting.
async fn connect_with_retry(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 1;
    loop {
        let connected = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await;

        match connected {
            Ok(pool) => return Ok(pool),
            Err(e) if attempt >= DB_CONNECT_ATTEMPTS => {
                tracing::error!("Giving up on the database after {} attempts", attempt);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    "Database not ready ({}), retrying in {}s (attempt {}/{})",
                    e,
                    DB_RETRY_DELAY.as_secs(),
                    attempt,
                    DB_CONNECT_ATTEMPTS
                );
                tokio::time::sleep(DB_RETRY_DELAY).await;
                attempt += 1;
            }
        }
    }
}
