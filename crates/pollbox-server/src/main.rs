//! pollbox server binary.
//!
//! Loads configuration, initializes the database (schema and one-time seed
//! data), then serves the poll API until SIGTERM/SIGINT.

use pollbox_db::{ConnectionScope, SeedSource};
use pollbox_server::{app, config, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("POLLBOX_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let pool = pollbox_db::create_pool(&config.database.path, config.database.runtime_settings())
        .expect("failed to create database pool — check database.path in config");

    // A half-initialized database is never served.
    {
        let seeds = SeedSource::new(&config.seed.dir);
        let initialized = ConnectionScope::begin(&pool).and_then(|scope| {
            let conn = scope.current()?;
            pollbox_db::initialize_database(conn, &seeds)
        });
        match initialized {
            Ok(report) => {
                if report.polls_skipped > 0 || report.options_skipped > 0 {
                    tracing::warn!(
                        polls_skipped = report.polls_skipped,
                        options_skipped = report.options_skipped,
                        "some seed entries could not be inserted"
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "database initialization failed");
                std::process::exit(1);
            }
        }
    }

    let app = app(AppState { pool });
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting pollbox server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("pollbox server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
