//! collab-ia - Employee collaboration ingest & analytics
//!
//! Runs as an HTTP service by default. The `ingest` and `analyze`
//! subcommands drive the same pipeline from the command line and print
//! JSON to stdout.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use collab_common::config::{ConfigOverrides, Settings};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use collab_ia::db::{init_database_pool, SqliteAssignmentStore};
use collab_ia::services::{
    IngestError, IngestOptions, IngestionCoordinator, OverlapAnalyzer, UploadGate,
};
use collab_ia::AppState;

/// Command-line arguments for collab-ia
#[derive(Parser, Debug)]
#[command(name = "collab-ia")]
#[command(about = "Employee collaboration ingest and analytics service")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/collab/config.toml)
    #[arg(short, long, env = "COLLAB_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "COLLAB_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "COLLAB_HOST", global = true)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "COLLAB_PORT", global = true)]
    port: Option<u16>,

    /// Records per write batch
    #[arg(long, env = "COLLAB_CHUNK_SIZE", global = true)]
    chunk_size: Option<usize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,

    /// Ingest one CSV file and print the summary
    Ingest {
        /// CSV file with EmpID, ProjectID, DateFrom, DateTo columns
        file: PathBuf,
    },

    /// Print the longest-collaborating pair
    Analyze,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            database_path: self.database.clone(),
            host: self.host.clone(),
            port: self.port,
            chunk_size: self.chunk_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::resolve(&args.overrides());

    let default_filter = settings
        .as_ref()
        .map(|s| format!("collab_ia={0},collab_common={0},tower_http={0}", s.log_level))
        .unwrap_or_else(|_| "info".to_string());

    // Logs go to stderr so subcommand JSON on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = settings.context("Failed to load configuration")?;

    info!(
        "Starting collab-ia v{} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Database: {}", settings.database_path.display());

    let pool = init_database_pool(&settings.database_path)
        .await
        .context("Failed to open database")?;
    let store = Arc::new(SqliteAssignmentStore::new(pool));
    info!("Database connection established");

    match args.command {
        None | Some(Command::Serve) => serve(store, &settings).await,
        Some(Command::Ingest { file }) => ingest_file(store, &settings, file).await,
        Some(Command::Analyze) => analyze(store).await,
    }
}

async fn serve(store: Arc<SqliteAssignmentStore>, settings: &Settings) -> Result<()> {
    let state = AppState::from_settings(store, settings);
    let app = collab_ia::build_router(state);

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", settings.host, settings.port))?;
    let addr: SocketAddr = listener.local_addr()?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn ingest_file(
    store: Arc<SqliteAssignmentStore>,
    settings: &Settings,
    file: PathBuf,
) -> Result<()> {
    let metadata = std::fs::metadata(&file)
        .with_context(|| format!("Cannot read {}", file.display()))?;
    let file_name = file.file_name().map(|n| n.to_string_lossy().into_owned());
    UploadGate::new(settings.max_upload_bytes).check(
        file_name.as_deref(),
        None,
        usize::try_from(metadata.len()).unwrap_or(usize::MAX),
    )?;

    let source = std::fs::File::open(&file)
        .with_context(|| format!("Cannot open {}", file.display()))?;
    let options = IngestOptions {
        chunk_size: settings.chunk_size,
        read_ahead: settings.read_ahead,
        today: None,
    };
    let coordinator = IngestionCoordinator::new(store, options);

    match coordinator.ingest(source).await {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Err(e) => {
            let IngestError::StreamReadFailed { partial, .. } = &e;
            println!("{}", serde_json::to_string_pretty(partial)?);
            Err(e.into())
        }
    }
}

async fn analyze(store: Arc<SqliteAssignmentStore>) -> Result<()> {
    let result = OverlapAnalyzer::new(store)
        .find_longest_collaboration()
        .await
        .context("Analysis failed")?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: [&str; 5] = [
        "COLLAB_CONFIG",
        "COLLAB_DATABASE",
        "COLLAB_HOST",
        "COLLAB_PORT",
        "COLLAB_CHUNK_SIZE",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_no_subcommand_means_serve() {
        clear_env();
        let args = Args::try_parse_from(["collab-ia"]).unwrap();
        assert_eq!(args.command, None);
        let overrides = args.overrides();
        assert!(overrides.host.is_none());
        assert!(overrides.port.is_none());
        assert!(overrides.chunk_size.is_none());
    }

    #[test]
    #[serial]
    fn test_env_applies_without_subcommand() {
        clear_env();
        std::env::set_var("COLLAB_HOST", "0.0.0.0");
        std::env::set_var("COLLAB_PORT", "4000");
        std::env::set_var("COLLAB_CHUNK_SIZE", "25");
        let bare = Args::try_parse_from(["collab-ia"]).unwrap();
        let serve = Args::try_parse_from(["collab-ia", "serve"]).unwrap();
        clear_env();

        for args in [bare, serve] {
            let overrides = args.overrides();
            assert_eq!(overrides.host.as_deref(), Some("0.0.0.0"));
            assert_eq!(overrides.port, Some(4000));
            assert_eq!(overrides.chunk_size, Some(25));
        }
    }

    #[test]
    #[serial]
    fn test_cli_beats_env() {
        clear_env();
        std::env::set_var("COLLAB_PORT", "4000");
        let args = Args::try_parse_from(["collab-ia", "serve", "--port", "5000"]).unwrap();
        clear_env();
        assert_eq!(args.overrides().port, Some(5000));
    }

    #[test]
    #[serial]
    fn test_env_fills_missing_flags() {
        clear_env();
        std::env::set_var("COLLAB_CHUNK_SIZE", "25");
        std::env::set_var("COLLAB_DATABASE", "/tmp/collab-env.db");
        let args = Args::try_parse_from(["collab-ia", "ingest", "data.csv"]).unwrap();
        clear_env();

        let overrides = args.overrides();
        assert_eq!(overrides.chunk_size, Some(25));
        assert_eq!(
            overrides.database_path,
            Some(PathBuf::from("/tmp/collab-env.db"))
        );
        assert_eq!(
            args.command,
            Some(Command::Ingest {
                file: PathBuf::from("data.csv"),
            })
        );
    }

    #[test]
    #[serial]
    fn test_global_flags_after_subcommand() {
        clear_env();
        let args = Args::try_parse_from([
            "collab-ia",
            "analyze",
            "--database",
            "x.db",
            "--chunk-size",
            "10",
        ])
        .unwrap();
        assert_eq!(args.command, Some(Command::Analyze));
        assert_eq!(args.database, Some(PathBuf::from("x.db")));
        assert_eq!(args.chunk_size, Some(10));
    }
}
