//! dat-web - DAT score calculator web service
//!
//! Settings resolve CLI > environment (`DAT_*`) > TOML config file >
//! compiled default.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dat_common::config::{resolve_config_path, EngineKind, TomlConfig, CONFIG_ENV_VAR};
use dat_common::workflow::storage::purge_orphans;
use dat_common::{RowScorer, SessionStore};
use dat_web::{build_router, AppState, WebSettings};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for dat-web
#[derive(Parser, Debug)]
#[command(name = "dat-web")]
#[command(about = "Divergent Association Task score calculator for CSV tables")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "DAT_BIND_ADDR")]
    bind_addr: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "DAT_PORT")]
    port: Option<u16>,

    /// Directory holding per-session storage
    #[arg(long, env = "DAT_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Scoring engine (embedding or fixed)
    #[arg(long, env = "DAT_ENGINE")]
    engine: Option<EngineKind>,

    /// Word vector file (GloVe text layout)
    #[arg(long, env = "DAT_VECTORS_PATH")]
    vectors_path: Option<PathBuf>,

    /// Dictionary file, one word per line
    #[arg(long, env = "DAT_DICTIONARY_PATH")]
    dictionary_path: Option<PathBuf>,

    /// Rows scored concurrently
    #[arg(long, env = "DAT_WORKERS")]
    workers: Option<usize>,

    /// Add the Secure attribute to the session cookie
    #[arg(long, env = "DAT_COOKIE_SECURE")]
    cookie_secure: Option<bool>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "DAT_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    /// Overlay command-line and environment values onto the file config
    fn apply(self, mut config: TomlConfig) -> TomlConfig {
        if let Some(bind_addr) = self.bind_addr {
            config.bind_addr = bind_addr;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(work_dir) = self.work_dir {
            config.work_dir = Some(work_dir);
        }
        if let Some(engine) = self.engine {
            config.scoring.engine = engine;
        }
        if let Some(vectors_path) = self.vectors_path {
            config.scoring.vectors_path = vectors_path;
        }
        if let Some(dictionary_path) = self.dictionary_path {
            config.scoring.dictionary_path = dictionary_path;
        }
        if let Some(workers) = self.workers {
            config.scoring.workers = Some(workers);
        }
        if let Some(cookie_secure) = self.cookie_secure {
            config.cookie_secure = cookie_secure;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let config = args.apply(
        TomlConfig::load_or_default(config_path.as_deref())
            .context("Failed to load configuration")?,
    );
    config.validate().context("Invalid configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting dat-web v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file, using defaults"),
    }

    let storage_root = config.work_dir().join("sessions");
    std::fs::create_dir_all(&storage_root)
        .with_context(|| format!("Failed to create {}", storage_root.display()))?;
    let purged = purge_orphans(&storage_root).context("Failed to clean session storage")?;
    if purged > 0 {
        warn!(purged, "Removed session storage left by a previous run");
    }
    info!("Session storage: {}", storage_root.display());

    // Word vectors are large; load them off the async workers
    let scoring = config.scoring.clone();
    let scorer = tokio::task::spawn_blocking(move || scoring.build_scorer())
        .await
        .context("Scorer initialization panicked")?
        .context("Failed to initialize scoring engine")?;
    let limits = config.scoring.limits();
    info!(
        scorer = scorer.name(),
        workers = limits.workers,
        row_timeout = ?limits.row_timeout,
        compute_deadline = ?limits.compute_deadline,
        "Scoring engine ready"
    );

    let sessions = SessionStore::new(
        storage_root,
        RowScorer::new(scorer, limits),
        config.session_ttl(),
    );
    let reaper = sessions.spawn_reaper(config.reaper_interval());

    let settings = WebSettings {
        cookie_secure: config.cookie_secure,
        max_upload_bytes: config.max_upload_bytes,
    };
    let app = build_router(AppState::new(sessions.clone(), settings));

    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_addr, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    reaper.abort();
    let released = sessions.clear().await;
    info!(released, "Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
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
