//! Match-3 server (default binary).
//!
//! Deals one game and serves it over the line-delimited JSON protocol until
//! Ctrl-C or SIGTERM. Environment variables (`MATCH3_*`) set the defaults;
//! command-line flags override them.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use match3::adapter::{run_server, GameHandle, ServerConfig};
use match3::core::Game;

#[derive(Parser, Debug)]
#[command(name = "match3-server", version, about)]
struct Args {
    /// Host interface to bind (overrides MATCH3_HOST).
    #[arg(long)]
    host: Option<String>,
    /// Port to bind; 0 picks a free port (overrides MATCH3_PORT).
    #[arg(long)]
    port: Option<u16>,
    /// Board rows (overrides MATCH3_ROWS).
    #[arg(long)]
    rows: Option<usize>,
    /// Board columns (overrides MATCH3_COLS).
    #[arg(long)]
    cols: Option<usize>,
    /// Seed for reproducible boards and refills (overrides MATCH3_SEED).
    #[arg(long)]
    seed: Option<u64>,
    /// Tracing filter, e.g. "info", "debug"; RUST_LOG wins when set.
    #[arg(long, default_value = "info")]
    log: String,
}

impl Args {
    fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(rows) = self.rows {
            config.game.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.game.cols = cols;
        }
        if self.seed.is_some() {
            config.game.seed = self.seed;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = args.apply(ServerConfig::from_env());
    config.game.validate().context("invalid board configuration")?;
    info!(
        rows = config.game.rows,
        cols = config.game.cols,
        seeded = config.game.seed.is_some(),
        "dealing first board"
    );

    let game = GameHandle::new(Game::new(config.game));

    tokio::select! {
        res = run_server(config, game, None) => res,
        _ = shutdown_signal() => {
            info!("shutting down");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
