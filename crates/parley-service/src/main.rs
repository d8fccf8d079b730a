use std::sync::Arc;
use std::time::Duration as StdDuration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use parley_service::server::{router, AppState};
use parley_store::{DataAccess, MemoryDataAccess};
use parley_types::ServiceConfig;

/// Parley -- ChatOps command authorization service.
#[derive(Parser, Debug)]
#[command(name = "parleyd", version, about)]
struct Cli {
    /// Address for the administrative API (overrides the config default)
    #[arg(long)]
    listen: Option<String>,

    /// Lifetime of issued session tokens, in seconds
    #[arg(long)]
    token_lifetime: Option<i64>,

    /// Increase logging verbosity (RUST_LOG=debug)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, short, global = true)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on flags: --verbose sets debug, --quiet sets
    // error, otherwise respect RUST_LOG.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = ServiceConfig::default();
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    if let Some(secs) = cli.token_lifetime {
        config.token_lifetime_secs = secs;
    }

    let store: Arc<dyn DataAccess> = Arc::new(MemoryDataAccess::new());

    // Sweep expired tokens in the background.
    let sweeper_store = Arc::clone(&store);
    let sweep_interval = StdDuration::from_secs(config.sweep_interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            match sweeper_store.token_sweep().await {
                Ok(0) => {}
                Ok(count) => info!(count, "swept expired tokens"),
                Err(e) => error!(error = %e, "token sweep failed"),
            }
        }
    });

    let state = AppState {
        store,
        token_lifetime: chrono::Duration::seconds(config.token_lifetime_secs),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "starting parley administrative API");
    axum::serve(listener, app).await?;

    Ok(())
}
