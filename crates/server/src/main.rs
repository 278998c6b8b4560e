use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use tissea_network::{NetworkService, SqliteStore, StoreConfig, TransactionPolicy};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tissea-server",
    version,
    about = "Serve the transit network API over HTTP"
)]
struct Args {
    /// SQLite database file, created if missing
    #[arg(short, long, env = "TISSEA_DATABASE", default_value = "tissea.db")]
    database: PathBuf,

    /// Address to listen on
    #[arg(short, long, env = "TISSEA_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// How long a connection waits on a locked database, in milliseconds
    #[arg(long, env = "TISSEA_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    busy_timeout_ms: u64,

    /// How long a mutation waits for its line lock, in milliseconds
    #[arg(long, env = "TISSEA_LOCK_TIMEOUT_MS", default_value_t = 2000)]
    lock_timeout_ms: u64,

    /// Retries for a mutation that hits a conflict
    #[arg(long, env = "TISSEA_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = StoreConfig::new(&args.database)
        .with_busy_timeout(Duration::from_millis(args.busy_timeout_ms));
    let store = SqliteStore::open(config)
        .wrap_err_with(|| format!("failed to open database {}", args.database.display()))?;

    let policy = TransactionPolicy {
        lock_timeout: Duration::from_millis(args.lock_timeout_ms),
        max_retries: args.max_retries,
        ..TransactionPolicy::default()
    };
    let service = Arc::new(NetworkService::with_policy(store, policy));

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .wrap_err_with(|| format!("failed to bind {}", args.listen))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        database = %args.database.display(),
        "serving network api"
    );

    tissea_server::serve(listener, service, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
    .wrap_err("server error")?;

    tracing::info!("shut down");
    Ok(())
}
