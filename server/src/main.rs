use anyhow::{Context, Result};
use clap::Parser;
use search_core::persist::IndexPaths;
use search_core::{IndexService, PinTable};
use server::{build_app, spawn_reload_loop, AppState, DEFAULT_TOP_N_MAX};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Seconds between background index reloads
    #[arg(long, default_value_t = 300)]
    reload_secs: u64,
    /// Upper bound on the `k` query parameter
    #[arg(long, default_value_t = DEFAULT_TOP_N_MAX)]
    top_n_max: usize,
    /// JSON file of pinned results; none means the pinned stage is off
    #[arg(long)]
    pins: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let pins = match &args.pins {
        Some(p) => PinTable::from_path(p).with_context(|| format!("loading pins from {}", p.display()))?,
        None => PinTable::disabled(),
    };
    let service = IndexService::open(IndexPaths::new(&args.index), pins)
        .with_context(|| format!("loading index from {}", args.index.display()))?;
    let service = Arc::new(service);

    spawn_reload_loop(Arc::clone(&service), Duration::from_secs(args.reload_secs.max(1)));

    let state = AppState {
        service,
        top_n_max: args.top_n_max,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, reload_secs = args.reload_secs, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
