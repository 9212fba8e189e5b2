use std::net::{IpAddr, SocketAddr, TcpListener};
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use newsroom::{app, state::AppState};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[arg(long, env = "DATABASE_PATH", default_value = "./newsroom.sqlite")]
    sqlite_path: String,

    /// Uploaded files end up in the `uploads` directory under this path
    #[arg(long, env = "STORAGE_ROOT", default_value = ".")]
    storage_root: String,

    #[arg(long, env = "TEMPLATES_GLOB", default_value = "templates/**/*.html")]
    templates: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1")]
    bind_address: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    tracing::info!("Local fs for storage at {}", cli.storage_root);
    let state = AppState::new(&cli.templates, &cli.sqlite_path, &cli.storage_root)
        .await
        .context("cannot construct app state")?;
    state.db.migrate().await.context("cannot migrate the db")?;

    let addr = IpAddr::from_str(&cli.bind_address)
        .with_context(|| format!("invalid bind address {}", cli.bind_address))?;
    let addr = SocketAddr::from((addr, cli.port));
    let listener = TcpListener::bind(addr).with_context(|| format!("cannot bind {addr}"))?;

    let served = app::serve(listener, app::build(state.clone()), shutdown_signal()).await;

    tracing::info!("Server stopped, closing the db");
    state.db.close().await;

    served.map_err(|err| anyhow::anyhow!(err))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for ctrl-c: {err:?}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
