use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mindmap_server::{build_router, AppState};

// ── CLI ─────────────────────────────────────────────────────────────

/// Mind-map generation server.
#[derive(Parser, Debug)]
#[command(name = "mindmap-server", version, about)]
struct Cli {
    /// Bind address (overrides HOST).
    #[arg(long, env = "MINDMAP_HOST")]
    host: Option<String>,

    /// Listen port (overrides PORT).
    #[arg(long, env = "MINDMAP_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    mindmap_core::config::load_dotenv();
    let cli = Cli::parse();

    let mut config = mindmap_core::Config::from_env();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.log_summary();

    let state = Arc::new(AppState::from_config(&config)?);
    info!(
        "Backends ready: {}",
        state
            .registry
            .kinds()
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let app = build_router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
