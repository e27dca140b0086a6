//! Explorer UI server - read-only web interface over a pipeline results tree.

mod routes;
mod sse;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use axum::routing::get;
use clap::Parser;
use explorer::explorer::Explorer;
use explorer::io::config::{DEFAULT_CONFIG_FILE, resolve_config};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "explorer-ui")]
#[command(about = "Read-only web UI for browsing pipeline results")]
struct Args {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, default_value = "3001")]
    port: u16,

    /// Config file (TOML). Missing file means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Results root; overrides the config file and EXPLORER_RESULTS_DIR.
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// Directory containing UI static files (API-only when absent)
    #[arg(long)]
    ui_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("explorer_ui=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut cfg = resolve_config(&args.config, args.results_dir)?;
    // Watcher events carry absolute paths; keep the root comparable.
    if let Ok(canonical) = cfg.results_dir.canonicalize() {
        cfg.results_dir = canonical;
    }
    info!(results_dir = %cfg.results_dir.display(), "starting explorer-ui");

    let state = AppState::new(Explorer::from_config(&cfg)?);

    sse::start_tree_watcher(state.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .nest("/api", routes::api_router())
        .route("/events", get(sse::events_handler))
        .layer(cors)
        .with_state(state);

    if let Some(ui_dir) = args.ui_dir {
        if ui_dir.exists() {
            info!(ui_dir = %ui_dir.display(), "serving static UI files");
            app = app.fallback_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
        } else {
            info!(ui_dir = %ui_dir.display(), "UI directory not found, API-only mode");
        }
    }

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
