use std::env;

use server::{serve, shutdown_signal, sweep_sessions, upload, AppState, ServerConfig};
use tour::MemoryStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "server=info,auth=info,tour=info,tower_http=info";

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    if env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = ServerConfig::from_env().expect("invalid server configuration");

    let store = match &config.data_file {
        Some(path) => MemoryStore::open(path)
            .await
            .expect("failed to open data file"),
        None => {
            warn!("DATA_FILE not set; content is kept in memory only");
            MemoryStore::new()
        }
    };

    if let Err(err) = upload::ensure_dirs(&config.upload_dir).await {
        warn!("failed to create upload directories: {err}");
    }

    let addr = config.addr;
    let sweep = config.session_sweep;
    let state = AppState::new(store, config);

    if let Some(every) = sweep {
        tokio::spawn(sweep_sessions(state.clone(), every));
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listen address");
    info!("tour server listening on http://{addr}");

    serve(listener, state, shutdown_signal())
        .await
        .expect("server error");
    info!("server stopped");
}
