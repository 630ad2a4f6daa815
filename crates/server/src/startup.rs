use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::storage::ListingStore;

use crate::errors::StartupError;
use crate::routes;
use crate::state::ServerState;

fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr() -> Result<SocketAddr, StartupError> {
    let (host, port) = match configs::load_default() {
        Ok(cfg) => {
            let s = cfg.server;
            (s.host, s.port)
        }
        Err(_) => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080);
            (host, port)
        }
    };
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address: {e}")))
}

/// Resolve configuration and open the listing table. Any failure here is
/// fatal: the process must not start serving without a resolved table name.
pub async fn build_state() -> Result<ServerState, StartupError> {
    let cfg = configs::AppConfig::load_and_validate()
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    let table_name = configs::resolve_table_name(&cfg.storage.secret_file)
        .map_err(|e| StartupError::InvalidConfig(format!("table-name secret: {e}")))?;
    info!(%table_name, "resolved listing table name");

    common::env::ensure_data_dir(&cfg.storage.data_dir).await?;

    let table_path = format!("{}/{}.json", cfg.storage.data_dir, table_name);
    let store = ListingStore::new(&table_path)
        .await
        .map_err(|e| StartupError::InvalidConfig(format!("cannot open table: {e}")))?;

    Ok(ServerState { store, table_name: Arc::from(table_name) })
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> Result<(), StartupError> {
    dotenv().ok();
    init_logging();

    let state = build_state().await?;

    let cors = build_cors();
    let app: Router = routes::build_router(cors, state);

    let addr = load_bind_addr()?;
    info!(%addr, "starting listing service");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StartupError::Any(e.into()))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| StartupError::Any(e.into()))?;
    Ok(())
}
