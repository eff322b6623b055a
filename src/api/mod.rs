//! HTTP API server.
//!
//! The server is generic over [`Database`]; the binary decides which backend
//! to construct and hands it to [`run`].

mod routes;
mod state;
pub mod v1;


use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use routes::{ApiDoc, create_router};
pub use state::AppState;

use crate::db::Database;
use crate::paths::get_db_path;

/// Environment variable overriding the database file location.
pub const DB_PATH_ENV: &str = "CLASSROOM_DB";

/// API server errors
#[derive(Error, Diagnostic, Debug)]
pub enum ApiError {
    #[error("Failed to bind to {addr}: {source}")]
    #[diagnostic(
        code(classroom::api::bind),
        help("Check that the port is free or pass a different --port")
    )]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    #[diagnostic(code(classroom::api::serve))]
    Serve(#[source] std::io::Error),
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// SQLite database file
    pub db_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            db_path: get_db_path(),
        }
    }
}

impl Config {
    /// Defaults, with `CLASSROOM_DB` overriding the database path.
    pub fn new() -> Self {
        let mut config = Self::default();
        if let Ok(path) = env::var(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        config
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_db_path(mut self, db_path: PathBuf) -> Self {
        self.db_path = db_path;
        self
    }
}

/// Initialize tracing subscriber with env filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classroom=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the API server with the given configuration and database.
pub async fn run<D: Database + 'static>(config: Config, db: D) -> Result<(), ApiError> {
    init_tracing();

    let state = AppState::new(db);
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ApiError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await.map_err(ApiError::Serve)?;
    Ok(())
}
