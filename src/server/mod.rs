//! Catalog web service: server-rendered browse pages plus the RPC API.

mod pages;
mod rpc;

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::{Arc, OnceLock},
};

use axum::{
    extract::State,
    http::{
        header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE},
        HeaderMap, Method,
    },
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{fmt, EnvFilter};

use crate::catalog::{Catalog, OpenOptions};
use crate::error::CatalogError;

/// Request header carrying the authenticated user id, injected by the
/// fronting session proxy. Requests without it are treated as guests.
pub const IDENTITY_HEADER: &str = "x-dungeoneer-user";

/// Runtime options used to boot the catalog HTTP server.
#[derive(Clone, Debug)]
pub struct ServeOptions {
    /// Path to the catalog database file.
    pub db_path: PathBuf,
    /// Network interface to bind to.
    pub host: IpAddr,
    /// Listening port.
    pub port: u16,
    /// Optional static asset directory overriding the bundled assets.
    pub assets_dir: Option<PathBuf>,
    /// Whether to disable the ownership mutations.
    pub read_only: bool,
    /// Allowed CORS origins for remote frontends.
    pub allow_origins: Vec<String>,
}

impl ServeOptions {
    /// Convenience accessor for `(host, port)` tuples.
    pub fn socket_parts(&self) -> (IpAddr, u16) {
        (self.host, self.port)
    }
}

/// Errors that can occur while running the catalog server.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Opening the catalog database failed.
    #[error("failed to open catalog: {0}")]
    Catalog(#[from] CatalogError),
    /// Binding the listener or serving connections failed.
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) type AppState = Arc<ServerState>;

/// Shared state behind every handler.
pub struct ServerState {
    db_path: PathBuf,
    read_only: bool,
    assets_dir: Option<PathBuf>,
    allow_origins: Vec<String>,
}

impl ServerState {
    /// Captures the parts of [`ServeOptions`] the handlers need.
    pub fn new(options: ServeOptions) -> ServerState {
        ServerState {
            db_path: options.db_path,
            read_only: options.read_only,
            assets_dir: options.assets_dir,
            allow_origins: options.allow_origins,
        }
    }

    pub(crate) fn read_only(&self) -> bool {
        self.read_only
    }

    pub(crate) fn db_path(&self) -> PathBuf {
        self.db_path.clone()
    }

    /// Handlers open a fresh connection per request and do their store
    /// work on the blocking pool. Missing files are an error here; serving
    /// an empty catalog by accident helps nobody.
    pub(crate) fn open_catalog(&self) -> Result<Catalog, CatalogError> {
        Catalog::open(&self.db_path, &OpenOptions::existing())
    }
}

/// Starts the catalog server and runs until shutdown.
pub async fn serve(options: ServeOptions) -> Result<(), ServeError> {
    install_tracing_subscriber();

    let (host, port) = options.socket_parts();
    let state = Arc::new(ServerState::new(options));
    state.open_catalog().map(drop)?;

    let app = build_router(state.clone());
    let addr = SocketAddr::from((host, port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        db_path = %state.db_path.display(),
        read_only = state.read_only,
        assets_dir = ?state.assets_dir,
        allow_origins = ?state.allow_origins,
        "catalog service listening"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Builds the full application router. Exposed so tests can drive the
/// service without binding a socket.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.allow_origins);

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/rpc/:procedure",
            get(rpc::query_handler).post(rpc::mutation_handler),
        )
        .route("/", get(pages::index))
        .route("/browse/:catalog", get(pages::browse));

    if let Some(dir) = state.assets_dir.clone() {
        router = router.nest_service("/assets", ServeDir::new(dir));
    } else {
        #[cfg(feature = "bundled-assets")]
        {
            router = router.route("/assets/*path", get(pages::bundled_asset));
        }
    }

    if let Some(layer) = cors {
        router = router.layer(layer);
    }

    router.with_state(state).layer(TraceLayer::new_for_http())
}

fn build_cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let mut allowed = Vec::new();
    for origin in origins {
        let normalized = normalize_origin(origin);
        match normalized
            .as_deref()
            .and_then(|value| HeaderValue::from_str(value).ok())
        {
            Some(value) => allowed.push(value),
            None => {
                tracing::warn!(%origin, ?normalized, "ignoring invalid CORS origin");
            }
        }
    }

    if allowed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                ACCEPT,
                CONTENT_TYPE,
                HeaderName::from_static(IDENTITY_HEADER),
            ]),
    )
}

fn normalize_origin(origin: &str) -> Option<String> {
    let trimmed = origin.trim();
    if trimmed.is_empty() {
        return None;
    }
    let without_trailing_slash = trimmed.trim_end_matches('/');
    if without_trailing_slash.is_empty() {
        return None;
    }
    Some(without_trailing_slash.to_string())
}

/// The authenticated user, if the session proxy attached one.
pub(crate) fn identity_from(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(IDENTITY_HEADER)?;
    let value = value.to_str().ok()?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        read_only: state.read_only,
    })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    read_only: bool,
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(?err, "failed to listen for shutdown signal"),
    }
}

/// Idempotent tracing setup shared by `serve` and the CLI.
pub fn install_tracing_subscriber() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt().with_env_filter(filter).try_init();
    });
}
