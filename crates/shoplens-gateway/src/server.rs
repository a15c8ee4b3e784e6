//! HTTP server.

use crate::advice::AdviceGenerator;
use crate::error::GatewayError;
use crate::handlers;
use crate::notify::Notifier;
use crate::report::PdfRenderer;
use crate::Result;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use shoplens_core::config::ServerConfig;
use shoplens_store::{Database, HistoryStore, SettingsStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared, immutable services behind every request.
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub settings: SettingsStore,
    pub history: HistoryStore,
    pub advisor: Arc<dyn AdviceGenerator>,
    pub notifier: Arc<dyn Notifier>,
    pub renderer: Arc<dyn PdfRenderer>,
}

/// The HTTP API server.
pub struct Gateway {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Gateway {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Run the server until the process is stopped.
    pub async fn run(&self) -> Result<()> {
        let addr = self.bind_address()?;

        if !addr.ip().is_loopback() {
            warn!("========================================");
            warn!("  Gateway binding to {}", addr);
            warn!("  The API is reachable from the network and has no authentication.");
            warn!("========================================");
        }

        let app = self.router();
        info!("Starting gateway server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        Ok(())
    }

    /// Build the router with its middleware.
    pub fn router(&self) -> Router {
        let mut router = routes(self.state.clone()).layer(TraceLayer::new_for_http());

        if self.config.cors {
            router = router.layer(cors_layer(&self.config));
        }

        router
    }

    fn bind_address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.config.bind, self.config.port)
            .parse()
            .map_err(|e| {
                GatewayError::InvalidRequest(format!(
                    "invalid bind address {}:{}: {e}",
                    self.config.bind, self.config.port
                ))
            })
    }
}

/// The API routes without middleware.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/user-settings", post(handlers::save_settings))
        .route("/api/user-settings/:user_id", get(handlers::get_settings))
        .route("/api/get-api-key/:user_id/:key_type", get(handlers::get_api_key))
        .route("/api/save-history", post(handlers::save_history))
        .route("/api/history", get(handlers::list_history))
        .route("/api/generate-pdf", post(handlers::generate_pdf))
        .with_state(state)
}

/// Any origin when no allowlist is configured, otherwise only the listed
/// origins.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}
