//! Router configuration for the conversion gateway.
//!
//! This module defines the HTTP routes and applies middleware for
//! authentication, upload limits and CORS.
//!
//! # Route Structure
//!
//! ```text
//! /health     - Health check (public)
//! /convert    - Document conversion (protected when a secret is configured)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docling_gateway::convert::ConversionService;
//! use docling_gateway::converter::DoclingCliConverter;
//! use docling_gateway::server::routes::{create_router, RouterConfig};
//!
//! let service = ConversionService::new(DoclingCliConverter::default());
//! let config = RouterConfig::new("my-secret-key")
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use http::header::{HeaderName, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, SharedSecretAuth, API_KEY_HEADER};
use super::handlers::{convert_handler, health_handler, AppState};
use crate::convert::ConversionService;
use crate::converter::DocumentConverter;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Shared secret required on `/convert` (None = open access)
    pub api_key: Option<String>,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Maximum request body size for uploads (None = unlimited)
    pub max_upload_bytes: Option<usize>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl std::fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterConfig")
            .field("auth_enabled", &self.auth_enabled())
            .field("cors_origins", &self.cors_origins)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("enable_tracing", &self.enable_tracing)
            .finish()
    }
}

impl RouterConfig {
    /// Create a router configuration requiring the given shared secret.
    ///
    /// An empty secret disables authentication.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::without_auth().with_api_key(Some(api_key.into()))
    }

    /// Create a configuration with authentication disabled.
    ///
    /// **Warning**: every client can submit documents for conversion.
    pub fn without_auth() -> Self {
        Self {
            api_key: None,
            cors_origins: None,
            max_upload_bytes: None,
            enable_tracing: true,
        }
    }

    /// Set or clear the shared secret. Empty secrets count as unset.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.is_empty());
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Limit upload request bodies to `bytes` (None = unlimited).
    pub fn with_max_upload_bytes(mut self, bytes: Option<usize>) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Whether `/convert` requires the shared secret.
    pub fn auth_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Public health route
/// - Conversion route, behind the shared-secret middleware when configured
/// - Upload body limit
/// - CORS configuration
/// - Request tracing (optional)
pub fn create_router<C>(service: ConversionService<C>, config: RouterConfig) -> Router
where
    C: DocumentConverter + 'static,
{
    let app_state = AppState::new(service);
    let cors = build_cors_layer(&config);

    let body_limit = match config.max_upload_bytes {
        Some(bytes) => DefaultBodyLimit::max(bytes),
        None => DefaultBodyLimit::disable(),
    };

    let mut convert_routes = Router::new()
        .route("/convert", post(convert_handler::<C>))
        .layer(body_limit)
        .with_state(app_state);

    // Auth runs before the body is read, so rejected uploads never touch disk
    if let Some(ref api_key) = config.api_key {
        convert_routes = convert_routes.layer(middleware::from_fn_with_state(
            SharedSecretAuth::new(api_key),
            auth_middleware,
        ));
    }

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(convert_routes)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
