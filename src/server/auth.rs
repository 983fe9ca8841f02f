//! Shared-secret authentication for the conversion endpoint.
//!
//! When a secret is configured, requests to `/convert` must carry it in the
//! `X-Docling-Key` header:
//!
//! ```text
//! curl -H "X-Docling-Key: $DOCLING_KEY" -F file=@report.pdf http://localhost:8000/convert
//! ```
//!
//! The middleware runs before the request body is read, so rejected requests
//! never reach the converter or the filesystem. Keys are compared in constant
//! time.
//!
//! # Example
//!
//! ```rust
//! use docling_gateway::server::auth::SharedSecretAuth;
//!
//! let auth = SharedSecretAuth::new("my-secret-key");
//! assert!(auth.verify(Some(b"my-secret-key")).is_ok());
//! assert!(auth.verify(Some(b"wrong")).is_err());
//! assert!(auth.verify(None).is_err());
//! ```

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::handlers::ErrorResponse;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-docling-key";

// =============================================================================
// Types
// =============================================================================

/// Authentication error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The key header is absent
    MissingKey,

    /// The key header does not match the configured secret
    InvalidKey,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingKey => write!(f, "Missing {} header", API_KEY_HEADER),
            AuthError::InvalidKey => write!(f, "Invalid {} header", API_KEY_HEADER),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::FORBIDDEN;

        // A wrong key may be a probing client; a missing one is usually a
        // misconfigured caller.
        match &self {
            AuthError::InvalidKey => {
                warn!(
                    error_type = "forbidden",
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    self
                );
            }
            AuthError::MissingKey => {
                debug!(
                    error_type = "forbidden",
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    self
                );
            }
        }

        // Both cases look identical to the client
        let error_response = ErrorResponse::with_status("forbidden", "forbidden", status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Shared Secret Authentication
// =============================================================================

/// Authenticator comparing a request header against a pre-shared secret.
#[derive(Clone)]
pub struct SharedSecretAuth {
    secret: Vec<u8>,
}

impl std::fmt::Debug for SharedSecretAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretAuth")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SharedSecretAuth {
    /// Create a new authenticator with the given secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Check a provided key against the secret.
    ///
    /// `None` means the header was not sent.
    pub fn verify(&self, provided: Option<&[u8]>) -> Result<(), AuthError> {
        let provided = provided.ok_or(AuthError::MissingKey)?;

        if provided.ct_eq(&self.secret).into() {
            Ok(())
        } else {
            Err(AuthError::InvalidKey)
        }
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware rejecting requests without the shared secret with 403.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware, routing::post};
/// use docling_gateway::server::auth::{SharedSecretAuth, auth_middleware};
///
/// let auth = SharedSecretAuth::new("secret-key");
/// let app = Router::new()
///     .route("/convert", post(convert_handler))
///     .layer(middleware::from_fn_with_state(auth, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(auth): State<SharedSecretAuth>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|value| value.as_bytes());
    auth.verify(provided)?;

    Ok(next.run(request).await)
}

// =============================================================================
// Tests
// =============================================================================
