//! HTTP server layer for the conversion gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │            POST /convert            GET /health                 │
//! │                                                                 │
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────────────────┐ │
//! │  │  handlers   │  │     auth     │  │        routes           │ │
//! │  │ (requests)  │  │(shared secret│  │  (router config)        │ │
//! │  └─────────────┘  └──────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{auth_middleware, AuthError, SharedSecretAuth, API_KEY_HEADER};
pub use handlers::{
    convert_handler, health_handler, AppState, ConvertResponse, ErrorResponse, HealthResponse,
    FILE_FIELD,
};
pub use routes::{create_router, RouterConfig};
