//! # Emporium API
//!
//! JSON HTTP server for the storefront: product catalogue, owner product
//! management, admin user listing and cookie/bearer sessions.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Emporium API Server                            │
//! │                                                                         │
//! │  Browser ───► axum (3000) ───► routes ───► emporium-db ───► SQLite      │
//! │     ▲                            │                                      │
//! │     │                            ▼                                      │
//! │     └──── token cookie ◄──── JwtManager                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (see [`ApiConfig::load`]):
//! - `EMPORIUM_HTTP_PORT` - HTTP port (default: 3000)
//! - `EMPORIUM_BIND_ADDR` - Bind address (default: 0.0.0.0)
//! - `DATABASE_PATH` - SQLite file (default: ./emporium.db)
//! - `TOKEN_SECRET` - HS256 signing secret, at least 32 bytes
//! - `TOKEN_LIFETIME_SECS` - Session lifetime (default: 604800)
//! - `COOKIE_SECURE` - Mark the session cookie `Secure`

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the full application router with state and middleware applied.
pub fn build_router(state: AppState) -> Router {
    routes::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
