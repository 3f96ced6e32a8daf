//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness
//! GET    /health/ready         - Database readiness
//!
//! # Products
//! GET    /products?all=true    - Public listing (ACTIVE only)
//! GET    /products             - Caller's own products (auth)
//! POST   /products             - Create product (auth)
//! GET    /products/{id}        - Product detail
//! PUT    /products/{id}        - Update product (owner)
//! DELETE /products/{id}        - Delete product (owner)
//! GET    /top-5-products       - Featured strip
//!
//! # Users
//! GET    /users                - User listing (admin)
//!
//! # Auth
//! POST   /register             - Create account, set token cookie
//! POST   /login                - Sign in, set token cookie
//! POST   /logout               - Clear token cookie
//! ```
//!
//! Both listings accept `page`, `pageSize` and `search` and answer
//! `{"<entities>": [...], "pagination": {total, page, pageSize, pageCount}}`.

pub mod auth;
pub mod health;
pub mod products;
pub mod users;

use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use emporium_core::{ListingRequest, DEFAULT_PAGE_SIZE};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Every route, without state or middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/top-5-products", get(products::top_products))
        .route("/users", get(users::list_users))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

// =============================================================================
// Listing Query
// =============================================================================

/// Raw listing query string. Values stay strings so a non-numeric page is a
/// 400 with our error body rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub search: Option<String>,
    pub all: Option<String>,
}

impl ListingQuery {
    /// Validated request; absent or blank values take their defaults.
    pub fn to_request(&self) -> ApiResult<ListingRequest> {
        let page = parse_int("page", self.page.as_deref(), 1)?;
        let page_size = parse_int("pageSize", self.page_size.as_deref(), DEFAULT_PAGE_SIZE as i64)?;
        let search = self.search.as_deref().unwrap_or("");

        Ok(ListingRequest::new(page, page_size, search)?)
    }

    /// `all=true` selects the public storefront listing.
    pub fn wants_public(&self) -> bool {
        self.all
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

fn parse_int(name: &str, value: Option<&str>, default: i64) -> ApiResult<i64> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("{} must be an integer", name))),
    }
}

/// Parses a `{id}` path segment.
pub(crate) fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid product ID".to_string()))
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use emporium_core::{NewProduct, NewUser, Product, ProductStatus, User};
    use emporium_db::{Database, DbConfig};

    use crate::config::{ApiConfig, DEV_TOKEN_SECRET};
    use crate::state::AppState;

    pub async fn test_app() -> (Router, AppState) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = ApiConfig {
            http_port: 0,
            bind_addr: "127.0.0.1".to_string(),
            database_path: ":memory:".into(),
            database_max_connections: 1,
            token_secret: DEV_TOKEN_SECRET.to_string(),
            token_lifetime_secs: 3600,
            cookie_secure: false,
        };
        let state = AppState::new(db, config);
        (crate::build_router(state.clone()), state)
    }

    /// Sends one request; the body is parsed as JSON when possible.
    pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, headers, body)
    }

    pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    pub fn json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    /// Inserts a user directly (placeholder hash) and mints a token for it.
    pub async fn user_with_token(state: &AppState, name: &str, is_admin: bool) -> (User, String) {
        let user = state
            .db()
            .users()
            .insert(&NewUser {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                password_hash: "unused".to_string(),
                is_admin,
            })
            .await
            .unwrap();
        let token = state.jwt().generate_token(&user).unwrap();
        (user, token)
    }

    pub async fn product(state: &AppState, owner: i64, name: &str, status: ProductStatus) -> Product {
        state
            .db()
            .products()
            .insert(
                owner,
                &NewProduct {
                    name: name.to_string(),
                    description: Some(format!("About {}", name)),
                    category: "Kitchen".to_string(),
                    price_cents: 999,
                    stock: 5,
                    status,
                    image: None,
                },
            )
            .await
            .unwrap()
    }
}
