//! # Listing Client
//!
//! HTTP client for the two paginated listing endpoints.
//!
//! ## Response Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Canonical (current API)                                                │
//! │    { "products": [...],                                                 │
//! │      "pagination": { "total", "page", "pageSize", "pageCount" } }      │
//! │                                                                         │
//! │  Legacy flat (older admin endpoint)                                     │
//! │    { "users": [...], "totalUsers": 42, "totalPages": 5 }               │
//! │                                                                         │
//! │  Both are normalized here into ListingResult<T>; nothing past this     │
//! │  module sees the wire shape.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use emporium_core::listing::page_count;
use emporium_core::{ListingRequest, ListingResult, Product, User};

use crate::error::{error_message, ClientError, ClientResult};

// =============================================================================
// Listing Source
// =============================================================================

/// Anything that can answer a listing request.
///
/// [`ListingController`](crate::ListingController) is written against this
/// trait so views can be driven by the HTTP client or by an in-memory source.
#[async_trait]
pub trait ListingSource: Send + Sync {
    type Item: Send + Sync;

    async fn fetch(&self, request: &ListingRequest) -> ClientResult<ListingResult<Self::Item>>;
}

// =============================================================================
// HTTP Client
// =============================================================================

/// Client for `GET /products` and `GET /users`.
///
/// ## Example
/// ```rust,ignore
/// let client = ListingClient::new("http://localhost:3000")?;
/// let page = client.products(&ListingRequest::new(2, 10, "mug")?).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ListingClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl ListingClient {
    /// Creates a client rooted at `base_url` (e.g. `http://localhost:3000`).
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;

        // Url::join replaces the last segment unless the path ends in '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(ListingClient {
            http: Client::new(),
            base,
            token: None,
        })
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Public storefront listing (ACTIVE products only).
    pub async fn products(&self, request: &ListingRequest) -> ClientResult<ListingResult<Product>> {
        self.fetch("products", "products", request, true).await
    }

    /// The signed-in seller's own products, any status. Needs a token.
    pub async fn my_products(
        &self,
        request: &ListingRequest,
    ) -> ClientResult<ListingResult<Product>> {
        self.fetch("products", "products", request, false).await
    }

    /// Admin user listing. Needs an admin token.
    pub async fn users(&self, request: &ListingRequest) -> ClientResult<ListingResult<User>> {
        self.fetch("users", "users", request, false).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        request: &ListingRequest,
        public: bool,
    ) -> ClientResult<ListingResult<T>> {
        request.validate()?;

        let url = self
            .base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))?;

        let mut query = vec![
            ("page", request.page.to_string()),
            ("pageSize", request.page_size.to_string()),
            ("search", request.search.clone()),
        ];
        if public {
            query.push(("all", "true".to_string()));
        }

        debug!(%url, page = request.page, search = %request.search, "Fetching listing");

        let mut builder = self.http.get(url).query(&query);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Listing request failed");
            ClientError::Network(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ClientError::from_status(status.as_u16(), error_message(&body));
            warn!(status = status.as_u16(), error = %err, "Listing endpoint returned an error");
            return Err(err);
        }

        decode_listing(&body, key, request)
    }
}

/// The HTTP client is a listing source for one endpoint at a time.
#[derive(Debug, Clone)]
pub enum Endpoint {
    PublicProducts,
    MyProducts,
    Users,
}

/// A [`ListingClient`] bound to one endpoint.
#[derive(Debug, Clone)]
pub struct RemoteListing<T> {
    client: ListingClient,
    endpoint: Endpoint,
    _item: std::marker::PhantomData<fn() -> T>,
}

impl RemoteListing<Product> {
    pub fn public_products(client: ListingClient) -> Self {
        RemoteListing {
            client,
            endpoint: Endpoint::PublicProducts,
            _item: std::marker::PhantomData,
        }
    }

    pub fn my_products(client: ListingClient) -> Self {
        RemoteListing {
            client,
            endpoint: Endpoint::MyProducts,
            _item: std::marker::PhantomData,
        }
    }
}

impl RemoteListing<User> {
    pub fn users(client: ListingClient) -> Self {
        RemoteListing {
            client,
            endpoint: Endpoint::Users,
            _item: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl ListingSource for RemoteListing<Product> {
    type Item = Product;

    async fn fetch(&self, request: &ListingRequest) -> ClientResult<ListingResult<Product>> {
        match self.endpoint {
            Endpoint::MyProducts => self.client.my_products(request).await,
            _ => self.client.products(request).await,
        }
    }
}

#[async_trait]
impl ListingSource for RemoteListing<User> {
    type Item = User;

    async fn fetch(&self, request: &ListingRequest) -> ClientResult<ListingResult<User>> {
        self.client.users(request).await
    }
}

// =============================================================================
// Response Adapter
// =============================================================================

/// The canonical `pagination` object. Every field is optional so a partial
/// object still decodes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePagination {
    total: Option<u64>,
    page: Option<u32>,
    page_size: Option<u32>,
    page_count: Option<u32>,
}

/// Legacy flat total fields, most specific first.
const LEGACY_TOTAL_FIELDS: &[&str] = &["totalUsers", "totalProducts", "total"];

/// Normalizes a listing body into a [`ListingResult`].
///
/// Items are read from `key` (`"products"`, `"users"`) or `"items"`. The
/// total comes from `pagination.total` or a legacy flat total field; page and
/// page size fall back to what was requested. `page_count` is always
/// recomputed from total and page size, so a stale `totalPages` cannot
/// disagree with `total`.
///
/// ## Errors
/// `ClientError::Decode` when the body is not an object, the item array is
/// missing or malformed, or no total is present in either shape.
pub fn decode_listing<T: DeserializeOwned>(
    body: &str,
    key: &str,
    request: &ListingRequest,
) -> ClientResult<ListingResult<T>> {
    let mut root: Map<String, Value> =
        serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))?;

    let raw_items = root
        .remove(key)
        .or_else(|| root.remove("items"))
        .ok_or_else(|| ClientError::Decode(format!("missing '{key}' array")))?;
    let items: Vec<T> = serde_json::from_value(raw_items)
        .map_err(|e| ClientError::Decode(format!("'{key}': {e}")))?;

    let pagination = match root.remove("pagination") {
        Some(value) => serde_json::from_value::<WirePagination>(value)
            .map_err(|e| ClientError::Decode(format!("'pagination': {e}")))?,
        None => WirePagination::default(),
    };

    let total = pagination
        .total
        .or_else(|| {
            LEGACY_TOTAL_FIELDS
                .iter()
                .find_map(|field| root.get(*field).and_then(Value::as_u64))
        })
        .ok_or_else(|| ClientError::Decode("no total in response".to_string()))?;

    let page = pagination.page.filter(|p| *p >= 1).unwrap_or(request.page);
    let page_size = pagination
        .page_size
        .filter(|s| *s >= 1)
        .unwrap_or(request.page_size);

    let computed = page_count(total, page_size);
    let reported = pagination
        .page_count
        .or_else(|| root.get("totalPages").and_then(Value::as_u64).map(|p| p as u32));
    if let Some(reported) = reported {
        if reported != computed {
            debug!(reported, computed, total, "Server page count disagrees with total");
        }
    }

    Ok(ListingResult {
        items,
        total,
        page,
        page_size,
        page_count: computed,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
