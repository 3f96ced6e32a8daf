//! Product routes: listings, detail, create/update/delete, featured strip.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use emporium_core::{
    ListingError, ListingScope, Money, NewProduct, Pagination, Product, ProductStatus,
    ProductUpdate, ValidationError, FEATURED_PRODUCT_LIMIT,
};

use super::{parse_id, ListingQuery};
use crate::auth::{AuthUser, OptionalAuthUser};
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::state::AppState;

/// Category given to products created without one.
const DEFAULT_CATEGORY: &str = "Uncategorized";

/// One page of products.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

// =============================================================================
// Input
// =============================================================================

/// Product fields as a form posts them: price and stock may arrive as
/// numbers or as strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Value>,
    pub stock: Option<Value>,
    pub status: Option<String>,
    pub image: Option<String>,
}

impl ProductInput {
    /// Full product for creation. Name, price and stock are required.
    pub fn into_new_product(self) -> Result<NewProduct, ValidationError> {
        let price = self.price.as_ref().ok_or_else(|| required("price"))?;
        let stock = self.stock.as_ref().ok_or_else(|| required("stock"))?;

        let product = NewProduct {
            price_cents: parse_price(price)?.cents(),
            stock: parse_stock(stock)?,
            status: self
                .status
                .as_deref()
                .map(str::parse::<ProductStatus>)
                .transpose()?
                .unwrap_or_default(),
            name: self.name.ok_or_else(|| required("name"))?,
            description: self.description,
            category: self
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            image: self.image,
        };
        product.validate()?;
        Ok(product)
    }

    /// Partial update; absent fields are left alone.
    pub fn into_update(self) -> Result<ProductUpdate, ValidationError> {
        let update = ProductUpdate {
            price_cents: self
                .price
                .as_ref()
                .map(parse_price)
                .transpose()?
                .map(|m| m.cents()),
            stock: self.stock.as_ref().map(parse_stock).transpose()?,
            status: self
                .status
                .as_deref()
                .map(str::parse::<ProductStatus>)
                .transpose()?,
            name: self.name,
            description: self.description,
            category: self.category,
            image: self.image,
        };
        update.validate()?;
        Ok(update)
    }
}

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

/// `9.99` or `"9.99"` → 999 cents.
fn parse_price(value: &Value) -> Result<Money, ValidationError> {
    match value {
        Value::Number(n) => Money::parse_decimal(&n.to_string()),
        Value::String(s) => Money::parse_decimal(s),
        _ => Err(ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "expected a number".to_string(),
        }),
    }
}

/// `12` or `"12"` → 12.
fn parse_stock(value: &Value) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidFormat {
        field: "stock".to_string(),
        reason: "expected a whole number".to_string(),
    };
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(invalid),
        Value::String(s) => s.trim().parse().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /products` - public listing with `all=true`, otherwise the caller's own.
pub async fn list_products(
    State(state): State<AppState>,
    OptionalAuthUser(caller): OptionalAuthUser,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<ProductPage>> {
    let scope = if query.wants_public() {
        ListingScope::Public
    } else {
        let claims = caller.ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;
        ListingScope::Owner(claims.user_id()?)
    };
    let request = query.to_request()?;

    let page = state
        .db()
        .products()
        .list(scope, &request)
        .await
        .map_err(ListingError::from)?;

    Ok(Json(ProductPage {
        pagination: page.pagination(),
        products: page.items,
    }))
}

/// `POST /products` - create a product owned by the caller.
pub async fn create_product(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let owner_id = caller.user_id()?;
    let new_product = input.into_new_product()?;

    let product = state.db().products().insert(owner_id, &new_product).await?;
    info!(id = product.id, owner_id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /products/{id}`
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let id = parse_id(&id)?;
    let product = state
        .db()
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;
    Ok(Json(product))
}

/// Loads `id` and checks the caller owns it.
async fn owned_product(state: &AppState, caller: &AuthUser, id: i64) -> ApiResult<Product> {
    let product = state
        .db()
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    if !product.is_owned_by(caller.user_id()?) {
        debug!(id, caller = %caller.0.sub, "Rejected write to someone else's product");
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }
    Ok(product)
}

/// `PUT /products/{id}` - owner only.
pub async fn update_product(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Json<Product>> {
    let id = parse_id(&id)?;
    owned_product(&state, &caller, id).await?;

    let update = input.into_update()?;
    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let product = state.db().products().update(id, &update).await?;
    info!(id, "Product updated");
    Ok(Json(product))
}

/// `DELETE /products/{id}` - owner only.
pub async fn delete_product(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id)?;
    owned_product(&state, &caller, id).await?;

    state.db().products().delete(id).await?;
    info!(id, "Product deleted");
    Ok(Json(json!({ "success": true })))
}

/// `GET /top-5-products` - oldest ACTIVE products first.
pub async fn top_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let products = state
        .db()
        .products()
        .top_active(FEATURED_PRODUCT_LIMIT)
        .await?;
    Ok(Json(products))
}

// =============================================================================
// Unit Tests
// =============================================================================
