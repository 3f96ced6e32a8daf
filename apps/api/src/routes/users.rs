//! Admin user listing.

use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;

use emporium_core::{ListingError, Pagination, User};

use super::ListingQuery;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// One page of users.
#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

/// `GET /users` - admins only.
///
/// The admin flag is re-read from the database so a revoked admin loses
/// access before their token expires.
pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<UserPage>> {
    let account = state
        .db()
        .users()
        .get_by_id(caller.user_id()?)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;
    if !account.is_admin {
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    let request = query.to_request()?;
    let page = state
        .db()
        .users()
        .list(&request)
        .await
        .map_err(ListingError::from)?;

    Ok(Json(UserPage {
        pagination: page.pagination(),
        users: page.items,
    }))
}
