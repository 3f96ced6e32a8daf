//! Register, login and logout.
//!
//! Both register and login answer with the user and a session token, and set
//! the same token as an HTTP-only cookie.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use emporium_core::validation::{validate_email, validate_password, validate_username};
use emporium_core::{NewUser, User, ValidationError};

use crate::auth::{clear_cookie, hash_password, session_cookie, verify_password};
use crate::error::{ApiError, ApiJson, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub repeat_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    /// Email or username.
    pub identifier: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Builds the response carrying the token in the body and the cookie.
fn signed_in(state: &AppState, status: StatusCode, user: User) -> ApiResult<Response> {
    let token = state.jwt().generate_token(&user)?;
    let cookie = session_cookie(
        &token,
        state.jwt().lifetime_secs(),
        state.config().cookie_secure,
    );

    Ok((
        status,
        [(SET_COOKIE, cookie)],
        Json(AuthResponse { user, token }),
    )
        .into_response())
}

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> ApiResult<Response> {
    let (Some(username), Some(email), Some(password), Some(repeat)) = (
        present(input.username),
        present(input.email),
        present(input.password),
        present(input.repeat_password),
    ) else {
        return Err(ApiError::BadRequest("All fields are required".to_string()));
    };

    if password != repeat {
        return Err(ValidationError::Mismatch {
            field: "password".to_string(),
        }
        .into());
    }

    let username = username.trim().to_string();
    let email = email.trim().to_string();
    validate_username(&username)?;
    validate_email(&email)?;
    validate_password(&password)?;

    let users = state.db().users();
    if users.exists(&username, &email).await? {
        return Err(ApiError::Conflict(
            "Username or email already in use".to_string(),
        ));
    }

    let new_user = NewUser {
        username,
        email,
        password_hash: hash_password(&password)?,
        is_admin: false,
    };
    new_user.validate()?;

    // A concurrent registration can still win the race; the UNIQUE index
    // turns that into a 409 as well
    let user = users.insert(&new_user).await?;
    info!(user_id = user.id, username = %user.username, "User registered");

    signed_in(&state, StatusCode::CREATED, user)
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> ApiResult<Response> {
    let (Some(identifier), Some(password)) = (present(input.identifier), input.password) else {
        return Err(ApiError::BadRequest("Missing fields".to_string()));
    };

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let (user, hash) = state
        .db()
        .users()
        .find_by_identifier(&identifier)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&password, &hash) {
        warn!(user_id = user.id, "Failed login attempt");
        return Err(invalid());
    }

    info!(user_id = user.id, "User logged in");
    signed_in(&state, StatusCode::OK, user)
}

/// `POST /logout`
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(SET_COOKIE, clear_cookie(state.config().cookie_secure))],
        Json(json!({ "success": true })),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::header::SET_COOKIE;
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{json as json_request, send, test_app};

    fn register_body(username: &str, email: &str) -> serde_json::Value {
        json!({
            "username": username,
            "email": email,
            "password": "password123",
            "repeatPassword": "password123"
        })
    }

    #[tokio::test]
    async fn test_register_login_and_use_cookie() {
        let (app, _) = test_app().await;

        let (status, headers, body) = send(
            &app,
            json_request("POST", "/register", None, register_body("nina", "nina@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["username"], "nina");
        assert_eq!(body["user"]["isAdmin"], false);
        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));

        // Login by email, then by username
        let (status, headers, body) = send(
            &app,
            json_request(
                "POST",
                "/login",
                None,
                json!({"identifier": "nina@example.com", "password": "password123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();
        assert!(headers.get(SET_COOKIE).is_some());

        let (status, _, _) = send(
            &app,
            json_request(
                "POST",
                "/login",
                None,
                json!({"identifier": "nina", "password": "password123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // The cookie alone authenticates
        let request = axum::http::Request::builder()
            .uri("/products")
            .header("cookie", format!("theme=dark; token={}", token))
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn test_register_rejections() {
        let (app, _) = test_app().await;

        let (status, _, body) = send(
            &app,
            json_request("POST", "/register", None, json!({"username": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "All fields are required");

        let mut mismatch = register_body("omar", "omar@example.com");
        mismatch["repeatPassword"] = json!("password124");
        let (status, _, _) = send(&app, json_request("POST", "/register", None, mismatch)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(
            &app,
            json_request("POST", "/register", None, register_body("omar", "not-an-email")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(&app, json_request("POST", "/register", None, json!("nope"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let (app, _) = test_app().await;
        let (status, _, _) = send(
            &app,
            json_request("POST", "/register", None, register_body("pia", "pia@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _, body) = send(
            &app,
            json_request("POST", "/register", None, register_body("pia2", "PIA@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Username or email already in use");
    }

    #[tokio::test]
    async fn test_login_rejections() {
        let (app, _) = test_app().await;
        send(
            &app,
            json_request("POST", "/register", None, register_body("quinn", "quinn@example.com")),
        )
        .await;

        let (status, _, body) = send(
            &app,
            json_request("POST", "/login", None, json!({"identifier": "quinn", "password": "wrong-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");

        let (status, _, _) = send(
            &app,
            json_request("POST", "/login", None, json!({"identifier": "nobody", "password": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = send(&app, json_request("POST", "/login", None, json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let (app, _) = test_app().await;
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/logout")
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, headers, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(headers
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
    }
}
