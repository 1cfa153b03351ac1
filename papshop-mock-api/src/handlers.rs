//! HTTP handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::auth::{self, Claims};
use crate::state::{Collection, MockState};

pub type SharedState = Arc<RwLock<MockState>>;

type HandlerResult<T> = Result<T, (StatusCode, &'static str)>;

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "papshop-mock-api"
    }))
}

/// Login request body
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    email_or_phone_or_username: String,
    password: String,
}

/// Credentials in, plain-text token out
///
/// The state lock is released before the password hash is checked, and the
/// check itself runs on the blocking pool.
pub async fn login_handler(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> HandlerResult<String> {
    let identifier = req.email_or_phone_or_username;
    let account = state.read().await.find_account(&identifier).cloned();
    let Some(account) = account else {
        tracing::warn!("Login failed for {}: unknown account", identifier);
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials"));
    };

    let password = req.password;
    let hash = account.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
        .await
        .map_err(|e| {
            tracing::error!("Password check task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
        })?;

    if let Err(e) = verified {
        tracing::warn!("Login failed for {}: {}", identifier, e);
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }

    let token = state.read().await.issue_for(&account).map_err(|e| {
        tracing::error!("Failed to issue token for {}: {}", identifier, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
    })?;

    tracing::info!("Issued token for {}", identifier);
    Ok(token)
}

/// Revoke the presented token
pub async fn logout_handler(State(state): State<SharedState>, headers: HeaderMap) -> HandlerResult<&'static str> {
    let token = bearer_token(&headers).ok_or((StatusCode::UNAUTHORIZED, "Missing token"))?;

    let mut s = state.write().await;
    let claims = s.verify(token).ok_or((StatusCode::UNAUTHORIZED, "Invalid token"))?;
    s.revoke(token);

    tracing::info!("{} logged out", claims.sub);
    Ok("Logged out successfully")
}

pub async fn dashboard_stats(State(state): State<SharedState>, headers: HeaderMap) -> HandlerResult<Json<Value>> {
    let s = state.read().await;
    require_admin(&s, &headers)?;
    Ok(Json(s.stats()))
}

pub async fn list_products(state: State<SharedState>, headers: HeaderMap) -> HandlerResult<Json<Value>> {
    list(state, headers, Collection::Products).await
}

pub async fn list_categories(state: State<SharedState>, headers: HeaderMap) -> HandlerResult<Json<Value>> {
    list(state, headers, Collection::Categories).await
}

pub async fn list_orders(state: State<SharedState>, headers: HeaderMap) -> HandlerResult<Json<Value>> {
    list(state, headers, Collection::Orders).await
}

pub async fn list_users(state: State<SharedState>, headers: HeaderMap) -> HandlerResult<Json<Value>> {
    list(state, headers, Collection::Users).await
}

pub async fn list_announcements(state: State<SharedState>, headers: HeaderMap) -> HandlerResult<Json<Value>> {
    list(state, headers, Collection::Announcements).await
}

pub async fn delete_product(state: State<SharedState>, headers: HeaderMap, id: Path<u64>) -> HandlerResult<&'static str> {
    remove(state, headers, Collection::Products, id).await
}

pub async fn delete_category(state: State<SharedState>, headers: HeaderMap, id: Path<u64>) -> HandlerResult<&'static str> {
    remove(state, headers, Collection::Categories, id).await
}

pub async fn delete_user(state: State<SharedState>, headers: HeaderMap, id: Path<u64>) -> HandlerResult<&'static str> {
    remove(state, headers, Collection::Users, id).await
}

pub async fn delete_announcement(state: State<SharedState>, headers: HeaderMap, id: Path<u64>) -> HandlerResult<&'static str> {
    remove(state, headers, Collection::Announcements, id).await
}

// Private helpers

async fn list(
    State(state): State<SharedState>,
    headers: HeaderMap,
    collection: Collection,
) -> HandlerResult<Json<Value>> {
    let s = state.read().await;
    require_admin(&s, &headers)?;
    Ok(Json(Value::Array(s.list(collection))))
}

async fn remove(
    State(state): State<SharedState>,
    headers: HeaderMap,
    collection: Collection,
    Path(id): Path<u64>,
) -> HandlerResult<&'static str> {
    let mut s = state.write().await;
    let claims = require_admin(&s, &headers)?;

    if s.remove(collection, id) {
        tracing::info!("{} deleted {:?} #{}", claims.sub, collection, id);
        Ok("Deleted")
    } else {
        Err((StatusCode::NOT_FOUND, "Not found"))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// 401 without a valid token, 403 for non-admin roles
fn require_admin(state: &MockState, headers: &HeaderMap) -> HandlerResult<Claims> {
    let token = bearer_token(headers).ok_or((StatusCode::UNAUTHORIZED, "Missing token"))?;
    let claims = state
        .verify(token)
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid token"))?;

    if claims.scope != papshop_core::ADMIN_ROLE {
        return Err((StatusCode::FORBIDDEN, "Admin role required"));
    }
    Ok(claims)
}
