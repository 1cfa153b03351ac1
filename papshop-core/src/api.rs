//! REST API client for the shop backend
//!
//! Every authorized call reads the token store right before it is sent and
//! attaches `Authorization: Bearer <token>` when a token is present. Without
//! one the header is simply left off and the backend decides. There is no
//! retry, refresh or queueing here.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ApiConfig;
use crate::token::TokenStore;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server returned HTTP {status}: {path}")]
    Status { status: u16, path: String },

    #[error("{0} cannot be deleted")]
    Unsupported(Resource),
}

impl ApiError {
    /// Whether the backend rejected the caller's token or role
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

/// Login request body
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email_or_phone_or_username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email_or_phone_or_username: identifier.into(),
            password: password.into(),
        }
    }
}

/// Remote authentication endpoints used by the session
#[allow(async_fn_in_trait)]
pub trait AuthApi {
    /// Exchange credentials for a bearer token
    async fn login(&self, credentials: &Credentials) -> Result<String, ApiError>;

    /// Invalidate the current token on the server
    async fn logout(&self) -> Result<(), ApiError>;
}

/// Admin listings backing the console screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    DashboardStats,
    Products,
    Categories,
    Orders,
    Users,
    Announcements,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::DashboardStats,
        Resource::Products,
        Resource::Categories,
        Resource::Orders,
        Resource::Users,
        Resource::Announcements,
    ];

    /// Listing endpoint, relative to the API base URL
    pub fn list_path(self) -> &'static str {
        match self {
            Resource::DashboardStats => "/dashboard/stats",
            Resource::Products => "/products",
            Resource::Categories => "/category",
            Resource::Orders => "/orders/admin/all",
            Resource::Users => "/user",
            Resource::Announcements => "/announcements",
        }
    }

    /// Delete endpoint for one record, if the backend offers one
    pub fn delete_path(self, id: u64) -> Option<String> {
        match self {
            Resource::Products => Some(format!("/products/{}", id)),
            Resource::Categories => Some(format!("/category/{}", id)),
            Resource::Users => Some(format!("/user/admin/{}", id)),
            Resource::Announcements => Some(format!("/announcements/{}", id)),
            Resource::DashboardStats | Resource::Orders => None,
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Resource::DashboardStats => "dashboard stats",
            Resource::Products => "products",
            Resource::Categories => "categories",
            Resource::Orders => "orders",
            Resource::Users => "users",
            Resource::Announcements => "announcements",
        };
        f.write_str(name)
    }
}

/// Backend API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Create a client against `base_url` (e.g. `http://localhost:8080/api`)
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_client(Client::new(), base_url, tokens)
    }

    pub fn with_client(client: Client, base_url: &str, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn from_config(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, &config.base_url, tokens))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a listing as untyped JSON
    pub async fn fetch(&self, resource: Resource) -> Result<serde_json::Value, ApiError> {
        let path = resource.list_path();
        let resp = self.authed_request(Method::GET, path).send().await?;
        let resp = Self::check_status(resp, path)?;
        Ok(resp.json().await?)
    }

    /// Delete a single record
    pub async fn delete(&self, resource: Resource, id: u64) -> Result<(), ApiError> {
        let path = resource.delete_path(id).ok_or(ApiError::Unsupported(resource))?;
        let resp = self.authed_request(Method::DELETE, &path).send().await?;
        Self::check_status(resp, &path)?;
        Ok(())
    }

    /// Build a request carrying the bearer token, if one is stored
    pub fn authed_request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, self.url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        match self.tokens.get() {
            Ok(Some(token)) => {
                tracing::debug!("Attaching bearer token to {}", path);
                req = req.bearer_auth(token);
            }
            Ok(None) => tracing::debug!("No token stored, sending {} without authorization", path),
            Err(e) => tracing::warn!("Failed to read token for {}: {}", path, e),
        }

        req
    }

    // Private helpers

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check_status(resp: Response, path: &str) -> Result<Response, ApiError> {
        match resp.status() {
            s if s.is_success() => Ok(resp),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ApiError::Unauthorized(path.to_string()))
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(path.to_string())),
            s => Err(ApiError::Status {
                status: s.as_u16(),
                path: path.to_string(),
            }),
        }
    }
}

impl AuthApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let path = "/user/login";
        tracing::debug!("Making login request to {}", self.url(path));

        let resp = self.client.post(self.url(path)).json(credentials).send().await?;
        let resp = Self::check_status(resp, path)?;
        Ok(resp.text().await?)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let path = "/user/logout";
        let resp = self
            .authed_request(Method::POST, path)
            .body("{}")
            .send()
            .await?;
        Self::check_status(resp, path)?;
        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MemoryTokenStore;

    fn client(base_url: &str, store: MemoryTokenStore) -> ApiClient {
        ApiClient::new(base_url, Arc::new(store))
    }

    #[test]
    fn test_url_normalization() {
        let api = client("http://localhost:8080/api/", MemoryTokenStore::new());
        assert_eq!(api.base_url(), "http://localhost:8080/api");
        assert_eq!(api.url("/products"), "http://localhost:8080/api/products");
    }

    #[test]
    fn test_bearer_header_attached_when_token_present() {
        let api = client("http://localhost:8080/api", MemoryTokenStore::with_token("a.b.c"));
        let req = api.authed_request(Method::GET, "/user").build().unwrap();

        assert_eq!(req.headers()["authorization"], "Bearer a.b.c");
        assert_eq!(req.headers()["content-type"], "application/json");
        assert_eq!(req.url().as_str(), "http://localhost:8080/api/user");
    }

    #[test]
    fn test_no_header_without_token() {
        let api = client("http://localhost:8080/api", MemoryTokenStore::new());
        let req = api.authed_request(Method::GET, "/user").build().unwrap();
        assert!(req.headers().get("authorization").is_none());
    }

    #[test]
    fn test_token_read_on_every_request() {
        let store = Arc::new(MemoryTokenStore::new());
        let api = ApiClient::new("http://localhost:8080/api", store.clone());

        store.set("first.token.x").unwrap();
        let req = api.authed_request(Method::GET, "/orders").build().unwrap();
        assert_eq!(req.headers()["authorization"], "Bearer first.token.x");

        store.clear().unwrap();
        let req = api.authed_request(Method::GET, "/orders").build().unwrap();
        assert!(req.headers().get("authorization").is_none());
    }

    #[test]
    fn test_credentials_wire_format() {
        let json = serde_json::to_value(Credentials::new("admin@pap.com", "admin123")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"emailOrPhoneOrUsername": "admin@pap.com", "password": "admin123"})
        );
    }

    #[test]
    fn test_resource_paths() {
        assert_eq!(Resource::Orders.list_path(), "/orders/admin/all");
        assert_eq!(Resource::Users.delete_path(7).as_deref(), Some("/user/admin/7"));
        assert_eq!(Resource::Orders.delete_path(7), None);
        assert_eq!(Resource::DashboardStats.delete_path(1), None);
    }
}
