//! papshop-core: client library for the PAP Shop admin console
//!
//! This crate provides:
//! - Persistent bearer token storage
//! - Advisory role decoding from the token payload
//! - Session context with an observable logged-in flag
//! - Authenticated REST client for the shop backend
//! - Route guard and login form state machine

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod login;
pub mod session;
pub mod token;

pub use api::{ApiClient, ApiError, AuthApi, Credentials, Resource};
pub use auth::{Claims, RoleState, ADMIN_ROLE};
pub use config::Config;
pub use guard::{GuardDecision, Navigator, Route, RouteGuard};
pub use login::{LoginForm, LoginOutcome, LoginState};
pub use session::{LogoutOutcome, Session, SessionError};
pub use token::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore};

/// Default port of the shop backend
pub const DEFAULT_API_PORT: u16 = 8080;
