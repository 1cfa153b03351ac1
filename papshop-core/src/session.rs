//! Session context shared by the console
//!
//! A [`Session`] owns the token store handle, the decoded role and the
//! "logged in" flag, and is the only thing allowed to change them. The flag
//! is a single-slot broadcast: subscribers see the latest value, not a
//! history of transitions.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::api::{ApiError, AuthApi, Credentials};
use crate::auth::RoleState;
use crate::token::{StoreError, TokenStore};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Login request failed: {0}")]
    Api(#[from] ApiError),

    #[error("Server returned an empty token")]
    EmptyToken,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a logout finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// The server accepted the logout
    Remote,
    /// The server call failed; only the local session was torn down
    LocalOnly,
}

/// Authenticated session state
pub struct Session<A> {
    api: A,
    tokens: Arc<dyn TokenStore>,
    role: RoleState,
    logged_in: watch::Sender<bool>,
}

impl<A: AuthApi> Session<A> {
    /// Restore session state from the persisted token, if any
    pub fn new(api: A, tokens: Arc<dyn TokenStore>) -> Self {
        let token = tokens.get().unwrap_or_else(|e| {
            tracing::warn!("Failed to read persisted token: {}", e);
            None
        });

        let role = RoleState::default();
        if let Some(ref token) = token {
            role.set_from_token(token);
        }

        tracing::info!("Session initialized, has token: {}", token.is_some());
        let (logged_in, _) = watch::channel(token.is_some());

        Self {
            api,
            tokens,
            role,
            logged_in,
        }
    }

    /// Log in with the backend and persist the returned token
    pub async fn login(&self, credentials: &Credentials) -> Result<(), SessionError> {
        let token = self.api.login(credentials).await?;
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }

        self.tokens.set(token)?;
        self.role.set_from_token(token);
        self.logged_in.send_replace(true);

        tracing::info!(
            "Logged in as {} with role {:?}",
            credentials.email_or_phone_or_username,
            self.role.get()
        );
        Ok(())
    }

    /// Log out with the backend, falling back to a local teardown.
    ///
    /// The local session is always cleared, whatever the server says.
    pub async fn logout(&self) -> LogoutOutcome {
        let outcome = match self.api.logout().await {
            Ok(()) => LogoutOutcome::Remote,
            Err(e) => {
                tracing::warn!("Remote logout failed, clearing session locally: {}", e);
                LogoutOutcome::LocalOnly
            }
        };

        self.logout_local();
        outcome
    }

    /// Tear down the session without contacting the server
    pub fn logout_local(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::error!("Failed to remove persisted token: {}", e);
        }
        self.role.clear();
        self.logged_in.send_replace(false);
        tracing::info!("Session cleared");
    }

    pub fn api(&self) -> &A {
        &self.api
    }
}

impl<A> Session<A> {
    /// Current value of the logged-in flag
    pub fn is_logged_in(&self) -> bool {
        *self.logged_in.borrow()
    }

    /// Watch the logged-in flag. The receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.logged_in.subscribe()
    }

    /// Persisted token, re-read from storage
    pub fn token(&self) -> Option<String> {
        match self.tokens.get() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Failed to read token: {}", e);
                None
            }
        }
    }

    pub fn has_token(&self) -> bool {
        self.tokens.has_token()
    }

    /// Role decoded from the current token. Only login and logout change it.
    pub fn role(&self) -> &RoleState {
        &self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Login identifier carried by the stored token, for display
    pub fn username(&self) -> Option<String> {
        self.token()
            .as_deref()
            .and_then(crate::auth::decode_claims)
            .and_then(|claims| claims.sub)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::tests::token_with_payload;
    use crate::token::MemoryTokenStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-process stand-in for the backend
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub login_token: Option<String>,
        pub logout_fails: bool,
        pub login_calls: AtomicUsize,
        pub logout_calls: AtomicUsize,
    }

    impl FakeApi {
        pub(crate) fn issuing(token: impl Into<String>) -> Self {
            Self {
                login_token: Some(token.into()),
                ..Default::default()
            }
        }

        pub(crate) fn rejecting() -> Self {
            Self::default()
        }
    }

    impl AuthApi for FakeApi {
        async fn login(&self, _credentials: &Credentials) -> Result<String, ApiError> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            self.login_token
                .clone()
                .ok_or_else(|| ApiError::Unauthorized("/user/login".to_string()))
        }

        async fn logout(&self) -> Result<(), ApiError> {
            self.logout_calls.fetch_add(1, Ordering::SeqCst);
            if self.logout_fails {
                Err(ApiError::Status {
                    status: 502,
                    path: "/user/logout".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    pub(crate) const ADMIN_TOKEN: &str = "abc.eyJzY29wZSI6IkFETUlOIn0=.sig";

    fn admin_creds() -> Credentials {
        Credentials::new("admin@pap.com", "admin123")
    }

    #[test]
    fn test_restores_from_persisted_token() {
        let store = Arc::new(MemoryTokenStore::with_token(ADMIN_TOKEN));
        let session = Session::new(FakeApi::rejecting(), store);

        assert!(session.is_logged_in());
        assert_eq!(session.role().get(), "ADMIN");
        assert!(session.is_admin());
    }

    #[test]
    fn test_restored_admin_with_numeric_subject() {
        let token = token_with_payload(r#"{"sub":42,"scope":"ADMIN"}"#);
        let session = Session::new(FakeApi::rejecting(), Arc::new(MemoryTokenStore::with_token(&token)));

        assert!(session.is_admin());
        assert_eq!(session.username(), None);
    }

    #[test]
    fn test_starts_logged_out_without_token() {
        let session = Session::new(FakeApi::rejecting(), Arc::new(MemoryTokenStore::new()));
        assert!(!session.is_logged_in());
        assert_eq!(session.role().get(), "");
    }

    #[tokio::test]
    async fn test_login_persists_token_and_role() {
        let store = Arc::new(MemoryTokenStore::new());
        let session = Session::new(FakeApi::issuing(ADMIN_TOKEN), store.clone());
        let rx = session.subscribe();

        session.login(&admin_creds()).await.unwrap();

        assert_eq!(store.get().unwrap().as_deref(), Some(ADMIN_TOKEN));
        assert_eq!(session.role().get(), "ADMIN");
        assert!(session.is_logged_in());
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_untouched() {
        let store = Arc::new(MemoryTokenStore::new());
        let session = Session::new(FakeApi::rejecting(), store.clone());

        let err = session.login(&admin_creds()).await.unwrap_err();
        assert!(matches!(err, SessionError::Api(ApiError::Unauthorized(_))));
        assert!(!session.is_logged_in());
        assert!(!store.has_token());
    }

    #[tokio::test]
    async fn test_empty_token_is_a_failure() {
        let store = Arc::new(MemoryTokenStore::new());
        let session = Session::new(FakeApi::issuing("  "), store.clone());

        let err = session.login(&admin_creds()).await.unwrap_err();
        assert!(matches!(err, SessionError::EmptyToken));
        assert!(!session.is_logged_in());
        assert!(!store.has_token());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let store = Arc::new(MemoryTokenStore::with_token(ADMIN_TOKEN));
        let session = Session::new(FakeApi::issuing(ADMIN_TOKEN), store.clone());

        assert_eq!(session.logout().await, LogoutOutcome::Remote);
        assert!(!store.has_token());
        assert!(!session.is_logged_in());
        assert_eq!(session.role().get(), "");
    }

    #[tokio::test]
    async fn test_logout_falls_back_to_local_teardown() {
        let api = FakeApi {
            logout_fails: true,
            ..FakeApi::issuing(ADMIN_TOKEN)
        };
        let store = Arc::new(MemoryTokenStore::with_token(ADMIN_TOKEN));
        let session = Session::new(api, store.clone());

        assert_eq!(session.logout().await, LogoutOutcome::LocalOnly);
        assert_eq!(session.api().logout_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get().unwrap(), None);
        assert!(!session.is_logged_in());
        assert!(!session.is_admin());
    }

    #[test]
    fn test_flag_tracks_token_across_sequences() {
        let store = Arc::new(MemoryTokenStore::new());
        let api = FakeApi {
            logout_fails: true,
            ..FakeApi::issuing(ADMIN_TOKEN)
        };
        let session = Session::new(api, store.clone());
        let rx = session.subscribe();

        // login, login, logout, local logout, login, local logout
        let steps = [true, true, false, false, true, false];
        for (i, step) in steps.into_iter().enumerate() {
            if step {
                tokio_test::block_on(session.login(&admin_creds())).unwrap();
            } else if i % 2 == 0 {
                tokio_test::block_on(session.logout());
            } else {
                session.logout_local();
            }

            assert_eq!(*rx.borrow(), store.has_token(), "step {}", i);
            assert_eq!(session.is_logged_in(), session.has_token(), "step {}", i);
        }
    }

    #[test]
    fn test_late_subscriber_sees_current_value() {
        let session = Session::new(FakeApi::issuing(ADMIN_TOKEN), Arc::new(MemoryTokenStore::new()));
        tokio_test::block_on(session.login(&admin_creds())).unwrap();

        let rx = session.subscribe();
        assert!(*rx.borrow());
    }

    #[test]
    fn test_username_from_token() {
        let token = token_with_payload(r#"{"sub":"admin@pap.com","scope":"ADMIN"}"#);
        let session = Session::new(FakeApi::rejecting(), Arc::new(MemoryTokenStore::with_token(token)));
        assert_eq!(session.username().as_deref(), Some("admin@pap.com"));
    }
}
