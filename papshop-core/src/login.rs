//! Login form state machine
//!
//! `Idle -> Submitting -> Idle` on failure, or `Succeeded` once the session
//! holds a token. While `Submitting` the form refuses another submit, so at
//! most one login request is in flight.

use crate::api::{AuthApi, Credentials};
use crate::guard::Route;
use crate::session::{Session, SessionError};

/// Shown when either field is empty
pub const MISSING_FIELDS_MESSAGE: &str = "Vui lòng nhập đầy đủ thông tin!";

/// Shown for any failed login. Bad credentials and network errors look the same.
pub const LOGIN_FAILED_MESSAGE: &str = "Email hoặc mật khẩu không đúng!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
}

/// Result of a completed submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Session established; navigate to `redirect`
    Success { redirect: Route },
    /// Nothing was sent; the form carries the validation message
    Invalid,
    /// The request failed; the form carries the failure message
    Failed,
    /// A request is already in flight
    Busy,
}

/// Login form fields and submit state
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub identifier: String,
    pub password: String,
    state: LoginState,
    error: Option<&'static str>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoginState {
        self.state
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Whether the submit control is disabled
    pub fn is_submitting(&self) -> bool {
        self.state == LoginState::Submitting
    }

    /// Validate the fields and enter `Submitting`.
    ///
    /// Returns the credentials to send, or the outcome that prevented sending.
    pub fn begin(&mut self) -> Result<Credentials, LoginOutcome> {
        if self.is_submitting() {
            return Err(LoginOutcome::Busy);
        }

        if self.identifier.is_empty() || self.password.is_empty() {
            self.state = LoginState::Idle;
            self.error = Some(MISSING_FIELDS_MESSAGE);
            return Err(LoginOutcome::Invalid);
        }

        self.state = LoginState::Submitting;
        self.error = None;
        Ok(Credentials::new(self.identifier.clone(), self.password.clone()))
    }

    /// Apply the result of the login request started by [`LoginForm::begin`]
    pub fn finish(&mut self, result: Result<(), SessionError>) -> LoginOutcome {
        match result {
            Ok(()) => {
                self.state = LoginState::Succeeded;
                self.password.clear();
                LoginOutcome::Success {
                    redirect: Route::DEFAULT,
                }
            }
            Err(e) => {
                tracing::warn!("Login error: {}", e);
                self.state = LoginState::Idle;
                self.error = Some(LOGIN_FAILED_MESSAGE);
                LoginOutcome::Failed
            }
        }
    }

    /// Validate, log in through `session` and record the result
    pub async fn submit<A: AuthApi>(&mut self, session: &Session<A>) -> LoginOutcome {
        let credentials = match self.begin() {
            Ok(credentials) => credentials,
            Err(outcome) => return outcome,
        };

        let result = session.login(&credentials).await;
        self.finish(result)
    }

    /// Return to a blank form, e.g. after logout
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
