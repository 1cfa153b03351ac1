//! Advisory role decoding for bearer tokens
//!
//! Tokens are three dot-separated segments (header, payload, signature). The
//! payload is base64-encoded JSON carrying a `scope` claim with the role name.
//!
//! The signature is never checked here. The decoded role only drives what the
//! console shows and where it lets the operator navigate; the backend checks
//! the token again on every API call.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde_json::Value;
use tokio::sync::watch;

/// Role name granting access to the admin screens
pub const ADMIN_ROLE: &str = "ADMIN";

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Backend tokens have been seen with padded payloads, so accept both.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Claims read from the token payload
///
/// Each field is read on its own: a claim of an unexpected type comes back
/// as `None` without affecting the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Claims {
    /// Role name (e.g. `ADMIN`)
    pub scope: Option<String>,
    /// Subject (login identifier)
    pub sub: Option<String>,
}

impl Claims {
    fn from_payload(payload: &Value) -> Option<Self> {
        let object = payload.as_object()?;
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(String::from);

        Some(Self {
            scope: text("scope"),
            sub: text("sub"),
        })
    }
}

/// Decode the payload segment of a token without verifying it.
///
/// Returns `None` if the token does not have three segments or the payload
/// is not base64-encoded JSON.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        tracing::debug!("Token has {} segments, expected 3", segments.len());
        return None;
    }

    let payload = segments[1];
    let bytes = URL_SAFE_LENIENT
        .decode(payload)
        .or_else(|_| STANDARD_LENIENT.decode(payload))
        .map_err(|e| tracing::debug!("Token payload is not base64: {}", e))
        .ok()?;

    let payload: Value = serde_json::from_slice(&bytes)
        .map_err(|e| tracing::debug!("Token payload is not JSON: {}", e))
        .ok()?;

    let claims = Claims::from_payload(&payload);
    if claims.is_none() {
        tracing::debug!("Token payload is not a JSON object");
    }
    claims
}

/// Extract the role name from a token, or an empty string if it has none.
pub fn decode_role(token: &str) -> String {
    decode_claims(token)
        .and_then(|claims| claims.scope)
        .unwrap_or_default()
}

/// Role held by the current session
///
/// Kept apart from the token so guard checks don't re-decode it. Observers
/// see the latest value only.
#[derive(Debug)]
pub struct RoleState {
    tx: watch::Sender<String>,
}

impl RoleState {
    pub fn new(role: impl Into<String>) -> Self {
        let (tx, _) = watch::channel(role.into());
        Self { tx }
    }

    /// Decode and hold the role carried by `token`
    pub(crate) fn set_from_token(&self, token: &str) {
        self.set(decode_role(token));
    }

    pub(crate) fn set(&self, role: impl Into<String>) {
        self.tx.send_replace(role.into());
    }

    pub(crate) fn clear(&self) {
        self.tx.send_replace(String::new());
    }

    /// Currently held role name
    pub fn get(&self) -> String {
        self.tx.borrow().clone()
    }

    /// Exact, case-sensitive match against [`ADMIN_ROLE`]
    pub fn is_admin(&self) -> bool {
        *self.tx.borrow() == ADMIN_ROLE
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for RoleState {
    fn default() -> Self {
        Self::new(String::new())
    }
}
