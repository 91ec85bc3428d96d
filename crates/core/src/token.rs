//! Login token handling.
//!
//! Tokens are JWTs issued by the backend. The front-end never verifies signatures; it only reads
//! the `exp` claim so that an expired session is sent back to the login view before a request
//! is even attempted.

use crate::{LabError, LabResult};
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: f64,
}

/// Whether `token` must be treated as expired at `now`.
///
/// Absent tokens, tokens that are not three dot-separated segments, payloads that are not
/// base64url JSON, and payloads without a numeric `exp` all count as expired.
pub fn is_token_expired(token: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(token) = token else {
        return true;
    };
    match expiry_of(token) {
        Some(exp) => exp < now.timestamp() as f64,
        None => {
            tracing::warn!("unable to read expiry from session token");
            true
        }
    }
}

fn expiry_of(token: &str) -> Option<f64> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    serde_json::from_slice::<ExpiryClaim>(&bytes)
        .ok()
        .map(|claim| claim.exp)
}

/// A logged-in session as persisted between runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// File-backed persistence of the login token.
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a freshly issued session.
    pub fn login(&self, session: &StoredSession) -> LabResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(LabError::TokenStore)?;
        }
        let json = serde_json::to_string_pretty(session).map_err(LabError::Serialization)?;
        std::fs::write(&self.path, json).map_err(LabError::TokenStore)
    }

    /// Forget the stored session. Missing files are not an error.
    pub fn logout(&self) -> LabResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LabError::TokenStore(e)),
        }
    }

    /// Load a session that is still valid at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Unauthorized`] when there is no stored session or it has expired; an
    /// expired session is removed from disk (forced logout).
    pub fn current(&self, now: DateTime<Utc>) -> LabResult<StoredSession> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LabError::Unauthorized("not logged in".into()));
            }
            Err(e) => return Err(LabError::TokenStore(e)),
        };

        let session: StoredSession =
            serde_json::from_str(&text).map_err(LabError::Deserialization)?;

        if is_token_expired(Some(&session.token), now) {
            tracing::info!("stored session expired; logging out");
            self.logout()?;
            return Err(LabError::Unauthorized("session token has expired".into()));
        }
        Ok(session)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Unsigned JWT-shaped token carrying only an `exp` claim.
    pub(crate) fn token_with_exp(exp: i64) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        format!("{header}.{payload}.signature")
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, 0).expect("valid timestamp")
    }

    #[test]
    fn future_expiry_is_valid() {
        assert!(!is_token_expired(Some(&token_with_exp(2_000)), at(1_000)));
    }

    #[test]
    fn past_expiry_is_expired() {
        assert!(is_token_expired(Some(&token_with_exp(999)), at(1_000)));
    }

    #[test]
    fn missing_or_malformed_tokens_are_expired() {
        assert!(is_token_expired(None, at(0)));
        assert!(is_token_expired(Some("not-a-jwt"), at(0)));
        assert!(is_token_expired(Some("a.%%%.c"), at(0)));

        let no_exp = format!(
            "h.{}.s",
            general_purpose::URL_SAFE_NO_PAD.encode(r#"{"sub":"admin"}"#)
        );
        assert!(is_token_expired(Some(&no_exp), at(0)));
    }

    #[test]
    fn padded_payload_is_accepted() {
        let payload = general_purpose::URL_SAFE.encode(r#"{"exp":5000}"#);
        let token = format!("h.{payload}.s");
        assert!(!is_token_expired(Some(&token), at(10)));
    }

    #[test]
    fn store_round_trips_valid_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.json"));
        let session = StoredSession {
            token: token_with_exp(5_000),
            role: Some("Admin".into()),
        };

        store.login(&session).expect("save session");
        assert_eq!(store.current(at(1_000)).expect("still valid"), session);
    }

    #[test]
    fn expired_session_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .login(&StoredSession {
                token: token_with_exp(10),
                role: None,
            })
            .unwrap();

        let err = store.current(at(20)).expect_err("expired");
        assert!(err.requires_login());
        assert!(!store.path().exists());
    }

    #[test]
    fn missing_session_requires_login_and_logout_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert!(store.current(at(0)).expect_err("none stored").requires_login());
        store.logout().expect("logout without file");
    }
}
