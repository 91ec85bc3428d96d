use crate::catalog::CatalogError;

/// Errors surfaced by the lab front-end core.
///
/// The variants separate the failure classes callers must treat differently: validation
/// failures happen before any network call, `Unauthorized` forces a logout, and `Api`/`Network`
/// abandon the operation so the user can resubmit.
#[derive(Debug, thiserror::Error)]
pub enum LabError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("not authorised: {0}")]
    Unauthorized(String),
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },
    #[error("unexpected response from backend: {0}")]
    UnexpectedResponse(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to access token store: {0}")]
    TokenStore(std::io::Error),
    #[error("failed to serialise: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialise: {0}")]
    Deserialization(serde_json::Error),
}

impl LabError {
    /// Whether the caller should clear the stored token and return to the login view.
    pub fn requires_login(&self) -> bool {
        matches!(self, LabError::Unauthorized(_))
    }
}

pub type LabResult<T> = std::result::Result<T, LabError>;
