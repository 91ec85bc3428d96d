//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handlers and workflows never read environment variables
//! themselves; binaries resolve a [`CoreConfig`] and hand it down.

use crate::catalog::Catalog;
use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RESULTS_ORIGIN,
    DEFAULT_TOKEN_FILENAME, ENV_API_BASE_URL, ENV_CATALOG_FILE, ENV_REQUEST_TIMEOUT_SECS,
    ENV_RESULTS_ORIGIN, ENV_TOKEN_FILE,
};
use crate::{LabError, LabResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    api_base_url: String,
    request_timeout: Duration,
    results_origin: String,
    token_file: PathBuf,
    catalog_file: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// Trailing slashes are stripped from both URLs so paths can be appended with `format!`.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Config`] if either URL is empty or not `http(s)://`, or if the
    /// timeout is zero.
    pub fn new(
        api_base_url: impl Into<String>,
        request_timeout: Duration,
        results_origin: impl Into<String>,
        token_file: PathBuf,
        catalog_file: Option<PathBuf>,
    ) -> LabResult<Self> {
        let api_base_url = normalise_url("api_base_url", api_base_url.into())?;
        let results_origin = normalise_url("results_origin", results_origin.into())?;

        if request_timeout.is_zero() {
            return Err(LabError::Config("request_timeout must be positive".into()));
        }

        Ok(Self {
            api_base_url,
            request_timeout,
            results_origin,
            token_file,
            catalog_file,
        })
    }

    /// Resolve configuration through `lookup`, falling back to defaults for absent keys.
    ///
    /// Binaries pass `|key| std::env::var(key).ok()`; tests pass a closure over a map.
    pub fn from_lookup<F>(lookup: F) -> LabResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout_secs = match value(ENV_REQUEST_TIMEOUT_SECS) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                LabError::Config(format!(
                    "{ENV_REQUEST_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"
                ))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Self::new(
            value(ENV_API_BASE_URL).unwrap_or_else(|| DEFAULT_API_BASE_URL.into()),
            Duration::from_secs(timeout_secs),
            value(ENV_RESULTS_ORIGIN).unwrap_or_else(|| DEFAULT_RESULTS_ORIGIN.into()),
            value(ENV_TOKEN_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILENAME)),
            value(ENV_CATALOG_FILE).map(PathBuf::from),
        )
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn results_origin(&self) -> &str {
        &self.results_origin
    }

    pub fn token_file(&self) -> &Path {
        &self.token_file
    }

    pub fn catalog_file(&self) -> Option<&Path> {
        self.catalog_file.as_deref()
    }

    /// Load the catalog template: the configured YAML file if any, else the built-in catalog.
    pub fn load_catalog(&self) -> LabResult<Catalog> {
        match &self.catalog_file {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    LabError::Config(format!("cannot read catalog {}: {e}", path.display()))
                })?;
                tracing::info!("loaded test catalog from {}", path.display());
                Ok(Catalog::from_yaml(&text)?)
            }
            None => Ok(Catalog::standard()),
        }
    }
}

fn normalise_url(field: &str, url: String) -> LabResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(LabError::Config(format!("{field} cannot be empty")));
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(LabError::Config(format!(
            "{field} must start with http:// or https://, got '{trimmed}'"
        )));
    }
    Ok(trimmed.to_string())
}
