//! # API Shared
//!
//! Shared definitions for the serolab gateway.
//!
//! Contains:
//! - Request and response bodies (`dto` module), with OpenAPI schemas
//! - Shared services like `HealthService`
//! - Bearer-token extraction for authenticated routes
//!
//! Used by `api-rest`; the conversions from core types live next to the bodies.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{bearer_token, AuthError};
pub use dto::*;
pub use health::HealthService;
