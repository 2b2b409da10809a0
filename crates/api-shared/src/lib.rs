//! # API Shared
//!
//! Shared definitions for the AYUSH front-end APIs.
//!
//! Contains:
//! - Request and response types with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//! - Current-user resolution from request headers or CLI flags
//!
//! Used by `api-rest` and the `ayush` CLI.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
