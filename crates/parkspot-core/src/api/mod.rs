//! REST API client module for the parking reservation service.
//!
//! This module provides the `ApiClient` for listing and managing parking
//! spots and reservations.
//!
//! Requests carry the stored session credential as a bearer token when
//! one exists. A 401 from the server can be wired to an
//! `AuthFailureHandler` that logs the user out.

pub mod client;
pub mod error;
pub mod hooks;

pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, Result};
pub use hooks::{AuthFailureHandler, LogoutOnUnauthorized};
