//! REST API client module for the Shopfront auth endpoints.
//!
//! This module provides `AuthApi` for the three authentication endpoints
//! the session core consumes: login, token refresh, and logout.
//!
//! The API uses JWT bearer token authentication; every other request in
//! the app attaches `Authorization: Bearer <token>` read from the
//! credential store by the request-signing layer.

pub mod client;
pub mod error;

pub use client::{AuthApi, LoginRequest, LoginResponse, RefreshTokenResponse};
pub use error::ApiError;
