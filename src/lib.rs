//! Shopfront session core - the authenticated-session subsystem of the
//! Shopfront mobile admin client.
//!
//! This crate owns everything between "a request came back 401" and
//! "the UI may proceed again":
//!
//! - [`auth::CredentialStore`]: durable access/refresh token storage
//! - [`auth::SessionAuthenticator`]: single-retry silent token refresh
//! - [`session::AppLifecycleGate`]: background/foreground re-auth flagging
//! - [`session::ReauthGate`]: biometric/device-credential challenge
//!
//! Screens, navigation, and the non-auth REST surface live in the host
//! app and only interact with this crate through [`auth::CredentialStore`]
//! token presence and the [`session::SessionState`] gate flag.

pub mod api;
pub mod auth;
pub mod config;
pub mod session;
