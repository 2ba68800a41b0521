//! Session gating for the UI shell.
//!
//! This module tracks whether the app must re-authenticate before the
//! UI may proceed:
//! - `SessionState`: injectable, observable re-auth flag shared by the
//!   UI shell and the gates
//! - `AppLifecycleGate`: flags re-auth on background/foreground cycles
//! - `ReauthGate`: biometric/device-credential challenge that unlocks
//!   the shell
//!
//! The combined gate has two states, `Unlocked` and `LockedPendingReauth`;
//! only a successful challenge unlocks. A silent token refresh never does.

pub mod lifecycle;
pub mod reauth;
pub mod state;

pub use lifecycle::{AppLifecycleGate, LifecycleEvent};
pub use reauth::{BiometricAuthenticator, BiometricAvailability, ChallengeOutcome, ReauthGate};
pub use state::{GateState, GateStatus, SessionState};
