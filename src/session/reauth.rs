//! Biometric/device-credential challenge gating the UI shell.
//!
//! When the session gate is locked, the shell presents a challenge
//! through the platform's biometric prompt. Only a successful challenge
//! unlocks the gate; failures and platform errors leave it locked and
//! never touch stored credentials, since the tokens themselves are still
//! valid. The shell decides how many attempts to allow before falling
//! back to a full password login.

use std::future::Future;

use tracing::{debug, info, warn};

use super::SessionState;

/// Result of the platform capability query, before any challenge is shown.
///
/// Everything except `Available` should steer the UI toward a password
/// fallback instead of attempting a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricAvailability {
    Available,
    NoHardware,
    HardwareUnavailable,
    NotEnrolled,
    SecurityUpdateRequired,
    Unsupported,
    Unknown,
}

/// Outcome of a single challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// The user passed; the gate unlocks.
    Success,
    /// The sample did not match. Retryable in place.
    Failed,
    /// The platform aborted the flow (hardware error, cancellation,
    /// lockout). Usually warrants the password fallback.
    Error(String),
}

/// Platform seam for the biometric prompt.
///
/// Implementations wrap the mobile platform's biometric API; tests use
/// stubs with fixed outcomes.
pub trait BiometricAuthenticator: Send + Sync {
    /// Pure capability query, no side effects.
    fn availability(&self) -> BiometricAvailability;

    /// Present the challenge and wait for the user. A challenge left
    /// unanswered simply never resolves; there is no timeout here.
    fn challenge(&self) -> impl Future<Output = ChallengeOutcome> + Send;
}

/// Consumes the re-auth flag: presents a challenge and unlocks the
/// session gate on success.
pub struct ReauthGate<B> {
    biometrics: B,
    state: SessionState,
}

impl<B: BiometricAuthenticator> ReauthGate<B> {
    pub fn new(biometrics: B, state: SessionState) -> Self {
        Self { biometrics, state }
    }

    /// Check whether a challenge can be presented at all.
    pub fn availability(&self) -> BiometricAvailability {
        self.biometrics.availability()
    }

    /// Run one challenge. Clears `requires_reauth` only on success;
    /// credentials are never modified on any outcome. No retry limit is
    /// enforced here.
    pub async fn challenge(&self) -> ChallengeOutcome {
        let outcome = self.biometrics.challenge().await;
        match &outcome {
            ChallengeOutcome::Success => {
                info!("re-authentication succeeded, unlocking session gate");
                self.state.clear_reauth();
            }
            ChallengeOutcome::Failed => {
                debug!("biometric sample did not match, gate stays locked");
            }
            ChallengeOutcome::Error(message) => {
                warn!(message = %message, "re-authentication aborted, gate stays locked");
            }
        }
        outcome
    }
}
