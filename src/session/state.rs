//! Process-local session gate state.
//!
//! The re-auth flag used to be a process-wide mutable singleton in the
//! original client; here it is an explicit handle injected into every
//! consumer, so gate transitions can be tested without a real UI
//! lifecycle. Built on a watch channel so the UI shell reacts the moment
//! `requires_reauth` flips true rather than polling.

use tokio::sync::watch;

/// Snapshot of the gate flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateState {
    /// True between a qualifying backgrounding and a successful challenge.
    pub requires_reauth: bool,
    /// True until the app has been foregrounded once.
    pub is_first_launch: bool,
}

/// Combined lifecycle + re-auth gate status.
///
/// `LockedPendingReauth` makes no claim about session validity: a logout
/// can race the background token read, so consumers must re-check token
/// presence in the credential store before treating the session as live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Unlocked,
    LockedPendingReauth,
}

/// Shared, observable session gate state.
///
/// Cheap to clone; all clones observe and mutate the same flags.
#[derive(Debug, Clone)]
pub struct SessionState {
    tx: watch::Sender<GateState>,
}

impl SessionState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(GateState {
            requires_reauth: false,
            is_first_launch: true,
        });
        Self { tx }
    }

    /// Subscribe to gate changes; the receiver wakes on every transition.
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> GateState {
        *self.tx.borrow()
    }

    pub fn requires_reauth(&self) -> bool {
        self.tx.borrow().requires_reauth
    }

    pub fn is_first_launch(&self) -> bool {
        self.tx.borrow().is_first_launch
    }

    pub fn status(&self) -> GateStatus {
        if self.requires_reauth() {
            GateStatus::LockedPendingReauth
        } else {
            GateStatus::Unlocked
        }
    }

    /// Lock the gate. Written by the lifecycle gate on qualifying
    /// backgrounding; idempotent.
    pub fn require_reauth(&self) {
        self.tx.send_if_modified(|state| {
            if state.requires_reauth {
                false
            } else {
                state.requires_reauth = true;
                true
            }
        });
    }

    /// Unlock the gate. Written only on a successful challenge.
    pub fn clear_reauth(&self) {
        self.tx.send_if_modified(|state| {
            if state.requires_reauth {
                state.requires_reauth = false;
                true
            } else {
                false
            }
        });
    }

    /// Record that the app has been foregrounded at least once.
    /// Idempotent after the first call.
    pub fn mark_foregrounded(&self) {
        self.tx.send_if_modified(|state| {
            if state.is_first_launch {
                state.is_first_launch = false;
                true
            } else {
                false
            }
        });
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
