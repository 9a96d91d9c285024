//! Worker replacement serialization
//!
//! Replacing worker nodes churns cluster capacity, so only one replacement
//! may run at a time across concurrently applied resources. Entry is gated
//! by a process-wide mutex acquired through a fixed-sleep spin-wait; the
//! gate remembers whether the previous replacement succeeded, and a waiter
//! that finds a failed predecessor refuses to start (the failure is
//! reported once, then the flag is cleared).

use std::time::Duration;

use stratus_core::provider::{ProviderError, ProviderResult};
use tokio::sync::{Mutex, MutexGuard};

/// How long to sleep between lock attempts
const SPIN_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct GateState {
    /// Worker id of the previous replacement, if it failed
    failed_worker: Option<String>,
}

/// Process-wide gate serializing worker replacements
pub struct ReplaceGate {
    state: Mutex<GateState>,
    spin_interval: Duration,
}

/// The gate used by all cluster and worker pool operations
pub static REPLACE_GATE: ReplaceGate = ReplaceGate::with_spin_interval(SPIN_INTERVAL);

impl ReplaceGate {
    pub const fn with_spin_interval(spin_interval: Duration) -> Self {
        Self {
            state: Mutex::const_new(GateState { failed_worker: None }),
            spin_interval,
        }
    }

    /// Wait for any in-flight replacement to finish, then take the gate
    ///
    /// Errors if the previous replacement failed; that error is delivered
    /// once and the flag is reset so later replacements may proceed.
    pub async fn acquire(&self) -> ProviderResult<ReplacePermit<'_>> {
        let mut guard = loop {
            match self.state.try_lock() {
                Ok(guard) => break guard,
                Err(_) => tokio::time::sleep(self.spin_interval).await,
            }
        };

        if let Some(worker) = guard.failed_worker.take() {
            return Err(ProviderError::new(format!(
                "previous replacement of worker {} failed, not starting another",
                worker
            )));
        }

        Ok(ReplacePermit { guard })
    }
}

/// Held while one replacement runs; report the outcome before release
#[derive(Debug)]
pub struct ReplacePermit<'a> {
    guard: MutexGuard<'a, GateState>,
}

impl ReplacePermit<'_> {
    pub fn succeed(self) {}

    pub fn fail(mut self, worker: &str) {
        self.guard.failed_worker = Some(worker.to_string());
    }
}
