//! Wait - Generic asynchronous state convergence
//!
//! Infrastructure operations (cluster creation, ALB enablement, dedicated
//! host placement) settle asynchronously on the vendor side. `StateChange`
//! repeatedly invokes a refresh callback until the observed state string
//! reaches a target state, keeps polling while it is a pending state, and
//! fails immediately on an unexpected state or a refresh error. A timeout
//! produces a terminal error distinguishable from a vendor-reported
//! failure state.

use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::provider::{BoxFuture, ProviderError};

/// Result of one refresh callback invocation
#[derive(Debug)]
pub struct Refresh<T> {
    /// Current object, if one could be fetched
    pub object: Option<T>,
    /// Current state string (e.g., "deploying", "normal")
    pub state: String,
}

impl<T> Refresh<T> {
    pub fn new(object: Option<T>, state: impl Into<String>) -> Self {
        Self {
            object,
            state: state.into(),
        }
    }
}

type RefreshFn<'a, T> =
    Box<dyn Fn() -> BoxFuture<'a, Result<Refresh<T>, ProviderError>> + Send + Sync + 'a>;

/// Error from a state-change wait
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("timeout after {timeout:?} waiting for state {target:?}, last state was '{last_state}'")]
    Timeout {
        timeout: Duration,
        target: Vec<String>,
        last_state: String,
    },

    #[error("unexpected state '{state}', wanted target {target:?}")]
    UnexpectedState { state: String, target: Vec<String> },

    #[error(transparent)]
    Refresh(#[from] ProviderError),
}

impl WaitError {
    /// True if the deadline elapsed before a target state was observed
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

impl From<WaitError> for ProviderError {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::Refresh(e) => e,
            other => ProviderError::new(other.to_string()),
        }
    }
}

/// Poll a refresh callback until a target state is reached
///
/// Build with a refresh callback, configure pending/target state sets and
/// timing, then call `wait()`.
pub struct StateChange<'a, T> {
    pending: Vec<String>,
    target: Vec<String>,
    timeout: Duration,
    delay: Duration,
    poll_interval: Duration,
    refresh: RefreshFn<'a, T>,
}

impl<'a, T> StateChange<'a, T> {
    pub fn new<F>(refresh: F) -> Self
    where
        F: Fn() -> BoxFuture<'a, Result<Refresh<T>, ProviderError>> + Send + Sync + 'a,
    {
        Self {
            pending: Vec::new(),
            target: Vec::new(),
            timeout: Duration::from_secs(60 * 10),
            delay: Duration::ZERO,
            poll_interval: Duration::from_secs(10),
            refresh: Box::new(refresh),
        }
    }

    /// States that mean the operation is still in flight
    pub fn pending<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pending = states.into_iter().map(Into::into).collect();
        self
    }

    /// States that mean the operation has settled successfully
    pub fn target<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = states.into_iter().map(Into::into).collect();
        self
    }

    /// Total time budget for the wait
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Time to sleep before the first refresh
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Time between refreshes
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run the wait loop
    ///
    /// Returns the object from the refresh that observed the target state
    /// (None for waits that end in the resource disappearing).
    pub async fn wait(self) -> Result<Option<T>, WaitError> {
        let deadline = Instant::now() + self.timeout;

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        loop {
            let refreshed = (self.refresh)().await?;
            let last_state = refreshed.state;

            if self.target.iter().any(|t| *t == last_state) {
                return Ok(refreshed.object);
            }
            if !self.pending.iter().any(|p| *p == last_state) {
                return Err(WaitError::UnexpectedState {
                    state: last_state,
                    target: self.target,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(WaitError::Timeout {
                    timeout: self.timeout,
                    target: self.target,
                    last_state,
                });
            }
            // Shorten the last sleep so the final refresh lands on the deadline
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn sequenced(states: &'static [&'static str]) -> StateChange<'static, String> {
        let calls = Arc::new(AtomicUsize::new(0));
        StateChange::new(move || {
            let calls = calls.clone();
            Box::pin(async move {
                let n = calls.fetch_add(1, Ordering::SeqCst).min(states.len() - 1);
                let state = states[n];
                Ok(Refresh::new(Some(format!("obj-{state}")), state))
            })
        })
    }

    #[tokio::test]
    async fn reaches_target_through_pending_states() {
        let result = sequenced(&["deploying", "deploying", "normal"])
            .pending(["deploying"])
            .target(["normal"])
            .poll_interval(Duration::from_millis(1))
            .wait()
            .await
            .unwrap();
        assert_eq!(result, Some("obj-normal".to_string()));
    }

    #[tokio::test]
    async fn immediate_target_needs_no_polling() {
        let result = sequenced(&["normal"])
            .pending(["deploying"])
            .target(["normal"])
            .wait()
            .await
            .unwrap();
        assert_eq!(result, Some("obj-normal".to_string()));
    }

    #[tokio::test]
    async fn unexpected_state_fails_immediately() {
        let err = sequenced(&["deploying", "critical"])
            .pending(["deploying"])
            .target(["normal"])
            .poll_interval(Duration::from_millis(1))
            .wait()
            .await
            .unwrap_err();
        match err {
            WaitError::UnexpectedState { state, .. } => assert_eq!(state, "critical"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!sequenced(&["critical"])
            .target(["normal"])
            .wait()
            .await
            .unwrap_err()
            .is_timeout());
    }

    #[tokio::test]
    async fn deadline_elapses_with_timeout_error() {
        let err = sequenced(&["deploying"])
            .pending(["deploying"])
            .target(["normal"])
            .timeout(Duration::from_millis(20))
            .poll_interval(Duration::from_millis(5))
            .wait()
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        match err {
            WaitError::Timeout { last_state, .. } => assert_eq!(last_state, "deploying"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn full_timeout_budget_is_spent_before_giving_up() {
        // A coarse poll interval must not cut the wait short; the final
        // sleep shrinks so the last refresh happens at the deadline.
        let start = std::time::Instant::now();
        let err = sequenced(&["deploying"])
            .pending(["deploying"])
            .target(["normal"])
            .timeout(Duration::from_millis(50))
            .poll_interval(Duration::from_millis(30))
            .wait()
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn refresh_error_aborts_the_wait() {
        let wait: StateChange<'static, ()> = StateChange::new(|| {
            Box::pin(async { Err(ProviderError::new("vendor unreachable")) })
        });
        let err = wait.target(["normal"]).wait().await.unwrap_err();
        match err {
            WaitError::Refresh(e) => assert_eq!(e.message, "vendor unreachable"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn target_without_object_is_allowed() {
        // Deletion waits observe the target state with nothing left to fetch.
        let wait: StateChange<'static, ()> =
            StateChange::new(|| Box::pin(async { Ok(Refresh::new(None, "deleted")) }));
        let result = wait
            .pending(["deleting"])
            .target(["deleted"])
            .wait()
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
