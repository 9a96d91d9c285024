//! Kubernetes container-service resources

pub mod alb;
pub mod cluster;
pub mod dedicated_host;
pub mod ingress_secret;
pub mod replace;
pub mod worker_pool;

use std::time::Duration;

use stratus_core::provider::{ProviderError, ProviderResult};
use stratus_core::wait::{Refresh, StateChange};
use stratus_sdk::containers::Worker;

use crate::StratusProvider;
use crate::error::api_error;

pub(crate) const POLL_INTERVAL: Duration = Duration::from_secs(10);
pub(crate) const INITIAL_DELAY: Duration = Duration::from_secs(10);

/// Synthetic state reported when a refresh observes HTTP 404
pub(crate) const STATE_GONE: &str = "deleted";

/// Fold a set of workers into one state string
///
/// Any aborted worker poisons the whole set; otherwise the set is settled
/// only once every worker is.
pub(crate) fn aggregate_worker_state(workers: &[Worker]) -> String {
    if workers.iter().any(|w| w.state == "aborted") {
        return "aborted".to_string();
    }
    if workers
        .iter()
        .all(|w| w.state == "normal" || w.state == "deployed")
    {
        return "normal".to_string();
    }
    "provisioning".to_string()
}

/// Wait until every worker of a cluster (optionally one pool) is settled
pub(crate) async fn wait_for_workers(
    provider: &StratusProvider,
    cluster: &str,
    pool_name: Option<&str>,
    timeout: Duration,
) -> ProviderResult<()> {
    let cluster = cluster.to_string();
    let pool_name = pool_name.map(str::to_string);
    let containers = &provider.containers;

    StateChange::new(move || {
        let cluster = cluster.clone();
        let pool_name = pool_name.clone();
        Box::pin(async move {
            let mut workers = containers
                .list_workers(&cluster)
                .await
                .map_err(|e| api_error("failed to list workers", e))?;
            if let Some(pool) = &pool_name {
                workers.retain(|w| w.pool_name.as_deref() == Some(pool));
            }
            let state = aggregate_worker_state(&workers);
            Ok(Refresh::new(Some(workers), state))
        })
    })
    .pending(["provisioning"])
    .target(["normal"])
    .timeout(timeout)
    .delay(INITIAL_DELAY)
    .poll_interval(POLL_INTERVAL)
    .wait()
    .await
    .map_err(ProviderError::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(id: &str, state: &str) -> Worker {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "state": state,
            "status": null,
            "poolName": "default"
        }))
        .unwrap()
    }

    #[test]
    fn all_settled_workers_are_normal() {
        let workers = vec![worker("w-1", "normal"), worker("w-2", "deployed")];
        assert_eq!(aggregate_worker_state(&workers), "normal");
    }

    #[test]
    fn one_provisioning_worker_keeps_the_set_pending() {
        let workers = vec![worker("w-1", "normal"), worker("w-2", "provisioning")];
        assert_eq!(aggregate_worker_state(&workers), "provisioning");
    }

    #[test]
    fn aborted_worker_poisons_the_set() {
        let workers = vec![worker("w-1", "normal"), worker("w-2", "aborted")];
        assert_eq!(aggregate_worker_state(&workers), "aborted");
    }

    #[test]
    fn no_workers_counts_as_settled() {
        assert_eq!(aggregate_worker_state(&[]), "normal");
    }
}
