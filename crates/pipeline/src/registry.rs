//! One [`Orchestrator`] per session owner.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use hyde_core::types::DbId;
use hyde_events::EventBus;
use tokio_util::sync::CancellationToken;

use crate::collaborators::Collaborators;
use crate::orchestrator::{Orchestrator, RetryPolicies};

/// How long a finished, unobserved generation stays readable.
const DEFAULT_RETENTION_MINUTES: i64 = 10;

/// Lazily creates and hands out per-owner orchestrators.
///
/// Entries are dropped once they are idle: no run in flight, no open
/// snapshot stream, no handler holding them, and the last generation
/// finished longer than the retention period ago.
pub struct OrchestratorRegistry {
    collaborators: Collaborators,
    events: Arc<EventBus>,
    policies: RetryPolicies,
    retention: chrono::Duration,
    orchestrators: Mutex<HashMap<DbId, Arc<Orchestrator>>>,
}

impl OrchestratorRegistry {
    pub fn new(collaborators: Collaborators, events: Arc<EventBus>) -> Self {
        Self {
            collaborators,
            events,
            policies: RetryPolicies::default(),
            retention: chrono::Duration::minutes(DEFAULT_RETENTION_MINUTES),
            orchestrators: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_retry_policies(mut self, policies: RetryPolicies) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_retention(mut self, retention: chrono::Duration) -> Self {
        self.retention = retention;
        self
    }

    /// The owner's orchestrator, created on first use.
    ///
    /// Creating a new entry also sweeps idle ones.
    pub fn for_owner(&self, owner_id: DbId) -> Arc<Orchestrator> {
        let mut map = self.lock();
        if let Some(existing) = map.get(&owner_id) {
            return Arc::clone(existing);
        }

        self.prune_locked(&mut map);
        tracing::debug!(owner_id, "Creating orchestrator");
        let orchestrator = Arc::new(
            Orchestrator::new(
                Some(owner_id),
                self.collaborators.clone(),
                Arc::clone(&self.events),
            )
            .with_retry_policies(self.policies),
        );
        map.insert(owner_id, Arc::clone(&orchestrator));
        orchestrator
    }

    /// The owner's orchestrator, if one exists.
    pub fn get(&self, owner_id: DbId) -> Option<Arc<Orchestrator>> {
        self.lock().get(&owner_id).cloned()
    }

    /// Drop the owner's entry now if it is idle, ignoring the retention
    /// period. Returns whether it was removed.
    pub fn release(&self, owner_id: DbId) -> bool {
        let mut map = self.lock();
        let idle = map
            .get(&owner_id)
            .is_some_and(|o| Arc::strong_count(o) == 1 && o.is_evictable(Utc::now()));
        if idle {
            map.remove(&owner_id);
            tracing::debug!(owner_id, "Released orchestrator");
        }
        idle
    }

    /// Drop every idle entry. Returns how many were removed.
    pub fn prune(&self) -> usize {
        self.prune_locked(&mut self.lock())
    }

    /// Number of orchestrators currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of owners currently running a generation.
    pub fn active_count(&self) -> usize {
        self.lock().values().filter(|o| o.is_generating()).count()
    }

    /// Prune idle entries every `interval` until `cancel` fires.
    pub async fn run_eviction(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = interval.as_secs(),
            retention_mins = self.retention.num_minutes(),
            "Orchestrator eviction started",
        );

        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Orchestrator eviction stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = self.prune();
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.len(), "Evicted idle orchestrators");
                    }
                }
            }
        }
    }

    fn prune_locked(&self, map: &mut HashMap<DbId, Arc<Orchestrator>>) -> usize {
        let cutoff = Utc::now() - self.retention;
        let before = map.len();
        map.retain(|_, o| Arc::strong_count(o) > 1 || !o.is_evictable(cutoff));
        before - map.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DbId, Arc<Orchestrator>>> {
        self.orchestrators
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
