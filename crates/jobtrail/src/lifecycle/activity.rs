use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use super::domain::ApplicationId;
use super::store::{
    ApplicationStore, ConversationStore, InterviewRoundStore, StageHistoryStore, StoreError,
};

/// One stream of activity-contributing timestamps for an application.
///
/// Every event type that should move `last_activity_at` registers exactly
/// one source on the recomputer; the reduction itself never changes.
pub trait ActivitySource: Send + Sync {
    fn name(&self) -> &'static str;
    fn latest_activity(&self, id: &ApplicationId)
        -> Result<Option<DateTime<Utc>>, StoreError>;
}

/// Stage transitions as an activity stream (`changed_at`).
pub struct StageHistorySource<H>(Arc<H>);

impl<H> StageHistorySource<H> {
    pub fn new(history: Arc<H>) -> Self {
        Self(history)
    }
}

impl<H: StageHistoryStore> ActivitySource for StageHistorySource<H> {
    fn name(&self) -> &'static str {
        "stage_history"
    }

    fn latest_activity(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.0.latest_changed_at(id)
    }
}

/// Interview rounds as an activity stream (`scheduled_at`/`completed_at`).
pub struct InterviewRoundSource<R>(Arc<R>);

impl<R> InterviewRoundSource<R> {
    pub fn new(rounds: Arc<R>) -> Self {
        Self(rounds)
    }
}

impl<R: InterviewRoundStore> ActivitySource for InterviewRoundSource<R> {
    fn name(&self) -> &'static str {
        "interview_rounds"
    }

    fn latest_activity(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.0.latest_event_at(id)
    }
}

/// Conversation events as an activity stream (`occurred_at`).
pub struct ConversationSource<C>(Arc<C>);

impl<C> ConversationSource<C> {
    pub fn new(conversations: Arc<C>) -> Self {
        Self(conversations)
    }
}

impl<C: ConversationStore> ActivitySource for ConversationSource<C> {
    fn name(&self) -> &'static str {
        "conversations"
    }

    fn latest_activity(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.0.latest_occurred_at(id)
    }
}

/// Pure reduction: the maximum observed timestamp, floored at `created_at`
/// so the derived field is defined even with no events.
pub fn reduce_last_activity(
    created_at: DateTime<Utc>,
    observed: impl IntoIterator<Item = DateTime<Utc>>,
) -> DateTime<Utc> {
    observed.into_iter().fold(created_at, |latest, at| latest.max(at))
}

/// Result of a recompute pass, distinguishing writes from no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeOutcome {
    Updated(DateTime<Utc>),
    Unchanged(DateTime<Utc>),
}

impl RecomputeOutcome {
    pub const fn last_activity_at(self) -> DateTime<Utc> {
        match self {
            Self::Updated(at) | Self::Unchanged(at) => at,
        }
    }

    pub const fn wrote(self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

/// Error raised while recomputing `last_activity_at`.
#[derive(Debug, thiserror::Error)]
pub enum RecomputeError {
    #[error("application '{0}' not found")]
    UnknownApplication(String),
    #[error("activity source '{source}' unavailable: {error}")]
    Source {
        source: &'static str,
        #[source]
        error: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RecomputeError {
    /// Retrying cannot resolve a missing application.
    const fn is_retryable(&self) -> bool {
        !matches!(self, Self::UnknownApplication(_))
    }
}

/// Derives `last_activity_at` by reducing the registered sources.
///
/// Reads only the sources and writes only the derived field; idempotent, so
/// duplicate or late triggers converge without coordination.
pub struct ActivityRecomputer<S> {
    applications: Arc<S>,
    sources: Vec<Arc<dyn ActivitySource>>,
}

impl<S: ApplicationStore> ActivityRecomputer<S> {
    pub fn new(applications: Arc<S>) -> Self {
        Self {
            applications,
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn ActivitySource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn recompute(&self, id: &ApplicationId) -> Result<RecomputeOutcome, RecomputeError> {
        let application = self
            .applications
            .fetch(id)?
            .ok_or_else(|| RecomputeError::UnknownApplication(id.0.clone()))?;

        let mut observed = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let latest = source
                .latest_activity(id)
                .map_err(|error| RecomputeError::Source {
                    source: source.name(),
                    error,
                })?;
            if let Some(at) = latest {
                observed.push(at);
            }
        }

        let next = reduce_last_activity(application.created_at, observed);
        if next == application.last_activity_at {
            return Ok(RecomputeOutcome::Unchanged(next));
        }

        self.applications.set_last_activity(id, next)?;
        Ok(RecomputeOutcome::Updated(next))
    }
}

/// Fire-and-forget seam the writers use to request a recompute pass.
///
/// Implementations must never fail the triggering write: the authoritative
/// stage/round/event writes are already committed when this runs.
pub trait RecomputeTrigger: Send + Sync {
    fn trigger(&self, id: &ApplicationId);
}

/// Retry knobs for [`RetryingRecompute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(25),
        }
    }
}

/// Synchronous trigger that runs the recomputer inline, retrying transient
/// failures with doubling backoff and logging instead of propagating.
///
/// A failed pass leaves `last_activity_at` stale, not wrong: any later
/// successful pass restores it.
pub struct RetryingRecompute<S> {
    recomputer: ActivityRecomputer<S>,
    policy: RetryPolicy,
}

impl<S: ApplicationStore> RetryingRecompute<S> {
    pub fn new(recomputer: ActivityRecomputer<S>, policy: RetryPolicy) -> Self {
        Self { recomputer, policy }
    }
}

impl<S: ApplicationStore> RecomputeTrigger for RetryingRecompute<S> {
    fn trigger(&self, id: &ApplicationId) {
        let attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.base_delay;

        for attempt in 1..=attempts {
            match self.recomputer.recompute(id) {
                Ok(outcome) => {
                    debug!(
                        application = %id.0,
                        last_activity = %outcome.last_activity_at(),
                        wrote = outcome.wrote(),
                        "recomputed last activity"
                    );
                    return;
                }
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(
                        application = %id.0,
                        attempt,
                        error = %err,
                        "activity recompute failed, retrying"
                    );
                    std::thread::sleep(delay);
                    delay = delay.saturating_mul(2);
                }
                Err(err) => {
                    error!(
                        application = %id.0,
                        error = %err,
                        "activity recompute failed, giving up"
                    );
                    return;
                }
            }
        }
    }
}
