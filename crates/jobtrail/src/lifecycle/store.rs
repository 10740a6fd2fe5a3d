use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, ConversationEvent, InterviewRound, StageTransition, UserId,
};
use super::stage::Milestone;

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Optional narrowing applied when listing a user's applications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub milestone: Option<Milestone>,
    pub platform_ref: Option<String>,
}

/// Storage abstraction for application records.
///
/// `commit_transition` is the atomic seam required by the lifecycle: the
/// stage write and the matching history append succeed or fail as one unit.
pub trait ApplicationStore: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, StoreError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;
    /// Persist the already-mutated application and append its transition as
    /// a single all-or-nothing unit.
    fn commit_transition(
        &self,
        application: &Application,
        transition: &StageTransition,
    ) -> Result<(), StoreError>;
    fn set_archived(&self, id: &ApplicationId, archived: bool) -> Result<Application, StoreError>;
    /// Write the derived activity timestamp. Only the recomputer calls this.
    fn set_last_activity(&self, id: &ApplicationId, at: DateTime<Utc>) -> Result<(), StoreError>;
    /// A user's applications, most recently active first.
    fn list(
        &self,
        owner: &UserId,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, StoreError>;
}

/// Append-only ledger of stage transitions.
pub trait StageHistoryStore: Send + Sync {
    /// Standalone append, used by backfill/import flows. Stage transitions
    /// issued through the machine land via
    /// [`ApplicationStore::commit_transition`] instead.
    fn append(&self, transition: StageTransition) -> Result<(), StoreError>;
    /// Transitions for one application in insertion order.
    fn for_application(&self, id: &ApplicationId) -> Result<Vec<StageTransition>, StoreError>;
    fn latest_changed_at(&self, id: &ApplicationId)
        -> Result<Option<DateTime<Utc>>, StoreError>;
}

/// Storage for interview-round lifecycles, keyed by application and round
/// number.
pub trait InterviewRoundStore: Send + Sync {
    fn upsert(&self, round: InterviewRound) -> Result<InterviewRound, StoreError>;
    fn fetch(
        &self,
        id: &ApplicationId,
        round: u32,
    ) -> Result<Option<InterviewRound>, StoreError>;
    /// Rounds for one application ordered by round number.
    fn for_application(&self, id: &ApplicationId) -> Result<Vec<InterviewRound>, StoreError>;
    /// Maximum of `scheduled_at`/`completed_at` across the application's
    /// rounds.
    fn latest_event_at(&self, id: &ApplicationId) -> Result<Option<DateTime<Utc>>, StoreError>;
}

/// Read/record surface for conversation events fed in by the messaging
/// collaborator.
pub trait ConversationStore: Send + Sync {
    fn record(&self, event: ConversationEvent) -> Result<(), StoreError>;
    fn latest_occurred_at(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<DateTime<Utc>>, StoreError>;
}

#[derive(Default)]
struct TrackerInner {
    applications: HashMap<ApplicationId, Application>,
    history: Vec<StageTransition>,
    rounds: HashMap<(ApplicationId, u32), InterviewRound>,
    conversations: Vec<ConversationEvent>,
}

/// In-memory backend implementing every store trait behind one mutex, which
/// makes `commit_transition` naturally atomic. Durable backends implement
/// the same traits over their own transaction machinery.
#[derive(Default, Clone)]
pub struct InMemoryTrackerStore {
    inner: Arc<Mutex<TrackerInner>>,
}

impl InMemoryTrackerStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerInner> {
        self.inner.lock().expect("tracker mutex poisoned")
    }
}

impl ApplicationStore for InMemoryTrackerStore {
    fn insert(&self, application: Application) -> Result<Application, StoreError> {
        let mut guard = self.lock();
        if guard.applications.contains_key(&application.id) {
            return Err(StoreError::Conflict);
        }
        guard
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        let guard = self.lock();
        Ok(guard.applications.get(id).cloned())
    }

    fn commit_transition(
        &self,
        application: &Application,
        transition: &StageTransition,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        if !guard.applications.contains_key(&application.id) {
            return Err(StoreError::NotFound);
        }
        guard
            .applications
            .insert(application.id.clone(), application.clone());
        guard.history.push(transition.clone());
        Ok(())
    }

    fn set_archived(&self, id: &ApplicationId, archived: bool) -> Result<Application, StoreError> {
        let mut guard = self.lock();
        let application = guard.applications.get_mut(id).ok_or(StoreError::NotFound)?;
        application.is_archived = archived;
        Ok(application.clone())
    }

    fn set_last_activity(&self, id: &ApplicationId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let application = guard.applications.get_mut(id).ok_or(StoreError::NotFound)?;
        application.last_activity_at = at;
        Ok(())
    }

    fn list(
        &self,
        owner: &UserId,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, StoreError> {
        let guard = self.lock();
        let mut matches: Vec<Application> = guard
            .applications
            .values()
            .filter(|application| &application.owner == owner)
            .filter(|application| {
                filter
                    .milestone
                    .map_or(true, |milestone| application.milestone() == milestone)
            })
            .filter(|application| {
                filter.platform_ref.as_deref().map_or(true, |platform| {
                    application.platform_ref.as_deref() == Some(platform)
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.last_activity_at
                .cmp(&a.last_activity_at)
                .then_with(|| a.id.0.cmp(&b.id.0))
        });
        Ok(matches)
    }
}

impl StageHistoryStore for InMemoryTrackerStore {
    fn append(&self, transition: StageTransition) -> Result<(), StoreError> {
        let mut guard = self.lock();
        guard.history.push(transition);
        Ok(())
    }

    fn for_application(&self, id: &ApplicationId) -> Result<Vec<StageTransition>, StoreError> {
        let guard = self.lock();
        Ok(guard
            .history
            .iter()
            .filter(|transition| &transition.application_id == id)
            .cloned()
            .collect())
    }

    fn latest_changed_at(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let guard = self.lock();
        Ok(guard
            .history
            .iter()
            .filter(|transition| &transition.application_id == id)
            .map(|transition| transition.changed_at)
            .max())
    }
}

impl InterviewRoundStore for InMemoryTrackerStore {
    fn upsert(&self, round: InterviewRound) -> Result<InterviewRound, StoreError> {
        let mut guard = self.lock();
        guard
            .rounds
            .insert((round.application_id.clone(), round.round), round.clone());
        Ok(round)
    }

    fn fetch(
        &self,
        id: &ApplicationId,
        round: u32,
    ) -> Result<Option<InterviewRound>, StoreError> {
        let guard = self.lock();
        Ok(guard.rounds.get(&(id.clone(), round)).cloned())
    }

    fn for_application(&self, id: &ApplicationId) -> Result<Vec<InterviewRound>, StoreError> {
        let guard = self.lock();
        let mut rounds: Vec<InterviewRound> = guard
            .rounds
            .values()
            .filter(|round| &round.application_id == id)
            .cloned()
            .collect();
        rounds.sort_by_key(|round| round.round);
        Ok(rounds)
    }

    fn latest_event_at(&self, id: &ApplicationId) -> Result<Option<DateTime<Utc>>, StoreError> {
        let guard = self.lock();
        Ok(guard
            .rounds
            .values()
            .filter(|round| &round.application_id == id)
            .filter_map(InterviewRound::latest_event_at)
            .max())
    }
}

impl ConversationStore for InMemoryTrackerStore {
    fn record(&self, event: ConversationEvent) -> Result<(), StoreError> {
        let mut guard = self.lock();
        guard.conversations.push(event);
        Ok(())
    }

    fn latest_occurred_at(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let guard = self.lock();
        Ok(guard
            .conversations
            .iter()
            .filter(|event| &event.application_id == id)
            .map(|event| event.occurred_at)
            .max())
    }
}
