use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::activity::RecomputeTrigger;
use super::domain::{Actor, Application, ApplicationId, StageTransition, UserId};
use super::stage::{Stage, StageError};
use super::store::{ApplicationStore, StageHistoryStore, StoreError};

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Intake payload for a new application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub owner: UserId,
    pub company_ref: Option<String>,
    pub platform_ref: Option<String>,
}

/// Result of a transition request. A same-stage request is a successful
/// no-write, not an error; strict callers branch on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied {
        application: Application,
        transition: StageTransition,
    },
    NoOp(Application),
}

impl TransitionOutcome {
    pub const fn applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub const fn application(&self) -> &Application {
        match self {
            Self::Applied { application, .. } | Self::NoOp(application) => application,
        }
    }
}

/// Error raised by the stage machine.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validates and applies stage transitions, keeping the audit ledger and the
/// derived activity timestamp in step.
///
/// No ordering is imposed between valid stages; moving backward is legal
/// here and any monotonic-progression policy belongs to callers.
pub struct ApplicationStageMachine<S> {
    store: Arc<S>,
    recompute: Arc<dyn RecomputeTrigger>,
}

impl<S> ApplicationStageMachine<S>
where
    S: ApplicationStore + StageHistoryStore + 'static,
{
    pub fn new(store: Arc<S>, recompute: Arc<dyn RecomputeTrigger>) -> Self {
        Self { store, recompute }
    }

    /// Create an application at the initial `wishlist` stage. The derived
    /// activity timestamp starts at `created_at`.
    pub fn create(
        &self,
        request: NewApplication,
        at: DateTime<Utc>,
    ) -> Result<Application, TransitionError> {
        let application = Application {
            id: next_application_id(),
            owner: request.owner,
            company_ref: request.company_ref,
            platform_ref: request.platform_ref,
            stage: Stage::wishlist(),
            is_archived: false,
            created_at: at,
            last_activity_at: at,
        };
        let stored = self.store.insert(application)?;
        Ok(stored)
    }

    /// Apply a stage transition: validate the target, commit the stage write
    /// atomically with its history append, then request a recompute pass.
    pub fn transition(
        &self,
        id: &ApplicationId,
        to_stage: &str,
        actor: Actor,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let to_stage = Stage::parse(to_stage)?;
        let mut application = self.store.fetch(id)?.ok_or(StoreError::NotFound)?;

        if application.stage == to_stage {
            return Ok(TransitionOutcome::NoOp(application));
        }

        let transition = StageTransition {
            application_id: id.clone(),
            from_stage: application.stage,
            to_stage,
            actor,
            changed_at: at,
        };
        application.stage = to_stage;

        self.store.commit_transition(&application, &transition)?;
        self.recompute.trigger(id);

        Ok(TransitionOutcome::Applied {
            application,
            transition,
        })
    }

    pub fn archive(&self, id: &ApplicationId) -> Result<Application, TransitionError> {
        Ok(self.store.set_archived(id, true)?)
    }

    pub fn restore(&self, id: &ApplicationId) -> Result<Application, TransitionError> {
        Ok(self.store.set_archived(id, false)?)
    }

    /// The application's audit trail in insertion order.
    pub fn history(&self, id: &ApplicationId) -> Result<Vec<StageTransition>, TransitionError> {
        Ok(StageHistoryStore::for_application(self.store.as_ref(), id)?)
    }
}
