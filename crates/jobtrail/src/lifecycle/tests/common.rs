use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::lifecycle::activity::{ActivitySource, RecomputeTrigger, RetryPolicy};
use crate::lifecycle::domain::{
    Actor, Application, ApplicationId, InterviewRound, InterviewType, RoundStatus, UserId,
};
use crate::lifecycle::machine::NewApplication;
use crate::lifecycle::router::TrackerState;
use crate::lifecycle::stage::Stage;
use crate::lifecycle::store::{InMemoryTrackerStore, StoreError};

/// Fixed test day so assertions stay deterministic.
pub(super) fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 3, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

/// Retry policy that neither sleeps nor retries, for fast failure-path tests.
pub(super) fn no_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 1,
        base_delay: Duration::from_millis(0),
    }
}

pub(super) fn build_state() -> (TrackerState<InMemoryTrackerStore>, Arc<InMemoryTrackerStore>) {
    let store = Arc::new(InMemoryTrackerStore::default());
    (TrackerState::with_store(store.clone(), no_retry()), store)
}

pub(super) fn owner() -> UserId {
    UserId("user-1".to_string())
}

pub(super) fn actor() -> Actor {
    Actor("user-1".to_string())
}

pub(super) fn intake() -> NewApplication {
    NewApplication {
        owner: owner(),
        company_ref: Some("company-42".to_string()),
        platform_ref: Some("linkedin".to_string()),
    }
}

pub(super) fn create_application(
    state: &TrackerState<InMemoryTrackerStore>,
    at: DateTime<Utc>,
) -> Application {
    state
        .machine()
        .create(intake(), at)
        .expect("application stored")
}

/// An unscheduled round as imported/backfilled data, bypassing the manager.
pub(super) fn unscheduled_round(id: &ApplicationId, round: u32) -> InterviewRound {
    InterviewRound {
        application_id: id.clone(),
        round,
        interview_type: InterviewType::PhoneScreen,
        custom_name: None,
        status: RoundStatus::Unscheduled,
        scheduled_at: None,
        completed_at: None,
        result: None,
        rejection_reason: None,
    }
}

pub(super) fn wishlist() -> Stage {
    Stage::wishlist()
}

/// Trigger fake recording which applications asked for a recompute.
#[derive(Default)]
pub(super) struct RecordingTrigger {
    triggered: Mutex<Vec<ApplicationId>>,
}

impl RecordingTrigger {
    pub(super) fn triggered(&self) -> Vec<ApplicationId> {
        self.triggered.lock().expect("trigger mutex poisoned").clone()
    }
}

impl RecomputeTrigger for RecordingTrigger {
    fn trigger(&self, id: &ApplicationId) {
        self.triggered
            .lock()
            .expect("trigger mutex poisoned")
            .push(id.clone());
    }
}

/// Activity source that is permanently offline.
pub(super) struct FailingSource;

impl ActivitySource for FailingSource {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn latest_activity(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        Err(StoreError::Unavailable("source offline".to_string()))
    }
}

/// Activity source that fails its first read and then reports `at`.
pub(super) struct FlakySource {
    calls: AtomicUsize,
    pub(super) at: DateTime<Utc>,
}

impl FlakySource {
    pub(super) fn new(at: DateTime<Utc>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            at,
        }
    }
}

impl ActivitySource for FlakySource {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn latest_activity(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(StoreError::Unavailable("transient outage".to_string()));
        }
        Ok(Some(self.at))
    }
}
