use std::sync::Arc;

use super::common::*;
use crate::lifecycle::activity::{ActivityRecomputer, RetryingRecompute};
use crate::lifecycle::domain::ApplicationId;
use crate::lifecycle::machine::{ApplicationStageMachine, TransitionError, TransitionOutcome};
use crate::lifecycle::stage::{Milestone, Stage, StageError};
use crate::lifecycle::store::{
    ApplicationStore, InMemoryTrackerStore, StageHistoryStore, StoreError,
};

#[test]
fn create_starts_at_wishlist_with_activity_floored_at_creation() {
    let (state, store) = build_state();
    let created = create_application(&state, ts(9, 0));

    assert_eq!(created.stage, wishlist());
    assert_eq!(created.created_at, ts(9, 0));
    assert_eq!(created.last_activity_at, ts(9, 0));
    assert!(!created.is_archived);

    let history =
        StageHistoryStore::for_application(store.as_ref(), &created.id).expect("history reads");
    assert!(history.is_empty(), "creation writes no transition row");
}

#[test]
fn transition_appends_exactly_one_history_row() {
    let (state, store) = build_state();
    let application = create_application(&state, ts(9, 0));

    let outcome = state
        .machine()
        .transition(&application.id, "recruiter_reachout", actor(), ts(10, 0))
        .expect("transition applies");

    assert!(outcome.applied());
    assert_eq!(
        outcome.application().stage,
        Stage::parse("recruiter_reachout").unwrap()
    );

    let history =
        StageHistoryStore::for_application(store.as_ref(), &application.id).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_stage, wishlist());
    assert_eq!(history[0].to_stage, Stage::parse("recruiter_reachout").unwrap());
    assert_eq!(history[0].changed_at, ts(10, 0));

    let stored = ApplicationStore::fetch(store.as_ref(), &application.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.stage, Stage::parse("recruiter_reachout").unwrap());
    assert_eq!(stored.last_activity_at, ts(10, 0), "recompute ran");
}

#[test]
fn same_stage_transition_is_a_successful_no_write() {
    let (state, store) = build_state();
    let application = create_application(&state, ts(9, 0));

    let outcome = state
        .machine()
        .transition(&application.id, "wishlist", actor(), ts(10, 0))
        .expect("no-op accepted");

    assert!(matches!(outcome, TransitionOutcome::NoOp(_)));
    let history =
        StageHistoryStore::for_application(store.as_ref(), &application.id).expect("history");
    assert!(history.is_empty());

    let stored = ApplicationStore::fetch(store.as_ref(), &application.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.last_activity_at, ts(9, 0), "no activity written");
}

#[test]
fn invalid_stage_is_rejected_without_side_effects() {
    let (state, store) = build_state();
    let application = create_application(&state, ts(9, 0));

    match state
        .machine()
        .transition(&application.id, "daydreaming", actor(), ts(10, 0))
    {
        Err(TransitionError::Stage(StageError::InvalidStage(raw))) => {
            assert_eq!(raw, "daydreaming")
        }
        other => panic!("expected invalid stage, got {other:?}"),
    }

    let stored = ApplicationStore::fetch(store.as_ref(), &application.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.stage, wishlist());
    assert!(
        StageHistoryStore::for_application(store.as_ref(), &application.id)
            .expect("history")
            .is_empty()
    );
}

#[test]
fn transition_on_unknown_application_is_not_found() {
    let (state, _) = build_state();

    match state.machine().transition(
        &ApplicationId("missing".to_string()),
        "offer",
        actor(),
        ts(10, 0),
    ) {
        Err(TransitionError::Store(StoreError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn backward_moves_are_not_forbidden() {
    let (state, _) = build_state();
    let application = create_application(&state, ts(9, 0));

    state
        .machine()
        .transition(&application.id, "offer", actor(), ts(10, 0))
        .expect("forward");
    let outcome = state
        .machine()
        .transition(&application.id, "self_review", actor(), ts(11, 0))
        .expect("backward move is a caller policy concern");

    assert!(outcome.applied());
    assert_eq!(
        outcome.application().stage,
        Stage::parse("self_review").unwrap()
    );
}

#[test]
fn each_applied_transition_requests_one_recompute() {
    let store = Arc::new(InMemoryTrackerStore::default());
    let trigger = Arc::new(RecordingTrigger::default());
    let machine = ApplicationStageMachine::new(store, trigger.clone());

    let application = machine.create(intake(), ts(9, 0)).expect("created");
    machine
        .transition(&application.id, "hr_shortlist", actor(), ts(10, 0))
        .expect("applies");
    machine
        .transition(&application.id, "hr_shortlist", actor(), ts(11, 0))
        .expect("no-op");
    let _ = machine.transition(&application.id, "bogus", actor(), ts(12, 0));

    assert_eq!(trigger.triggered(), vec![application.id]);
}

#[test]
fn recompute_failure_never_rolls_back_the_transition() {
    let store = Arc::new(InMemoryTrackerStore::default());
    let recomputer =
        ActivityRecomputer::new(store.clone()).with_source(Arc::new(FailingSource));
    let trigger = Arc::new(RetryingRecompute::new(recomputer, no_retry()));
    let machine = ApplicationStageMachine::new(store.clone(), trigger);

    let application = machine.create(intake(), ts(9, 0)).expect("created");
    let outcome = machine
        .transition(&application.id, "hm_shortlist", actor(), ts(10, 0))
        .expect("stage write commits even though recompute fails");

    assert!(outcome.applied());
    let history =
        StageHistoryStore::for_application(store.as_ref(), &application.id).expect("history");
    assert_eq!(history.len(), 1);

    let stored = ApplicationStore::fetch(store.as_ref(), &application.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(
        stored.last_activity_at,
        ts(9, 0),
        "derived field stays stale until a later recompute heals it"
    );
}

#[test]
fn archive_dominates_the_milestone() {
    let (state, _) = build_state();
    let application = create_application(&state, ts(9, 0));

    let archived = state.machine().archive(&application.id).expect("archives");
    assert!(archived.is_archived);
    assert_eq!(archived.milestone(), Milestone::Archived);

    let restored = state.machine().restore(&application.id).expect("restores");
    assert!(!restored.is_archived);
    assert_eq!(restored.milestone(), Milestone::Active);
}
