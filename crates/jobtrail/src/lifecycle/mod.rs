//! Application lifecycle tracking: the stage registry, the transition
//! machine with its append-only audit ledger, interview-round scheduling,
//! and the derived `last_activity_at` recomputation.
//!
//! Storage is abstracted behind per-concern traits so the components can be
//! exercised against the in-memory backend while durable backends live with
//! the migration layer.

pub mod activity;
pub mod domain;
pub mod machine;
pub mod rounds;
pub mod router;
pub mod stage;
pub mod store;
pub mod wire;

#[cfg(test)]
mod tests;

pub use activity::{
    ActivityRecomputer, ActivitySource, ConversationSource, InterviewRoundSource,
    RecomputeError, RecomputeOutcome, RecomputeTrigger, RetryPolicy, RetryingRecompute,
    StageHistorySource,
};
pub use domain::{
    Actor, Application, ApplicationId, ConversationEvent, InterviewRound, InterviewType,
    RoundStatus, StageTransition, UserId,
};
pub use machine::{ApplicationStageMachine, NewApplication, TransitionError, TransitionOutcome};
pub use rounds::{InterviewRoundManager, RoundError};
pub use router::{tracker_router, TrackerState};
pub use stage::{
    format_interview_round, parse_interview_round, Milestone, Stage, StageError, StandardStage,
};
pub use store::{
    ApplicationFilter, ApplicationStore, ConversationStore, InMemoryTrackerStore,
    InterviewRoundStore, StageHistoryStore, StoreError,
};
pub use wire::{ApplicationView, InterviewData, StageKind, StageView, TransitionView};
