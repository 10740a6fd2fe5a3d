use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::{Milestone, Stage};

/// Identifier wrapper for tracked applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier of the user who owns an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Who performed a stage transition (a user, or an automated ingester).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor(pub String);

/// One pursuit of a role, carrying the current stage and the derived
/// activity timestamp.
///
/// `stage` and `last_activity_at` are mutated only through
/// [`super::machine::ApplicationStageMachine`] and
/// [`super::activity::ActivityRecomputer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub owner: UserId,
    /// Opaque reference into the company catalog subsystem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_ref: Option<String>,
    /// Opaque reference into the platform catalog subsystem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_ref: Option<String>,
    pub stage: Stage,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Application {
    /// Archival dominates; otherwise the milestone follows the stage.
    pub const fn milestone(&self) -> Milestone {
        if self.is_archived {
            Milestone::Archived
        } else {
            self.stage.milestone()
        }
    }
}

/// Immutable audit fact recording one stage change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub application_id: ApplicationId,
    pub from_stage: Stage,
    pub to_stage: Stage,
    pub actor: Actor,
    pub changed_at: DateTime<Utc>,
}

/// Interview format attached to a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    PhoneScreen,
    Technical,
    SystemDesign,
    Behavioral,
    Onsite,
    Custom,
}

impl InterviewType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PhoneScreen => "Phone Screen",
            Self::Technical => "Technical",
            Self::SystemDesign => "System Design",
            Self::Behavioral => "Behavioral",
            Self::Onsite => "Onsite",
            Self::Custom => "Custom",
        }
    }
}

/// Scheduling lifecycle of a single interview round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Unscheduled,
    Scheduled,
    Rescheduled,
    Completed,
    Rejected,
    Withdrawn,
}

impl RoundStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unscheduled => "unscheduled",
            Self::Scheduled => "scheduled",
            Self::Rescheduled => "rescheduled",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Withdrawn)
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One scheduled/occurring interview event, numbered per application.
///
/// Invariants kept by [`super::rounds::InterviewRoundManager`]:
/// `scheduled_at` is absent while `unscheduled`, and `completed_at` is set
/// and not before `scheduled_at` once `completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewRound {
    pub application_id: ApplicationId,
    pub round: u32,
    pub interview_type: InterviewType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    pub status: RoundStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl InterviewRound {
    /// The stage identifier this round is tied to.
    pub const fn stage(&self) -> Stage {
        Stage::InterviewRound(self.round)
    }

    /// Latest activity-contributing timestamp on this round, if any.
    pub fn latest_event_at(&self) -> Option<DateTime<Utc>> {
        match (self.scheduled_at, self.completed_at) {
            (Some(scheduled), Some(completed)) => Some(scheduled.max(completed)),
            (scheduled, completed) => scheduled.or(completed),
        }
    }
}

/// Timestamped fact from the messaging collaborator: the application had a
/// conversation event at `occurred_at`. Content stays with the mail
/// subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEvent {
    pub application_id: ApplicationId,
    pub occurred_at: DateTime<Utc>,
}
