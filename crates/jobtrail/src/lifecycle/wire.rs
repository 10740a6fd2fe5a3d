use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Actor, Application, ApplicationId, InterviewRound, InterviewType, RoundStatus,
    StageTransition, UserId,
};
use super::stage::{Milestone, Stage, StageError};

/// Discriminant of the structured stage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Standard,
    InterviewRound,
}

/// Interview-round details embedded in the structured stage object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewData {
    #[serde(rename = "type")]
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

impl From<&InterviewRound> for InterviewData {
    fn from(round: &InterviewRound) -> Self {
        Self {
            interview_type: round.interview_type,
            custom_name: round.custom_name.clone(),
            status: round.status,
            scheduled_at: round.scheduled_at,
            completed_at: round.completed_at,
            result: round.result.clone(),
            rejection_reason: round.rejection_reason.clone(),
        }
    }
}

/// Structured wire form of a stage, derived from the raw identifier and
/// reducible back to it via [`StageView::stage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageView {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_round_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_data: Option<InterviewData>,
}

impl StageView {
    /// Builds the wire object; `round` supplies interview details when the
    /// stage is an interview round and the round record exists.
    pub fn from_stage(stage: &Stage, round: Option<&InterviewRound>) -> Self {
        let kind = match stage {
            Stage::Standard(_) => StageKind::Standard,
            Stage::InterviewRound(_) => StageKind::InterviewRound,
        };
        let interview_data = match stage {
            Stage::InterviewRound(number) => round
                .filter(|round| round.round == *number)
                .map(InterviewData::from),
            Stage::Standard(_) => None,
        };

        Self {
            id: stage.to_string(),
            name: stage.label(),
            kind,
            interview_round_number: stage.interview_round_number(),
            interview_data,
        }
    }

    /// Reduce the wire object back to the validated stage value.
    pub fn stage(&self) -> Result<Stage, StageError> {
        Stage::parse(&self.id)
    }
}

/// Application snapshot exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub application_id: ApplicationId,
    pub owner: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_ref: Option<String>,
    pub stage: StageView,
    pub milestone: Milestone,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl ApplicationView {
    pub fn new(application: &Application, round: Option<&InterviewRound>) -> Self {
        Self {
            application_id: application.id.clone(),
            owner: application.owner.clone(),
            company_ref: application.company_ref.clone(),
            platform_ref: application.platform_ref.clone(),
            stage: StageView::from_stage(&application.stage, round),
            milestone: application.milestone(),
            is_archived: application.is_archived,
            created_at: application.created_at,
            last_activity_at: application.last_activity_at,
        }
    }
}

/// Audit-trail row exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionView {
    pub from_stage: String,
    pub to_stage: String,
    pub actor: Actor,
    pub changed_at: DateTime<Utc>,
}

impl From<&StageTransition> for TransitionView {
    fn from(transition: &StageTransition) -> Self {
        Self {
            from_stage: transition.from_stage.to_string(),
            to_stage: transition.to_stage.to_string(),
            actor: transition.actor.clone(),
            changed_at: transition.changed_at,
        }
    }
}
