use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::activity::RecomputeTrigger;
use super::domain::{ApplicationId, InterviewRound, InterviewType, RoundStatus};
use super::stage::StageError;
use super::store::{InterviewRoundStore, StoreError};

/// Error raised by interview-round operations.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    #[error(transparent)]
    Stage(#[from] StageError),
    #[error("cannot {action} interview round with status {status}")]
    InvalidState {
        action: &'static str,
        status: RoundStatus,
    },
    #[error("completion at {completed_at} precedes scheduling at {scheduled_at}")]
    InvalidTimestamp {
        scheduled_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives the scheduling/completion lifecycle of individual interview
/// rounds. Rounds are numbered per application and independent of the
/// application's stage value; callers that also want the stage moved go
/// through the stage machine.
pub struct InterviewRoundManager<R> {
    rounds: Arc<R>,
    recompute: Arc<dyn RecomputeTrigger>,
}

impl<R> InterviewRoundManager<R>
where
    R: InterviewRoundStore + 'static,
{
    pub fn new(rounds: Arc<R>, recompute: Arc<dyn RecomputeTrigger>) -> Self {
        Self { rounds, recompute }
    }

    /// Create a round as `scheduled`, or schedule an existing `unscheduled`
    /// one. Already-scheduled rounds go through [`Self::reschedule`].
    pub fn schedule(
        &self,
        id: &ApplicationId,
        round_number: u32,
        interview_type: InterviewType,
        custom_name: Option<String>,
        scheduled_at: DateTime<Utc>,
    ) -> Result<InterviewRound, RoundError> {
        if round_number == 0 {
            return Err(StageError::InvalidRound(round_number).into());
        }

        let round = match self.rounds.fetch(id, round_number)? {
            None => InterviewRound {
                application_id: id.clone(),
                round: round_number,
                interview_type,
                custom_name,
                status: RoundStatus::Scheduled,
                scheduled_at: Some(scheduled_at),
                completed_at: None,
                result: None,
                rejection_reason: None,
            },
            Some(mut existing) if existing.status == RoundStatus::Unscheduled => {
                existing.interview_type = interview_type;
                existing.custom_name = custom_name;
                existing.status = RoundStatus::Scheduled;
                existing.scheduled_at = Some(scheduled_at);
                existing
            }
            Some(existing) => {
                return Err(RoundError::InvalidState {
                    action: "schedule",
                    status: existing.status,
                })
            }
        };

        let stored = self.rounds.upsert(round)?;
        self.recompute.trigger(id);
        Ok(stored)
    }

    /// Move a `scheduled`/`rescheduled` round to `rescheduled` with a new
    /// scheduling timestamp.
    pub fn reschedule(
        &self,
        id: &ApplicationId,
        round_number: u32,
        scheduled_at: DateTime<Utc>,
    ) -> Result<InterviewRound, RoundError> {
        let mut round = self
            .rounds
            .fetch(id, round_number)?
            .ok_or(StoreError::NotFound)?;

        match round.status {
            RoundStatus::Scheduled | RoundStatus::Rescheduled => {
                round.status = RoundStatus::Rescheduled;
                round.scheduled_at = Some(scheduled_at);
            }
            status => {
                return Err(RoundError::InvalidState {
                    action: "reschedule",
                    status,
                })
            }
        }

        let stored = self.rounds.upsert(round)?;
        self.recompute.trigger(id);
        Ok(stored)
    }

    /// Complete a `scheduled`/`rescheduled` round. Completion may not
    /// precede the scheduled time.
    pub fn complete(
        &self,
        id: &ApplicationId,
        round_number: u32,
        completed_at: DateTime<Utc>,
        result: Option<String>,
    ) -> Result<InterviewRound, RoundError> {
        let mut round = self
            .rounds
            .fetch(id, round_number)?
            .ok_or(StoreError::NotFound)?;

        if !matches!(
            round.status,
            RoundStatus::Scheduled | RoundStatus::Rescheduled
        ) {
            return Err(RoundError::InvalidState {
                action: "complete",
                status: round.status,
            });
        }
        if let Some(scheduled_at) = round.scheduled_at {
            if completed_at < scheduled_at {
                return Err(RoundError::InvalidTimestamp {
                    scheduled_at,
                    completed_at,
                });
            }
        }

        round.status = RoundStatus::Completed;
        round.completed_at = Some(completed_at);
        round.result = result;

        let stored = self.rounds.upsert(round)?;
        self.recompute.trigger(id);
        Ok(stored)
    }

    /// Terminal rejection, allowed from any non-terminal status.
    pub fn reject(
        &self,
        id: &ApplicationId,
        round_number: u32,
        rejection_reason: Option<String>,
    ) -> Result<InterviewRound, RoundError> {
        self.terminate(id, round_number, "reject", |round| {
            round.status = RoundStatus::Rejected;
            round.rejection_reason = rejection_reason;
        })
    }

    /// Terminal withdrawal, allowed from any non-terminal status.
    pub fn withdraw(
        &self,
        id: &ApplicationId,
        round_number: u32,
    ) -> Result<InterviewRound, RoundError> {
        self.terminate(id, round_number, "withdraw", |round| {
            round.status = RoundStatus::Withdrawn;
        })
    }

    /// All rounds for an application, ordered by round number.
    pub fn rounds(&self, id: &ApplicationId) -> Result<Vec<InterviewRound>, RoundError> {
        Ok(self.rounds.for_application(id)?)
    }

    pub fn round(
        &self,
        id: &ApplicationId,
        round_number: u32,
    ) -> Result<Option<InterviewRound>, RoundError> {
        Ok(self.rounds.fetch(id, round_number)?)
    }

    fn terminate(
        &self,
        id: &ApplicationId,
        round_number: u32,
        action: &'static str,
        apply: impl FnOnce(&mut InterviewRound),
    ) -> Result<InterviewRound, RoundError> {
        let mut round = self
            .rounds
            .fetch(id, round_number)?
            .ok_or(StoreError::NotFound)?;

        if round.status.is_terminal() {
            return Err(RoundError::InvalidState {
                action,
                status: round.status,
            });
        }

        apply(&mut round);
        let stored = self.rounds.upsert(round)?;
        self.recompute.trigger(id);
        Ok(stored)
    }
}
