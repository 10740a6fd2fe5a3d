use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::activity::{
    ActivityRecomputer, ConversationSource, InterviewRoundSource, RecomputeTrigger, RetryPolicy,
    RetryingRecompute, StageHistorySource,
};
use super::domain::{Actor, Application, ApplicationId, ConversationEvent, InterviewType, UserId};
use super::machine::{ApplicationStageMachine, NewApplication, TransitionError};
use super::rounds::{InterviewRoundManager, RoundError};
use super::stage::Milestone;
use super::store::{
    ApplicationFilter, ApplicationStore, ConversationStore, InterviewRoundStore,
    StageHistoryStore, StoreError,
};
use super::wire::{ApplicationView, TransitionView};

/// Shared state bundling the lifecycle components over one storage backend.
///
/// [`TrackerState::with_store`] is the single place activity sources are
/// registered; a new event stream gets added here and nowhere else.
pub struct TrackerState<S> {
    machine: Arc<ApplicationStageMachine<S>>,
    rounds: Arc<InterviewRoundManager<S>>,
    store: Arc<S>,
    recompute: Arc<dyn RecomputeTrigger>,
}

impl<S> Clone for TrackerState<S> {
    fn clone(&self) -> Self {
        Self {
            machine: self.machine.clone(),
            rounds: self.rounds.clone(),
            store: self.store.clone(),
            recompute: self.recompute.clone(),
        }
    }
}

impl<S> TrackerState<S>
where
    S: ApplicationStore
        + StageHistoryStore
        + InterviewRoundStore
        + ConversationStore
        + 'static,
{
    pub fn with_store(store: Arc<S>, retry: RetryPolicy) -> Self {
        let recomputer = ActivityRecomputer::new(store.clone())
            .with_source(Arc::new(StageHistorySource::new(store.clone())))
            .with_source(Arc::new(InterviewRoundSource::new(store.clone())))
            .with_source(Arc::new(ConversationSource::new(store.clone())));
        let recompute: Arc<dyn RecomputeTrigger> =
            Arc::new(RetryingRecompute::new(recomputer, retry));

        Self {
            machine: Arc::new(ApplicationStageMachine::new(store.clone(), recompute.clone())),
            rounds: Arc::new(InterviewRoundManager::new(store.clone(), recompute.clone())),
            store,
            recompute,
        }
    }

    pub fn machine(&self) -> &ApplicationStageMachine<S> {
        &self.machine
    }

    pub fn rounds(&self) -> &InterviewRoundManager<S> {
        &self.rounds
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Ingest a conversation event from the messaging collaborator and
    /// request a recompute pass, mirroring how the writers trigger it.
    pub fn record_conversation(
        &self,
        id: &ApplicationId,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        ConversationStore::record(
            self.store.as_ref(),
            ConversationEvent {
                application_id: id.clone(),
                occurred_at,
            },
        )?;
        self.recompute.trigger(id);
        Ok(())
    }

    fn view(&self, application: &Application) -> Result<ApplicationView, StoreError> {
        let round = match application.stage.interview_round_number() {
            Some(number) => {
                InterviewRoundStore::fetch(self.store.as_ref(), &application.id, number)?
            }
            None => None,
        };
        Ok(ApplicationView::new(application, round.as_ref()))
    }
}

/// Router builder exposing the lifecycle endpoints.
pub fn tracker_router<S>(state: TrackerState<S>) -> Router
where
    S: ApplicationStore
        + StageHistoryStore
        + InterviewRoundStore
        + ConversationStore
        + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(create_handler::<S>).get(list_handler::<S>),
        )
        .route("/api/v1/applications/:application_id", get(get_handler::<S>))
        .route(
            "/api/v1/applications/:application_id/stage",
            post(transition_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/history",
            get(history_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/archive",
            post(archive_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/restore",
            post(restore_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/rounds",
            get(rounds_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/rounds/:round/schedule",
            post(schedule_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/rounds/:round/reschedule",
            post(reschedule_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/rounds/:round/complete",
            post(complete_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/rounds/:round/reject",
            post(reject_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/rounds/:round/withdraw",
            post(withdraw_handler::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/events",
            post(event_handler::<S>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateApplicationRequest {
    owner: String,
    #[serde(default)]
    company_ref: Option<String>,
    #[serde(default)]
    platform_ref: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    owner: String,
    #[serde(default)]
    milestone: Option<String>,
    #[serde(default)]
    platform: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransitionRequest {
    stage: String,
    actor: String,
    #[serde(default)]
    changed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleRequest {
    #[serde(rename = "type")]
    interview_type: InterviewType,
    #[serde(default)]
    custom_name: Option<String>,
    scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RescheduleRequest {
    scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompleteRequest {
    completed_at: DateTime<Utc>,
    #[serde(default)]
    result: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectRequest {
    #[serde(default)]
    rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationEventRequest {
    occurred_at: DateTime<Utc>,
}

fn error_response(status: StatusCode, message: impl ToString) -> Response {
    (status, Json(json!({ "error": message.to_string() }))).into_response()
}

fn store_error_response(error: StoreError) -> Response {
    let status = match error {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, error)
}

fn transition_error_response(error: TransitionError) -> Response {
    match error {
        TransitionError::Stage(err) => error_response(StatusCode::UNPROCESSABLE_ENTITY, err),
        TransitionError::Store(err) => store_error_response(err),
    }
}

fn round_error_response(error: RoundError) -> Response {
    match error {
        RoundError::Stage(err) => error_response(StatusCode::UNPROCESSABLE_ENTITY, err),
        RoundError::InvalidTimestamp { .. } => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error)
        }
        RoundError::InvalidState { .. } => error_response(StatusCode::CONFLICT, error),
        RoundError::Store(err) => store_error_response(err),
    }
}

async fn create_handler<S>(
    State(state): State<TrackerState<S>>,
    Json(request): Json<CreateApplicationRequest>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let created_at = request.created_at.unwrap_or_else(Utc::now);
    let intake = NewApplication {
        owner: UserId(request.owner),
        company_ref: request.company_ref,
        platform_ref: request.platform_ref,
    };

    match state.machine.create(intake, created_at) {
        Ok(application) => match state.view(&application) {
            Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
            Err(err) => store_error_response(err),
        },
        Err(err) => transition_error_response(err),
    }
}

async fn get_handler<S>(
    State(state): State<TrackerState<S>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    match ApplicationStore::fetch(state.store.as_ref(), &id) {
        Ok(Some(application)) => match state.view(&application) {
            Ok(view) => (StatusCode::OK, Json(view)).into_response(),
            Err(err) => store_error_response(err),
        },
        Ok(None) => error_response(StatusCode::NOT_FOUND, "application not found"),
        Err(err) => store_error_response(err),
    }
}

async fn list_handler<S>(
    State(state): State<TrackerState<S>>,
    Query(params): Query<ListParams>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let milestone = match params.milestone.as_deref() {
        Some(raw) => match Milestone::parse(raw) {
            Some(milestone) => Some(milestone),
            None => {
                return error_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("unrecognized milestone '{raw}'"),
                )
            }
        },
        None => None,
    };

    let filter = ApplicationFilter {
        milestone,
        platform_ref: params.platform,
    };

    match state
        .store
        .list(&UserId(params.owner), &filter)
        .and_then(|applications| {
            applications
                .iter()
                .map(|application| state.view(application))
                .collect::<Result<Vec<_>, _>>()
        }) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => store_error_response(err),
    }
}

async fn transition_handler<S>(
    State(state): State<TrackerState<S>>,
    Path(application_id): Path<String>,
    Json(request): Json<TransitionRequest>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    let changed_at = request.changed_at.unwrap_or_else(Utc::now);

    match state
        .machine
        .transition(&id, &request.stage, Actor(request.actor), changed_at)
    {
        Ok(outcome) => {
            let applied = outcome.applied();
            match state.view(outcome.application()) {
                Ok(view) => (
                    StatusCode::OK,
                    Json(json!({ "applied": applied, "application": view })),
                )
                    .into_response(),
                Err(err) => store_error_response(err),
            }
        }
        Err(err) => transition_error_response(err),
    }
}

async fn history_handler<S>(
    State(state): State<TrackerState<S>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    match state.machine.history(&id) {
        Ok(transitions) => {
            let views: Vec<TransitionView> = transitions.iter().map(TransitionView::from).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => transition_error_response(err),
    }
}

async fn archive_handler<S>(
    State(state): State<TrackerState<S>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    match state.machine.archive(&id) {
        Ok(application) => match state.view(&application) {
            Ok(view) => (StatusCode::OK, Json(view)).into_response(),
            Err(err) => store_error_response(err),
        },
        Err(err) => transition_error_response(err),
    }
}

async fn restore_handler<S>(
    State(state): State<TrackerState<S>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    match state.machine.restore(&id) {
        Ok(application) => match state.view(&application) {
            Ok(view) => (StatusCode::OK, Json(view)).into_response(),
            Err(err) => store_error_response(err),
        },
        Err(err) => transition_error_response(err),
    }
}

async fn rounds_handler<S>(
    State(state): State<TrackerState<S>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    match state.rounds.rounds(&id) {
        Ok(rounds) => (StatusCode::OK, Json(rounds)).into_response(),
        Err(err) => round_error_response(err),
    }
}

async fn schedule_handler<S>(
    State(state): State<TrackerState<S>>,
    Path((application_id, round)): Path<(String, u32)>,
    Json(request): Json<ScheduleRequest>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    match state.rounds.schedule(
        &id,
        round,
        request.interview_type,
        request.custom_name,
        request.scheduled_at,
    ) {
        Ok(round) => (StatusCode::OK, Json(round)).into_response(),
        Err(err) => round_error_response(err),
    }
}

async fn reschedule_handler<S>(
    State(state): State<TrackerState<S>>,
    Path((application_id, round)): Path<(String, u32)>,
    Json(request): Json<RescheduleRequest>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    match state.rounds.reschedule(&id, round, request.scheduled_at) {
        Ok(round) => (StatusCode::OK, Json(round)).into_response(),
        Err(err) => round_error_response(err),
    }
}

async fn complete_handler<S>(
    State(state): State<TrackerState<S>>,
    Path((application_id, round)): Path<(String, u32)>,
    Json(request): Json<CompleteRequest>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    match state
        .rounds
        .complete(&id, round, request.completed_at, request.result)
    {
        Ok(round) => (StatusCode::OK, Json(round)).into_response(),
        Err(err) => round_error_response(err),
    }
}

async fn reject_handler<S>(
    State(state): State<TrackerState<S>>,
    Path((application_id, round)): Path<(String, u32)>,
    Json(request): Json<RejectRequest>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    match state.rounds.reject(&id, round, request.rejection_reason) {
        Ok(round) => (StatusCode::OK, Json(round)).into_response(),
        Err(err) => round_error_response(err),
    }
}

async fn withdraw_handler<S>(
    State(state): State<TrackerState<S>>,
    Path((application_id, round)): Path<(String, u32)>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    match state.rounds.withdraw(&id, round) {
        Ok(round) => (StatusCode::OK, Json(round)).into_response(),
        Err(err) => round_error_response(err),
    }
}

async fn event_handler<S>(
    State(state): State<TrackerState<S>>,
    Path(application_id): Path<String>,
    Json(request): Json<ConversationEventRequest>,
) -> Response
where
    S: ApplicationStore + StageHistoryStore + InterviewRoundStore + ConversationStore + 'static,
{
    let id = ApplicationId(application_id);
    match state.record_conversation(&id, request.occurred_at) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(json!({ "status": "recorded", "application_id": id.0 })),
        )
            .into_response(),
        Err(err) => store_error_response(err),
    }
}
