use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::error;

use tower_http::services::ServeDir;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::state::*;
use super::{log_requests, RequestsLoggingLevel};
use crate::progress::{
    tracker, Category, ExerciseSession, JourneySection, LearningProgress, StepAccess,
    JOURNEY_STEPS,
};
use crate::theory;
use crate::theory::{PitchClass, ScaleKind, TheoryError};
use crate::user::{CreateUserOutcome, UserStore};

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
}

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn internal_error(context: &str, err: anyhow::Error) -> Response {
    error!("{}: {:?}", context, err);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

// ---------------------------------------------------------------------------
// Theory routes (stateless)
// ---------------------------------------------------------------------------

async fn get_scales() -> Response {
    let scales: Vec<theory::Scale> = theory::MAJOR_SCALES
        .iter()
        .chain(theory::MINOR_SCALES.iter())
        .map(theory::scale_for)
        .collect();
    Json(scales).into_response()
}

async fn get_scales_by_difficulty() -> Response {
    Json(theory::scales_by_difficulty()).into_response()
}

async fn get_scale(Path((kind, tonic)): Path<(String, String)>) -> Response {
    let kind = match kind.as_str() {
        "major" => ScaleKind::Major,
        "minor" => ScaleKind::Minor,
        other => return bad_request(format!("unknown scale kind: {}", other)),
    };
    match theory::find_scale(kind, &tonic) {
        Some(definition) => Json(theory::scale_for(definition)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_intervals() -> Response {
    Json(theory::INTERVALS).into_response()
}

#[derive(Deserialize, Debug)]
struct BuildIntervalBody {
    pub start: String,
    pub interval: String,
    pub direction: theory::Direction,
}

#[derive(Serialize)]
struct BuildIntervalResponse {
    note: String,
}

async fn build_interval(Json(body): Json<BuildIntervalBody>) -> Response {
    let start: PitchClass = match body.start.parse() {
        Ok(pitch) => pitch,
        Err(TheoryError::UnknownPitch(s)) => {
            return bad_request(format!("unknown pitch spelling: {}", s))
        }
        Err(err) => return bad_request(err.to_string()),
    };
    match theory::build_interval(start, &body.interval, body.direction) {
        Ok(note) => Json(BuildIntervalResponse {
            note: note.to_string(),
        })
        .into_response(),
        Err(err) => bad_request(err.to_string()),
    }
}

#[derive(Deserialize, Debug)]
struct IdentifyParams {
    pub start: String,
    pub end: String,
}

#[derive(Serialize)]
struct IdentifyResponse {
    name: String,
    semitones: Option<u8>,
    short: Option<String>,
}

async fn identify_interval(Query(params): Query<IdentifyParams>) -> Response {
    let start: PitchClass = match params.start.parse() {
        Ok(pitch) => pitch,
        Err(err) => return bad_request(err.to_string()),
    };
    let end: PitchClass = match params.end.parse() {
        Ok(pitch) => pitch,
        Err(err) => return bad_request(err.to_string()),
    };
    let response = match theory::identify_interval(start, end) {
        Some(definition) => IdentifyResponse {
            name: definition.name.to_owned(),
            semitones: Some(definition.semitones),
            short: Some(definition.short.to_owned()),
        },
        // No catalog entry at this distance
        None => IdentifyResponse {
            name: "Unknown".to_owned(),
            semitones: None,
            short: None,
        },
    };
    Json(response).into_response()
}

#[derive(Deserialize, Debug)]
struct CheckAnswerBody {
    pub user_answer: Vec<String>,
    pub correct_answer: Vec<String>,
    pub order_matters: bool,
}

#[derive(Serialize)]
struct CheckAnswerResponse {
    correct: bool,
}

async fn check_answer(Json(body): Json<CheckAnswerBody>) -> Response {
    match theory::check_answer(&body.user_answer, &body.correct_answer, body.order_matters) {
        Ok(correct) => Json(CheckAnswerResponse { correct }).into_response(),
        Err(err) => bad_request(err.to_string()),
    }
}

// ---------------------------------------------------------------------------
// User routes
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug)]
struct CreateUserBody {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct CreateUserResponse {
    id: i64,
    username: String,
}

async fn create_user(
    State(user_store): State<GuardedUserStore>,
    Json(body): Json<CreateUserBody>,
) -> Response {
    if body.username.trim().is_empty() {
        return bad_request("username must not be empty".to_owned());
    }
    match user_store.create_user(&body.username, &body.password) {
        Ok(CreateUserOutcome::Created(id)) => (
            StatusCode::CREATED,
            Json(CreateUserResponse {
                id,
                username: body.username,
            }),
        )
            .into_response(),
        Ok(CreateUserOutcome::UsernameTaken) => (
            StatusCode::CONFLICT,
            Json(ErrorBody {
                error: format!("username already exists: {}", body.username),
            }),
        )
            .into_response(),
        Err(err) => internal_error("creating user", err),
    }
}

// ---------------------------------------------------------------------------
// Progress routes
// ---------------------------------------------------------------------------

fn require_user(user_store: &dyn UserStore, user_id: i64) -> Result<(), Response> {
    match user_store.get_user(user_id) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(StatusCode::NOT_FOUND.into_response()),
        Err(err) => Err(internal_error("loading user", err)),
    }
}

#[derive(Deserialize, Debug)]
struct RecordAttemptBody {
    pub category: Category,
    pub item_name: String,
    pub correct: bool,
}

async fn record_attempt(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Json(body): Json<RecordAttemptBody>,
) -> Response {
    if let Err(response) = require_user(state.user_store.as_ref(), user_id) {
        return response;
    }
    if !tracker::known_item(body.category, &body.item_name) {
        return bad_request(format!(
            "unknown {} item: {}",
            body.category.as_str(),
            body.item_name
        ));
    }
    match state
        .training_store
        .record_attempt(user_id, body.category, &body.item_name, body.correct)
    {
        Ok(record) => Json(record).into_response(),
        Err(err) => internal_error("recording attempt", err),
    }
}

async fn get_user_progress(
    State(training_store): State<GuardedTrainingStore>,
    Path(user_id): Path<i64>,
) -> Response {
    match training_store.get_user_progress(user_id) {
        Ok(records) => Json(records).into_response(),
        Err(err) => internal_error("loading progress", err),
    }
}

async fn get_category_progress(
    State(training_store): State<GuardedTrainingStore>,
    Path((user_id, category)): Path<(i64, String)>,
) -> Response {
    let category: Category = match category.parse() {
        Ok(category) => category,
        Err(err) => return bad_request(err.to_string()),
    };
    match training_store.get_category_progress(user_id, category) {
        Ok(records) => Json(records).into_response(),
        Err(err) => internal_error("loading category progress", err),
    }
}

async fn get_progress_summary(
    State(training_store): State<GuardedTrainingStore>,
    Path(user_id): Path<i64>,
) -> Response {
    match training_store.get_progress_summary(user_id) {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => internal_error("building progress summary", err),
    }
}

// ---------------------------------------------------------------------------
// Session log routes
// ---------------------------------------------------------------------------

#[derive(Deserialize, Debug)]
struct AppendSessionBody {
    pub category: Category,
    pub item_name: String,
    pub is_correct: bool,
    pub user_answer: Vec<String>,
    pub correct_answer: Vec<String>,
    pub time_to_complete_secs: u32,
}

#[derive(Serialize)]
struct AppendSessionResponse {
    id: i64,
}

async fn append_session(
    State(state): State<ServerState>,
    Path(user_id): Path<i64>,
    Json(body): Json<AppendSessionBody>,
) -> Response {
    if let Err(response) = require_user(state.user_store.as_ref(), user_id) {
        return response;
    }
    let session = ExerciseSession {
        id: None,
        user_id,
        category: body.category,
        item_name: body.item_name,
        is_correct: body.is_correct,
        user_answer: body.user_answer,
        correct_answer: body.correct_answer,
        time_to_complete_secs: body.time_to_complete_secs,
        created_at: 0,
    };
    match state.training_store.append_session(session) {
        Ok(id) => (StatusCode::CREATED, Json(AppendSessionResponse { id })).into_response(),
        Err(err) => internal_error("appending session", err),
    }
}

#[derive(Deserialize, Debug)]
struct SessionQueryParams {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

const DEFAULT_SESSIONS_LIMIT: usize = 50;

fn parse_category_filter(raw: Option<String>) -> Result<Option<Category>, Response> {
    match raw {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|err: crate::progress::models::ProgressModelError| {
                bad_request(err.to_string())
            }),
    }
}

async fn get_sessions(
    State(training_store): State<GuardedTrainingStore>,
    Path(user_id): Path<i64>,
    Query(params): Query<SessionQueryParams>,
) -> Response {
    let category = match parse_category_filter(params.category) {
        Ok(category) => category,
        Err(response) => return response,
    };
    let limit = params.limit.unwrap_or(DEFAULT_SESSIONS_LIMIT);
    match training_store.get_user_sessions(user_id, category, limit) {
        Ok(sessions) => Json(sessions).into_response(),
        Err(err) => internal_error("loading sessions", err),
    }
}

async fn get_accuracy(
    State(training_store): State<GuardedTrainingStore>,
    Path(user_id): Path<i64>,
    Query(params): Query<SessionQueryParams>,
) -> Response {
    let category = match parse_category_filter(params.category) {
        Ok(category) => category,
        Err(response) => return response,
    };
    match training_store.get_accuracy(user_id, category) {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => internal_error("computing accuracy", err),
    }
}

// ---------------------------------------------------------------------------
// Learning journey routes
// ---------------------------------------------------------------------------

async fn get_journey_steps() -> Response {
    Json(JOURNEY_STEPS).into_response()
}

#[derive(Serialize)]
struct JourneyOverview {
    steps: Vec<StepAccess>,
    sections: Vec<LearningProgress>,
}

async fn get_journey(
    State(training_store): State<GuardedTrainingStore>,
    Path(user_id): Path<i64>,
) -> Response {
    let steps = match training_store.get_step_access(user_id) {
        Ok(steps) => steps,
        Err(err) => return internal_error("loading step access", err),
    };
    match training_store.get_learning_progress(user_id) {
        Ok(sections) => Json(JourneyOverview { steps, sections }).into_response(),
        Err(err) => internal_error("loading learning progress", err),
    }
}

fn valid_step_id(step_id: u8) -> bool {
    JOURNEY_STEPS.iter().any(|step| step.id == step_id)
}

async fn get_step_access(
    State(training_store): State<GuardedTrainingStore>,
    Path((user_id, step_id)): Path<(i64, u8)>,
) -> Response {
    if !valid_step_id(step_id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    match training_store.get_step_access(user_id) {
        Ok(steps) => match steps.into_iter().find(|access| access.step_id == step_id) {
            Some(access) => Json(access).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        Err(err) => internal_error("loading step access", err),
    }
}

#[derive(Deserialize, Debug)]
struct CompleteSectionBody {
    pub section: JourneySection,
    pub score: Option<u32>,
}

async fn complete_section(
    State(state): State<ServerState>,
    Path((user_id, step_id)): Path<(i64, u8)>,
    Json(body): Json<CompleteSectionBody>,
) -> Response {
    if !valid_step_id(step_id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    if let Err(response) = require_user(state.user_store.as_ref(), user_id) {
        return response;
    }

    // Gate: earlier steps must be fully completed first
    let accessible = match state.training_store.get_step_access(user_id) {
        Ok(steps) => steps
            .iter()
            .find(|access| access.step_id == step_id)
            .map(|access| access.accessible)
            .unwrap_or(false),
        Err(err) => return internal_error("loading step access", err),
    };
    if !accessible {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorBody {
                error: format!("step {} is locked until the previous step is completed", step_id),
            }),
        )
            .into_response();
    }

    match state
        .training_store
        .complete_section(user_id, step_id, body.section, body.score)
    {
        Ok(record) => Json(record).into_response(),
        Err(err) => internal_error("completing section", err),
    }
}

// ---------------------------------------------------------------------------
// App assembly
// ---------------------------------------------------------------------------

pub fn make_app(
    config: ServerConfig,
    user_store: GuardedUserStore,
    training_store: GuardedTrainingStore,
) -> Router {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        user_store,
        training_store,
        hash: env!("GIT_HASH").to_owned(),
    };

    let theory_routes: Router = Router::new()
        .route("/scales", get(get_scales))
        .route("/scales/difficulty", get(get_scales_by_difficulty))
        .route("/scales/{kind}/{tonic}", get(get_scale))
        .route("/intervals", get(get_intervals))
        .route("/intervals/build", post(build_interval))
        .route("/intervals/identify", get(identify_interval))
        .route("/check", post(check_answer))
        .with_state(state.clone());

    let user_routes: Router = Router::new()
        .route("/v1/users", post(create_user))
        .with_state(state.clone());

    let progress_routes: Router = Router::new()
        .route("/{user_id}", get(get_user_progress))
        .route("/{user_id}/attempts", post(record_attempt))
        .route("/{user_id}/summary", get(get_progress_summary))
        .route("/{user_id}/category/{category}", get(get_category_progress))
        .with_state(state.clone());

    let session_routes: Router = Router::new()
        .route("/{user_id}", post(append_session).get(get_sessions))
        .route("/{user_id}/accuracy", get(get_accuracy))
        .with_state(state.clone());

    let journey_routes: Router = Router::new()
        .route("/steps", get(get_journey_steps))
        .route("/{user_id}", get(get_journey))
        .route("/{user_id}/steps/{step_id}/access", get(get_step_access))
        .route("/{user_id}/steps/{step_id}/complete", post(complete_section))
        .with_state(state.clone());

    let home_router: Router = match &state.config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)).with_state(state.clone()),
    };

    home_router
        .nest("/v1/theory", theory_routes)
        .merge(user_routes)
        .nest("/v1/progress", progress_routes)
        .nest("/v1/sessions", session_routes)
        .nest("/v1/journey", journey_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    config: ServerConfig,
    user_store: GuardedUserStore,
    training_store: GuardedTrainingStore,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, user_store, training_store);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    Ok(axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?)
}
