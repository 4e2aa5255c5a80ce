use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::play::{DealResponse, PlayCheckRequest, PlayCheckResponse},
    error::AppError,
    routes::auth::CurrentUser,
    services::play_service,
    state::SharedState,
};

/// Random play session of the token owner.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/play/new", post(new_play))
        .route("/api/play/next", get(next_play))
        .route("/api/play/check", post(check_play))
}

/// Start a new random play run and deal its first quiz.
#[utoipa::path(
    post,
    path = "/api/play/new",
    tag = "play",
    params(("X-Quiz-Token" = String, Header, description = "API token of the caller")),
    responses(
        (status = 200, description = "First quiz, or nomore when the store is empty", body = DealResponse),
        (status = 409, description = "Another request changed the play session meanwhile")
    )
)]
pub async fn new_play(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<DealResponse>, AppError> {
    Ok(Json(play_service::start_new(&state, user.id).await?))
}

/// Deal the pending quiz again, or the next unsolved one.
#[utoipa::path(
    get,
    path = "/api/play/next",
    tag = "play",
    params(("X-Quiz-Token" = String, Header, description = "API token of the caller")),
    responses(
        (status = 200, description = "Quiz to answer, or nomore with the final score", body = DealResponse),
        (status = 404, description = "The pending quiz was deleted"),
        (status = 409, description = "Another request changed the play session meanwhile")
    )
)]
pub async fn next_play(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<DealResponse>, AppError> {
    Ok(Json(play_service::next_quiz(&state, user.id).await?))
}

/// Answer the pending quiz. A wrong answer ends the run.
#[utoipa::path(
    post,
    path = "/api/play/check",
    tag = "play",
    params(("X-Quiz-Token" = String, Header, description = "API token of the caller")),
    request_body = PlayCheckRequest,
    responses(
        (status = 200, description = "Verdict and score", body = PlayCheckResponse),
        (status = 409, description = "No quiz is waiting for an answer, or another request changed the play session meanwhile")
    )
)]
pub async fn check_play(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<PlayCheckRequest>,
) -> Result<Json<PlayCheckResponse>, AppError> {
    Ok(Json(
        play_service::submit_answer(&state, user.id, payload.answer).await?,
    ))
}
