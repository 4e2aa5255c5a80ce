use axum::{
    Extension, Json, Router,
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dao::models::{QuizId, UserId},
    dto::{
        pagination::{ListQuery, PageLink},
        quiz::{
            CheckQuery, CheckResponse, QuizAnswerResponse, QuizPage, QuizRequest, QuizView,
            RandomQuizResponse,
        },
    },
    error::AppError,
    routes::auth::CurrentUser,
    services::quiz_service,
    state::SharedState,
};

/// Quiz browsing, authoring and single-quiz checks.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/quizzes", get(list_quizzes).post(create_quiz))
        .route("/api/quizzes/random", get(random_quiz))
        .route("/api/quizzes/random10", get(random_ten))
        .route("/api/quizzes/random10wa", get(random_ten_with_answers))
        .route(
            "/api/quizzes/{quizId}",
            get(show_quiz).put(update_quiz).delete(delete_quiz),
        )
        .route("/api/quizzes/{quizId}/check", get(check_quiz))
        .route("/api/quizzes/{quizId}/answer", get(quiz_answer))
        .route("/api/users/{userId}/quizzes", get(list_user_quizzes))
}

/// List quizzes page by page, optionally searching questions or restricting to favourites.
#[utoipa::path(
    get,
    path = "/api/quizzes",
    tag = "quizzes",
    params(("X-Quiz-Token" = String, Header, description = "API token of the caller"), ListQuery),
    responses((status = 200, description = "Page of quizzes", body = QuizPage))
)]
pub async fn list_quizzes(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ListQuery>,
) -> Result<Json<QuizPage>, AppError> {
    let link = PageLink::new(uri.path(), uri.query());
    Ok(Json(
        quiz_service::list_quizzes(&state, &user, query, None, link).await?,
    ))
}

/// List the quizzes written by a user.
#[utoipa::path(
    get,
    path = "/api/users/{userId}/quizzes",
    tag = "quizzes",
    params(
        ("X-Quiz-Token" = String, Header, description = "API token of the caller"),
        ("userId" = u64, Path, description = "Author of the quizzes"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Page of quizzes", body = QuizPage),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn list_user_quizzes(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(author_id): Path<UserId>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ListQuery>,
) -> Result<Json<QuizPage>, AppError> {
    let link = PageLink::new(uri.path(), uri.query());
    Ok(Json(
        quiz_service::list_quizzes(&state, &user, query, Some(author_id), link).await?,
    ))
}

/// Create a quiz authored by the caller.
#[utoipa::path(
    post,
    path = "/api/quizzes",
    tag = "quizzes",
    params(("X-Quiz-Token" = String, Header, description = "API token of the caller")),
    request_body = QuizRequest,
    responses(
        (status = 201, description = "Quiz created", body = QuizView),
        (status = 400, description = "Blank question or answer"),
        (status = 429, description = "Daily creation limit reached")
    )
)]
pub async fn create_quiz(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Valid(Json(payload)): Valid<Json<QuizRequest>>,
) -> Result<(StatusCode, Json<QuizView>), AppError> {
    let quiz = quiz_service::create_quiz(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{quizId}",
    tag = "quizzes",
    params(
        ("X-Quiz-Token" = String, Header, description = "API token of the caller"),
        ("quizId" = u64, Path, description = "Quiz to show")
    ),
    responses(
        (status = 200, description = "Quiz without its answer", body = QuizView),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn show_quiz(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<QuizId>,
) -> Result<Json<QuizView>, AppError> {
    Ok(Json(quiz_service::show_quiz(&state, &user, id).await?))
}

/// Replace the question and answer of a quiz. Restricted to its author and admins.
#[utoipa::path(
    put,
    path = "/api/quizzes/{quizId}",
    tag = "quizzes",
    params(
        ("X-Quiz-Token" = String, Header, description = "API token of the caller"),
        ("quizId" = u64, Path, description = "Quiz to edit")
    ),
    request_body = QuizRequest,
    responses(
        (status = 200, description = "Quiz updated", body = QuizView),
        (status = 403, description = "Caller is neither author nor admin"),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn update_quiz(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<QuizId>,
    Valid(Json(payload)): Valid<Json<QuizRequest>>,
) -> Result<Json<QuizView>, AppError> {
    Ok(Json(
        quiz_service::update_quiz(&state, &user, id, payload).await?,
    ))
}

/// Delete a quiz. Restricted to its author and admins.
#[utoipa::path(
    delete,
    path = "/api/quizzes/{quizId}",
    tag = "quizzes",
    params(
        ("X-Quiz-Token" = String, Header, description = "API token of the caller"),
        ("quizId" = u64, Path, description = "Quiz to delete")
    ),
    responses(
        (status = 204, description = "Quiz deleted"),
        (status = 403, description = "Caller is neither author nor admin"),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn delete_quiz(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<QuizId>,
) -> Result<StatusCode, AppError> {
    quiz_service::delete_quiz(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check an answer against a quiz without affecting any play session.
#[utoipa::path(
    get,
    path = "/api/quizzes/{quizId}/check",
    tag = "quizzes",
    params(
        ("X-Quiz-Token" = String, Header, description = "API token of the caller"),
        ("quizId" = u64, Path, description = "Quiz to check"),
        CheckQuery
    ),
    responses(
        (status = 200, description = "Verdict", body = CheckResponse),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn check_quiz(
    State(state): State<SharedState>,
    Path(id): Path<QuizId>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<CheckResponse>, AppError> {
    Ok(Json(quiz_service::check_answer(&state, id, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{quizId}/answer",
    tag = "quizzes",
    params(
        ("X-Quiz-Token" = String, Header, description = "API token of the caller"),
        ("quizId" = u64, Path, description = "Quiz whose answer is revealed")
    ),
    responses(
        (status = 200, description = "Expected answer", body = QuizAnswerResponse),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn quiz_answer(
    State(state): State<SharedState>,
    Path(id): Path<QuizId>,
) -> Result<Json<QuizAnswerResponse>, AppError> {
    Ok(Json(quiz_service::reveal_answer(&state, id).await?))
}

/// One random quiz, or `{ "nomore": true }` when there are none.
#[utoipa::path(
    get,
    path = "/api/quizzes/random",
    tag = "quizzes",
    params(("X-Quiz-Token" = String, Header, description = "API token of the caller")),
    responses((status = 200, description = "Random quiz", body = RandomQuizResponse))
)]
pub async fn random_quiz(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<RandomQuizResponse>, AppError> {
    Ok(Json(quiz_service::random_quiz(&state, &user).await?))
}

/// A batch of distinct random quizzes without their answers.
#[utoipa::path(
    get,
    path = "/api/quizzes/random10",
    tag = "quizzes",
    params(("X-Quiz-Token" = String, Header, description = "API token of the caller")),
    responses((status = 200, description = "Random quizzes", body = [QuizView]))
)]
pub async fn random_ten(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<QuizView>>, AppError> {
    Ok(Json(
        quiz_service::sample_quizzes(&state, &user, false).await?,
    ))
}

/// A batch of distinct random quizzes including their answers.
#[utoipa::path(
    get,
    path = "/api/quizzes/random10wa",
    tag = "quizzes",
    params(("X-Quiz-Token" = String, Header, description = "API token of the caller")),
    responses((status = 200, description = "Random quizzes with answers", body = [QuizView]))
)]
pub async fn random_ten_with_answers(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<QuizView>>, AppError> {
    Ok(Json(quiz_service::sample_quizzes(&state, &user, true).await?))
}
