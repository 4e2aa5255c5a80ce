use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, put},
};

use crate::{
    dao::models::{QuizId, UserId},
    dto::{favourite::FavouriteResponse, user::UserView},
    error::AppError,
    routes::auth::CurrentUser,
    services::{favourite_service, user_service},
    state::SharedState,
};

/// User directory and favourites of the token owner.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/tokenOwner", get(token_owner))
        .route("/api/users/{userId}", get(show_user))
        .route(
            "/api/users/tokenOwner/favourites/{quizId}",
            put(add_favourite).delete(remove_favourite),
        )
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(("X-Quiz-Token" = String, Header, description = "API token of the caller")),
    responses((status = 200, description = "Users ordered by username", body = [UserView]))
)]
pub async fn list_users(State(state): State<SharedState>) -> Result<Json<Vec<UserView>>, AppError> {
    Ok(Json(user_service::list_users(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/{userId}",
    tag = "users",
    params(
        ("X-Quiz-Token" = String, Header, description = "API token of the caller"),
        ("userId" = u64, Path, description = "User to show")
    ),
    responses(
        (status = 200, description = "User", body = UserView),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn show_user(
    State(state): State<SharedState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserView>, AppError> {
    Ok(Json(user_service::show_user(&state, id).await?))
}

/// The user owning the presented token.
#[utoipa::path(
    get,
    path = "/api/users/tokenOwner",
    tag = "users",
    params(("X-Quiz-Token" = String, Header, description = "API token of the caller")),
    responses((status = 200, description = "Token owner", body = UserView))
)]
pub async fn token_owner(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserView> {
    Json(UserView::from(&user))
}

/// Mark a quiz as favourite of the token owner.
#[utoipa::path(
    put,
    path = "/api/users/tokenOwner/favourites/{quizId}",
    tag = "users",
    params(
        ("X-Quiz-Token" = String, Header, description = "API token of the caller"),
        ("quizId" = u64, Path, description = "Quiz to mark")
    ),
    responses(
        (status = 200, description = "Quiz marked", body = FavouriteResponse),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn add_favourite(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(quiz_id): Path<QuizId>,
) -> Result<Json<FavouriteResponse>, AppError> {
    Ok(Json(
        favourite_service::set_favourite(&state, &user, quiz_id, true).await?,
    ))
}

/// Unmark a quiz as favourite of the token owner.
#[utoipa::path(
    delete,
    path = "/api/users/tokenOwner/favourites/{quizId}",
    tag = "users",
    params(
        ("X-Quiz-Token" = String, Header, description = "API token of the caller"),
        ("quizId" = u64, Path, description = "Quiz to unmark")
    ),
    responses(
        (status = 200, description = "Quiz unmarked", body = FavouriteResponse),
        (status = 404, description = "Unknown quiz")
    )
)]
pub async fn remove_favourite(
    State(state): State<SharedState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(quiz_id): Path<QuizId>,
) -> Result<Json<FavouriteResponse>, AppError> {
    Ok(Json(
        favourite_service::set_favourite(&state, &user, quiz_id, false).await?,
    ))
}
