use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::play::new_play,
        crate::routes::play::next_play,
        crate::routes::play::check_play,
        crate::routes::quizzes::list_quizzes,
        crate::routes::quizzes::list_user_quizzes,
        crate::routes::quizzes::create_quiz,
        crate::routes::quizzes::show_quiz,
        crate::routes::quizzes::update_quiz,
        crate::routes::quizzes::delete_quiz,
        crate::routes::quizzes::check_quiz,
        crate::routes::quizzes::quiz_answer,
        crate::routes::quizzes::random_quiz,
        crate::routes::quizzes::random_ten,
        crate::routes::quizzes::random_ten_with_answers,
        crate::routes::users::list_users,
        crate::routes::users::show_user,
        crate::routes::users::token_owner,
        crate::routes::users::add_favourite,
        crate::routes::users::remove_favourite,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::play::DealResponse,
            crate::dto::play::PlayCheckRequest,
            crate::dto::play::PlayCheckResponse,
            crate::dto::quiz::QuizView,
            crate::dto::quiz::QuizRequest,
            crate::dto::quiz::QuizPage,
            crate::dto::quiz::CheckResponse,
            crate::dto::quiz::QuizAnswerResponse,
            crate::dto::quiz::RandomQuizResponse,
            crate::dto::user::UserView,
            crate::dto::favourite::FavouriteResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "play", description = "Random play sessions of the token owner"),
        (name = "quizzes", description = "Quiz browsing, authoring and checks"),
        (name = "users", description = "Users and favourites"),
    )
)]
pub struct ApiDoc;
