/// Answer normalisation and comparison.
pub mod answer;
/// OpenAPI documentation generation.
pub mod documentation;
/// Favourite marks of the token owner.
pub mod favourite_service;
/// Health check service.
pub mod health_service;
/// Random play sessions: deal, re-deal and score.
pub mod play_service;
/// Quiz listing, authoring and single-quiz checks.
pub mod quiz_service;
/// Initial users and quizzes.
pub mod seed_service;
/// Uniform random selection of quizzes.
pub mod selection;
/// Expiry of idle play sessions.
pub mod session_sweeper;
/// Storage connection supervisor with backoff.
pub mod storage_supervisor;
/// Token authentication and user directory.
pub mod user_service;
