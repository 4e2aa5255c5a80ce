use mongodb::error::Error as MongoError;
use thiserror::Error;

use crate::dao::models::{QuizId, UserId};

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to allocate the next `{sequence}` id")]
    NextId {
        sequence: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to count quizzes")]
    CountQuizzes {
        #[source]
        source: MongoError,
    },
    #[error("failed to list quizzes")]
    ListQuizzes {
        #[source]
        source: MongoError,
    },
    #[error("failed to load quiz `{id}`")]
    LoadQuiz {
        id: QuizId,
        #[source]
        source: MongoError,
    },
    #[error("failed to save quiz `{id}`")]
    SaveQuiz {
        id: QuizId,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete quiz `{id}`")]
    DeleteQuiz {
        id: QuizId,
        #[source]
        source: MongoError,
    },
    #[error("failed to save user `{username}`")]
    SaveUser {
        username: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load user `{id}`")]
    LoadUser {
        id: UserId,
        #[source]
        source: MongoError,
    },
    #[error("failed to look up user")]
    LookupUser {
        #[source]
        source: MongoError,
    },
    #[error("failed to list users")]
    ListUsers {
        #[source]
        source: MongoError,
    },
}
