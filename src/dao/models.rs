use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Identifier of a quiz. Ids are allocated by the store and never reused, but deletions leave gaps.
pub type QuizId = u64;
/// Identifier of a user.
pub type UserId = u64;

/// Question/answer pair persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizEntity {
    /// Primary key of the quiz.
    pub id: QuizId,
    /// Question shown to players.
    pub question: String,
    /// Expected answer, compared case-insensitively.
    pub answer: String,
    /// Author of the quiz, if the quiz was created by a known user.
    pub author_id: Option<UserId>,
    /// Users that marked this quiz as a favourite (insertion order, no duplicates).
    pub fans: Vec<UserId>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the question or answer changed.
    pub updated_at: SystemTime,
}

impl QuizEntity {
    /// Whether `user_id` marked this quiz as a favourite.
    pub fn is_fan(&self, user_id: UserId) -> bool {
        self.fans.contains(&user_id)
    }
}

/// Payload used to insert a quiz; the store assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuizEntity {
    pub question: String,
    pub answer: String,
    pub author_id: Option<UserId>,
}

/// Account able to call the API, identified by an opaque token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Primary key of the user.
    pub id: UserId,
    /// Unique display name.
    pub username: String,
    /// Administrators may edit and delete any quiz.
    pub is_admin: bool,
    /// API token presented in the `X-Quiz-Token` header.
    pub token: String,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Payload used to insert a user; the store assigns the id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserEntity {
    pub username: String,
    pub is_admin: bool,
    pub token: String,
}
