mod filter;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

pub use filter::{QuizFilter, SearchPattern};

use std::time::SystemTime;

use futures::future::BoxFuture;

use crate::dao::models::{NewQuizEntity, NewUserEntity, QuizEntity, QuizId, UserEntity, UserId};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for quizzes, favourites and users.
///
/// Offset-based methods walk quizzes in ascending id order.
pub trait QuizStore: Send + Sync {
    /// Number of quizzes whose id is not listed in `excluded`.
    fn count_quizzes_excluding(&self, excluded: Vec<QuizId>)
    -> BoxFuture<'static, StorageResult<u64>>;
    /// Quiz found at `offset` among the quizzes whose id is not listed in `excluded`.
    fn quiz_at_offset(
        &self,
        excluded: Vec<QuizId>,
        offset: u64,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    fn find_quiz(&self, id: QuizId) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    fn count_quizzes(&self, filter: QuizFilter) -> BoxFuture<'static, StorageResult<u64>>;
    fn list_quizzes(
        &self,
        filter: QuizFilter,
        offset: u64,
        limit: u64,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>>;
    fn insert_quiz(&self, quiz: NewQuizEntity) -> BoxFuture<'static, StorageResult<QuizEntity>>;
    /// Replace question and answer; `None` when the quiz does not exist.
    fn update_quiz(
        &self,
        id: QuizId,
        question: String,
        answer: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>>;
    /// Returns `false` when there was nothing to delete.
    fn delete_quiz(&self, id: QuizId) -> BoxFuture<'static, StorageResult<bool>>;
    /// Number of quizzes written by `author_id` since `since` (inclusive).
    fn count_authored_since(
        &self,
        author_id: UserId,
        since: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>>;
    /// Add or remove `user_id` from the quiz fans. Returns `false` when the quiz does not exist.
    fn set_favourite(
        &self,
        quiz_id: QuizId,
        user_id: UserId,
        favourite: bool,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn insert_user(&self, user: NewUserEntity) -> BoxFuture<'static, StorageResult<UserEntity>>;
    fn find_user(&self, id: UserId) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn find_user_by_token(
        &self,
        token: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn find_users(&self, ids: Vec<UserId>) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;
    /// All users ordered by username.
    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
