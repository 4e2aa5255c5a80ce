//! Process-local [`QuizStore`] used for local runs and tests. Data is lost on restart.

use std::{collections::BTreeMap, sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use super::{QuizFilter, QuizStore};
use crate::dao::{
    models::{NewQuizEntity, NewUserEntity, QuizEntity, QuizId, UserEntity, UserId},
    storage::StorageResult,
};

#[derive(Clone, Default)]
pub struct MemoryQuizStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    quizzes: BTreeMap<QuizId, QuizEntity>,
    users: BTreeMap<UserId, UserEntity>,
    last_quiz_id: QuizId,
    last_user_id: UserId,
}

impl MemoryQuizStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryState {
    fn remaining<'a>(&'a self, excluded: &'a [QuizId]) -> impl Iterator<Item = &'a QuizEntity> {
        self.quizzes
            .values()
            .filter(move |quiz| !excluded.contains(&quiz.id))
    }

    fn filtered<'a>(&'a self, filter: &'a QuizFilter) -> impl Iterator<Item = &'a QuizEntity> {
        self.quizzes.values().filter(move |quiz| filter.matches(quiz))
    }
}

impl QuizStore for MemoryQuizStore {
    fn count_quizzes_excluding(
        &self,
        excluded: Vec<QuizId>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state.remaining(&excluded).count() as u64)
        })
    }

    fn quiz_at_offset(
        &self,
        excluded: Vec<QuizId>,
        offset: u64,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            let Ok(offset) = usize::try_from(offset) else {
                return Ok(None);
            };
            Ok(state.remaining(&excluded).nth(offset).cloned())
        })
    }

    fn find_quiz(&self, id: QuizId) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.quizzes.get(&id).cloned()) })
    }

    fn count_quizzes(&self, filter: QuizFilter) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state.filtered(&filter).count() as u64)
        })
    }

    fn list_quizzes(
        &self,
        filter: QuizFilter,
        offset: u64,
        limit: u64,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            let offset = usize::try_from(offset).unwrap_or(usize::MAX);
            let limit = usize::try_from(limit).unwrap_or(usize::MAX);
            Ok(state
                .filtered(&filter)
                .skip(offset)
                .take(limit)
                .cloned()
                .collect())
        })
    }

    fn insert_quiz(&self, quiz: NewQuizEntity) -> BoxFuture<'static, StorageResult<QuizEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            state.last_quiz_id += 1;
            let now = SystemTime::now();
            let entity = QuizEntity {
                id: state.last_quiz_id,
                question: quiz.question,
                answer: quiz.answer,
                author_id: quiz.author_id,
                fans: Vec::new(),
                created_at: now,
                updated_at: now,
            };
            state.quizzes.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn update_quiz(
        &self,
        id: QuizId,
        question: String,
        answer: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            Ok(state.quizzes.get_mut(&id).map(|quiz| {
                quiz.question = question;
                quiz.answer = answer;
                quiz.updated_at = SystemTime::now();
                quiz.clone()
            }))
        })
    }

    fn delete_quiz(&self, id: QuizId) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.write().await.quizzes.remove(&id).is_some()) })
    }

    fn count_authored_since(
        &self,
        author_id: UserId,
        since: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state
                .quizzes
                .values()
                .filter(|quiz| quiz.author_id == Some(author_id) && quiz.created_at >= since)
                .count() as u64)
        })
    }

    fn set_favourite(
        &self,
        quiz_id: QuizId,
        user_id: UserId,
        favourite: bool,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            let Some(quiz) = state.quizzes.get_mut(&quiz_id) else {
                return Ok(false);
            };
            if favourite {
                if !quiz.is_fan(user_id) {
                    quiz.fans.push(user_id);
                }
            } else {
                quiz.fans.retain(|fan| *fan != user_id);
            }
            Ok(true)
        })
    }

    fn insert_user(&self, user: NewUserEntity) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut state = inner.write().await;
            state.last_user_id += 1;
            let entity = UserEntity {
                id: state.last_user_id,
                username: user.username,
                is_admin: user.is_admin,
                token: user.token,
                created_at: SystemTime::now(),
            };
            state.users.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn find_user(&self, id: UserId) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.users.get(&id).cloned()) })
    }

    fn find_user_by_token(
        &self,
        token: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state.users.values().find(|user| user.token == token).cloned())
        })
    }

    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(state
                .users
                .values()
                .find(|user| user.username == username)
                .cloned())
        })
    }

    fn find_users(&self, ids: Vec<UserId>) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            Ok(ids
                .iter()
                .filter_map(|id| state.users.get(id).cloned())
                .collect())
        })
    }

    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let state = inner.read().await;
            let mut users: Vec<UserEntity> = state.users.values().cloned().collect();
            users.sort_by(|a, b| a.username.cmp(&b.username));
            Ok(users)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_quiz(question: &str) -> NewQuizEntity {
        NewQuizEntity {
            question: question.into(),
            answer: "a".into(),
            author_id: None,
        }
    }

    #[tokio::test]
    async fn offset_walks_remaining_quizzes_in_id_order() {
        let store = MemoryQuizStore::new();
        for question in ["one", "two", "three", "four"] {
            store.insert_quiz(new_quiz(question)).await.unwrap();
        }
        store.delete_quiz(2).await.unwrap();

        assert_eq!(store.count_quizzes_excluding(vec![3]).await.unwrap(), 2);
        let first = store.quiz_at_offset(vec![3], 0).await.unwrap().unwrap();
        let second = store.quiz_at_offset(vec![3], 1).await.unwrap().unwrap();
        assert_eq!((first.id, second.id), (1, 4));
        assert!(store.quiz_at_offset(vec![3], 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_deletion() {
        let store = MemoryQuizStore::new();
        let first = store.insert_quiz(new_quiz("one")).await.unwrap();
        assert!(store.delete_quiz(first.id).await.unwrap());
        assert!(!store.delete_quiz(first.id).await.unwrap());
        let second = store.insert_quiz(new_quiz("two")).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn favourites_are_toggled_without_duplicates() {
        let store = MemoryQuizStore::new();
        let quiz = store.insert_quiz(new_quiz("one")).await.unwrap();

        assert!(store.set_favourite(quiz.id, 9, true).await.unwrap());
        assert!(store.set_favourite(quiz.id, 9, true).await.unwrap());
        let stored = store.find_quiz(quiz.id).await.unwrap().unwrap();
        assert_eq!(stored.fans, vec![9]);

        assert!(store.set_favourite(quiz.id, 9, false).await.unwrap());
        let stored = store.find_quiz(quiz.id).await.unwrap().unwrap();
        assert!(stored.fans.is_empty());

        assert!(!store.set_favourite(999, 9, true).await.unwrap());
    }
}
