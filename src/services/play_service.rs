//! Random play orchestration: deal quizzes to a player and score their answers.
//!
//! Each call copies the player session out of the registry, performs the store reads, and only
//! then writes the resulting session back (or discards it). A storage failure therefore leaves
//! the previous session untouched. The write only lands if no other request for the same player
//! committed in between; otherwise the call fails with [`ServiceError::SessionConflict`].

use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::{
    dao::models::UserId,
    dto::play::{DealResponse, PlayCheckResponse},
    error::ServiceError,
    services::{answer, quiz_service, selection},
    state::{AnswerOutcome, DealStep, Generation, PlaySession, SharedState},
};

/// Throw away any run in progress and deal the first quiz of a new one.
pub async fn start_new(state: &SharedState, player: UserId) -> Result<DealResponse, ServiceError> {
    debug!(player, "starting a new play session");
    let seen = state
        .play_sessions()
        .snapshot(player)
        .map(|snapshot| snapshot.generation);
    deal(state, player, PlaySession::new(), seen).await
}

/// Deal the pending quiz again, or a new one when the previous was answered.
///
/// A player without a session gets a fresh one.
pub async fn next_quiz(state: &SharedState, player: UserId) -> Result<DealResponse, ServiceError> {
    let (session, seen) = match state.play_sessions().snapshot(player) {
        Some(snapshot) => (snapshot.session, Some(snapshot.generation)),
        None => (PlaySession::new(), None),
    };
    deal(state, player, session, seen).await
}

async fn deal(
    state: &SharedState,
    player: UserId,
    session: PlaySession,
    seen: Option<Generation>,
) -> Result<DealResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let sessions = state.play_sessions();
    let score = session.score();

    let quiz = match session.next_step() {
        DealStep::Pending(quiz_id) => match store.find_quiz(quiz_id).await? {
            Some(quiz) => quiz,
            None => {
                sessions.discard_if_current(player, seen)?;
                return Err(ServiceError::NotFound(format!(
                    "there is no quiz with id={quiz_id}"
                )));
            }
        },
        DealStep::Draw { excluded } => {
            let mut rng = StdRng::from_os_rng();
            match selection::pick_random_quiz(store.as_ref(), &excluded, &mut rng).await? {
                Some(quiz) => quiz,
                None => {
                    sessions.discard_if_current(player, seen)?;
                    info!(player, score, "play session finished: no quizzes left");
                    return Ok(DealResponse::no_more(score));
                }
            }
        }
    };

    let quiz_id = quiz.id;
    let view = quiz_service::present_one(store.as_ref(), quiz, player, false).await?;
    sessions.store_if_current(player, seen, session.deal(quiz_id))?;

    Ok(DealResponse::Quiz { quiz: view, score })
}

/// Score `candidate` against the pending quiz of `player`.
///
/// A wrong answer ends the run; answering without a pending quiz fails with
/// [`ServiceError::NoActiveSession`].
pub async fn submit_answer(
    state: &SharedState,
    player: UserId,
    candidate: String,
) -> Result<PlayCheckResponse, ServiceError> {
    let sessions = state.play_sessions();
    let snapshot = sessions
        .snapshot(player)
        .ok_or(ServiceError::NoActiveSession)?;
    let seen = Some(snapshot.generation);
    let quiz_id = snapshot
        .session
        .pending()
        .ok_or(ServiceError::NoActiveSession)?;

    let store = state.require_quiz_store().await?;
    let Some(quiz) = store.find_quiz(quiz_id).await? else {
        sessions.discard_if_current(player, seen)?;
        return Err(ServiceError::NotFound(format!(
            "there is no quiz with id={quiz_id}"
        )));
    };

    let correct = answer::matches(&quiz.answer, &candidate);
    let score = match snapshot.session.answer(correct)? {
        AnswerOutcome::Advanced { session, score } => {
            sessions.store_if_current(player, seen, session)?;
            score
        }
        AnswerOutcome::Failed { score } => {
            sessions.discard_if_current(player, seen)?;
            info!(player, score, "play session finished: wrong answer");
            score
        }
    };

    Ok(PlayCheckResponse {
        result: correct,
        score,
        quiz_id,
        answer: candidate,
    })
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::SystemTime,
    };

    use futures::future::BoxFuture;
    use tokio::sync::Notify;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{NewQuizEntity, NewUserEntity, QuizEntity, QuizId, UserEntity},
            quiz_store::{QuizFilter, QuizStore, memory::MemoryQuizStore},
            storage::StorageResult,
        },
        state::AppState,
    };

    const PLAYER: UserId = 7;

    async fn state_with(quizzes: &[(&str, &str)]) -> (SharedState, MemoryQuizStore) {
        let store = MemoryQuizStore::new();
        for (question, answer) in quizzes {
            store
                .insert_quiz(NewQuizEntity {
                    question: (*question).into(),
                    answer: (*answer).into(),
                    author_id: None,
                })
                .await
                .unwrap();
        }
        let state = AppState::new(AppConfig::default());
        state.set_quiz_store(Arc::new(store.clone())).await;
        (state, store)
    }

    fn dealt_id(response: &DealResponse) -> QuizId {
        match response {
            DealResponse::Quiz { quiz, .. } => quiz.id,
            other => panic!("expected a quiz, got {other:?}"),
        }
    }

    fn correct_answer(quiz_id: QuizId) -> String {
        let answer = if quiz_id == 1 { "4" } else { " paris " };
        answer.into()
    }

    #[tokio::test]
    async fn full_run_over_two_quizzes() {
        let (state, _) = state_with(&[("2+2", "4"), ("capital of France", "Paris")]).await;

        let first = start_new(&state, PLAYER).await.unwrap();
        assert_eq!(first.score(), 0);
        let failed = submit_answer(&state, PLAYER, "wrong".into()).await.unwrap();
        assert!(!failed.result);
        assert_eq!(failed.score, 0);
        assert_eq!(failed.quiz_id, dealt_id(&first));
        assert!(state.play_sessions().get(PLAYER).is_none());

        let a = dealt_id(&start_new(&state, PLAYER).await.unwrap());
        let verdict = submit_answer(&state, PLAYER, correct_answer(a)).await.unwrap();
        assert!(verdict.result);
        assert_eq!(verdict.score, 1);

        let second = next_quiz(&state, PLAYER).await.unwrap();
        let b = dealt_id(&second);
        assert_ne!(a, b);
        assert_eq!(second.score(), 1);
        let verdict = submit_answer(&state, PLAYER, correct_answer(b)).await.unwrap();
        assert_eq!((verdict.result, verdict.score), (true, 2));

        let done = next_quiz(&state, PLAYER).await.unwrap();
        assert!(matches!(
            done,
            DealResponse::NoMore {
                nomore: true,
                score: 2
            }
        ));
        assert!(state.play_sessions().get(PLAYER).is_none());
    }

    #[tokio::test]
    async fn next_without_answer_serves_same_quiz() {
        let (state, _) = state_with(&[("a", "a"), ("b", "b"), ("c", "c"), ("d", "d")]).await;
        let first = dealt_id(&next_quiz(&state, PLAYER).await.unwrap());
        for _ in 0..10 {
            assert_eq!(dealt_id(&next_quiz(&state, PLAYER).await.unwrap()), first);
        }
    }

    #[tokio::test]
    async fn answer_after_failure_has_no_active_session() {
        let (state, _) = state_with(&[("2+2", "4")]).await;
        assert!(matches!(
            submit_answer(&state, PLAYER, "4".into()).await,
            Err(ServiceError::NoActiveSession)
        ));

        start_new(&state, PLAYER).await.unwrap();
        submit_answer(&state, PLAYER, "5".into()).await.unwrap();
        assert!(matches!(
            submit_answer(&state, PLAYER, "4".into()).await,
            Err(ServiceError::NoActiveSession)
        ));
    }

    #[tokio::test]
    async fn repeated_correct_answer_is_rejected_not_recounted() {
        let (state, _) = state_with(&[("2+2", "4"), ("3+3", "6")]).await;
        start_new(&state, PLAYER).await.unwrap();
        let pending = state.play_sessions().get(PLAYER).unwrap().pending().unwrap();
        let answer = if pending == 1 { "4" } else { "6" };

        let first = submit_answer(&state, PLAYER, answer.into()).await.unwrap();
        assert_eq!(first.score, 1);
        assert!(matches!(
            submit_answer(&state, PLAYER, answer.into()).await,
            Err(ServiceError::NoActiveSession)
        ));
        assert_eq!(state.play_sessions().get(PLAYER).unwrap().score(), 1);
    }

    #[tokio::test]
    async fn deleted_pending_quiz_discards_session() {
        let (state, store) = state_with(&[("2+2", "4")]).await;
        let quiz_id = dealt_id(&start_new(&state, PLAYER).await.unwrap());
        store.delete_quiz(quiz_id).await.unwrap();

        assert!(matches!(
            next_quiz(&state, PLAYER).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(state.play_sessions().get(PLAYER).is_none());
    }

    #[tokio::test]
    async fn deleted_pending_quiz_fails_submit_and_discards_session() {
        let (state, store) = state_with(&[("2+2", "4")]).await;
        let quiz_id = dealt_id(&start_new(&state, PLAYER).await.unwrap());
        store.delete_quiz(quiz_id).await.unwrap();

        assert!(matches!(
            submit_answer(&state, PLAYER, "4".into()).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(state.play_sessions().get(PLAYER).is_none());
        assert!(matches!(
            submit_answer(&state, PLAYER, "4".into()).await,
            Err(ServiceError::NoActiveSession)
        ));
    }

    #[tokio::test]
    async fn empty_store_ends_immediately() {
        let (state, _) = state_with(&[]).await;
        let response = start_new(&state, PLAYER).await.unwrap();
        assert!(matches!(response, DealResponse::NoMore { score: 0, .. }));
        assert!(state.play_sessions().is_empty());
    }

    #[tokio::test]
    async fn sessions_are_isolated_per_player() {
        let (state, _) = state_with(&[("2+2", "4")]).await;
        start_new(&state, 1).await.unwrap();
        start_new(&state, 2).await.unwrap();

        submit_answer(&state, 1, "nope".into()).await.unwrap();
        let verdict = submit_answer(&state, 2, "4".into()).await.unwrap();
        assert_eq!((verdict.result, verdict.score), (true, 1));
    }

    #[tokio::test]
    async fn degraded_mode_keeps_session_untouched() {
        let state = AppState::new(AppConfig::default());
        state
            .play_sessions()
            .store_if_current(PLAYER, None, PlaySession::new().deal(3))
            .unwrap();

        assert!(matches!(
            submit_answer(&state, PLAYER, "x".into()).await,
            Err(ServiceError::Degraded)
        ));
        assert_eq!(state.play_sessions().get(PLAYER).unwrap().pending(), Some(3));
    }

    /// Memory store whose next `find_quiz` waits until the test releases it.
    #[derive(Clone)]
    struct GatedStore {
        inner: MemoryQuizStore,
        armed: Arc<AtomicBool>,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl GatedStore {
        fn new(inner: MemoryQuizStore) -> Self {
            Self {
                inner,
                armed: Arc::new(AtomicBool::new(false)),
                entered: Arc::new(Notify::new()),
                release: Arc::new(Notify::new()),
            }
        }
    }

    impl QuizStore for GatedStore {
        fn count_quizzes_excluding(
            &self,
            excluded: Vec<QuizId>,
        ) -> BoxFuture<'static, StorageResult<u64>> {
            self.inner.count_quizzes_excluding(excluded)
        }

        fn quiz_at_offset(
            &self,
            excluded: Vec<QuizId>,
            offset: u64,
        ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
            self.inner.quiz_at_offset(excluded, offset)
        }

        fn find_quiz(&self, id: QuizId) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
            let lookup = self.inner.find_quiz(id);
            if !self.armed.swap(false, Ordering::SeqCst) {
                return lookup;
            }
            let entered = self.entered.clone();
            let release = self.release.clone();
            Box::pin(async move {
                entered.notify_one();
                release.notified().await;
                lookup.await
            })
        }

        fn count_quizzes(&self, filter: QuizFilter) -> BoxFuture<'static, StorageResult<u64>> {
            self.inner.count_quizzes(filter)
        }

        fn list_quizzes(
            &self,
            filter: QuizFilter,
            offset: u64,
            limit: u64,
        ) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
            self.inner.list_quizzes(filter, offset, limit)
        }

        fn insert_quiz(&self, quiz: NewQuizEntity) -> BoxFuture<'static, StorageResult<QuizEntity>> {
            self.inner.insert_quiz(quiz)
        }

        fn update_quiz(
            &self,
            id: QuizId,
            question: String,
            answer: String,
        ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
            self.inner.update_quiz(id, question, answer)
        }

        fn delete_quiz(&self, id: QuizId) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.delete_quiz(id)
        }

        fn count_authored_since(
            &self,
            author_id: UserId,
            since: SystemTime,
        ) -> BoxFuture<'static, StorageResult<u64>> {
            self.inner.count_authored_since(author_id, since)
        }

        fn set_favourite(
            &self,
            quiz_id: QuizId,
            user_id: UserId,
            favourite: bool,
        ) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.set_favourite(quiz_id, user_id, favourite)
        }

        fn insert_user(&self, user: NewUserEntity) -> BoxFuture<'static, StorageResult<UserEntity>> {
            self.inner.insert_user(user)
        }

        fn find_user(&self, id: UserId) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
            self.inner.find_user(id)
        }

        fn find_user_by_token(
            &self,
            token: String,
        ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
            self.inner.find_user_by_token(token)
        }

        fn find_user_by_username(
            &self,
            username: String,
        ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
            self.inner.find_user_by_username(username)
        }

        fn find_users(&self, ids: Vec<UserId>) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
            self.inner.find_users(ids)
        }

        fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
            self.inner.list_users()
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    fn sum_answer(quiz_id: QuizId) -> String {
        let answer = if quiz_id == 1 { "4" } else { "6" };
        answer.into()
    }

    /// Deal one quiz, then start a `next` call that stalls on its store read while an answer is
    /// submitted. Returns the outcome of the stalled call along with the verdict.
    async fn next_racing_submit(
        correct: bool,
    ) -> (SharedState, Result<DealResponse, ServiceError>, PlayCheckResponse) {
        let (_, memory) = state_with(&[("2+2", "4"), ("3+3", "6")]).await;
        let gated = GatedStore::new(memory);
        let state = AppState::new(AppConfig::default());
        state.set_quiz_store(Arc::new(gated.clone())).await;

        let quiz_id = dealt_id(&start_new(&state, PLAYER).await.unwrap());
        let candidate = if correct {
            sum_answer(quiz_id)
        } else {
            "wrong".into()
        };

        gated.armed.store(true, Ordering::SeqCst);
        let stalled = tokio::spawn({
            let state = state.clone();
            async move { next_quiz(&state, PLAYER).await }
        });
        gated.entered.notified().await;

        let verdict = submit_answer(&state, PLAYER, candidate)
            .await
            .unwrap();
        gated.release.notify_one();
        let outcome = stalled.await.unwrap();
        (state, outcome, verdict)
    }

    #[tokio::test]
    async fn stalled_next_cannot_revive_a_failed_run() {
        let (state, outcome, verdict) = next_racing_submit(false).await;
        assert!(!verdict.result);

        assert!(matches!(outcome, Err(ServiceError::SessionConflict)));
        assert!(state.play_sessions().get(PLAYER).is_none());
        assert!(matches!(
            submit_answer(&state, PLAYER, sum_answer(verdict.quiz_id)).await,
            Err(ServiceError::NoActiveSession)
        ));
    }

    #[tokio::test]
    async fn stalled_next_cannot_drop_a_scored_point() {
        let (state, outcome, verdict) = next_racing_submit(true).await;
        assert_eq!((verdict.result, verdict.score), (true, 1));

        assert!(matches!(outcome, Err(ServiceError::SessionConflict)));
        let session = state.play_sessions().get(PLAYER).unwrap();
        assert_eq!(session.score(), 1);
        assert_eq!(session.pending(), None);

        let next = next_quiz(&state, PLAYER).await.unwrap();
        assert_eq!(next.score(), 1);
        assert_ne!(dealt_id(&next), verdict.quiz_id);
    }
}
