use std::{
    collections::HashMap,
    time::{Duration, SystemTime},
};

use rand::{SeedableRng, rngs::StdRng};
use tracing::info;

use crate::{
    dao::{
        models::{NewQuizEntity, QuizEntity, QuizId, UserEntity, UserId},
        quiz_store::{QuizFilter, QuizStore, SearchPattern},
    },
    dto::{
        pagination::{ListQuery, PageLink, PageWindow},
        quiz::{
            CheckQuery, CheckResponse, QuizAnswerResponse, QuizPage, QuizRequest, QuizView,
            RandomQuizResponse,
        },
        user::UserView,
    },
    error::ServiceError,
    services::{answer, selection},
    state::SharedState,
};

const DAILY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Attach authors and the viewer favourite flag to store entities, keeping their order.
pub(crate) async fn present(
    store: &dyn QuizStore,
    quizzes: Vec<QuizEntity>,
    viewer: UserId,
    include_answers: bool,
) -> Result<Vec<QuizView>, ServiceError> {
    let mut author_ids: Vec<UserId> = quizzes.iter().filter_map(|quiz| quiz.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<UserId, UserView> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        store
            .find_users(author_ids)
            .await?
            .iter()
            .map(|user| (user.id, UserView::from(user)))
            .collect()
    };

    Ok(quizzes
        .into_iter()
        .map(|quiz| {
            let author = quiz.author_id.and_then(|id| authors.get(&id).cloned());
            QuizView::new(quiz, author, viewer, include_answers)
        })
        .collect())
}

pub(crate) async fn present_one(
    store: &dyn QuizStore,
    quiz: QuizEntity,
    viewer: UserId,
    include_answer: bool,
) -> Result<QuizView, ServiceError> {
    present(store, vec![quiz], viewer, include_answer)
        .await?
        .pop()
        .ok_or_else(|| ServiceError::NotFound("quiz vanished while loading".into()))
}

async fn load_quiz(store: &dyn QuizStore, id: QuizId) -> Result<QuizEntity, ServiceError> {
    store
        .find_quiz(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("there is no quiz with id={id}")))
}

fn ensure_owner_or_admin(quiz: &QuizEntity, caller: &UserEntity) -> Result<(), ServiceError> {
    if caller.is_admin || quiz.author_id == Some(caller.id) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "only the author or an admin may modify quiz {}",
            quiz.id
        )))
    }
}

/// List quizzes page by page, optionally restricted to one author.
pub async fn list_quizzes(
    state: &SharedState,
    viewer: &UserEntity,
    query: ListQuery,
    author_id: Option<UserId>,
    link: PageLink,
) -> Result<QuizPage, ServiceError> {
    let store = state.require_quiz_store().await?;

    if let Some(author_id) = author_id {
        if store.find_user(author_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("no user with id={author_id}")));
        }
    }

    let filter = QuizFilter {
        search: query.search.as_deref().and_then(SearchPattern::parse),
        author_id,
        fan_id: query.favourites_only().then_some(viewer.id),
    };
    let window = PageWindow::resolve(query.pageno, query.pagelength, state.config().page_length());

    let total = store.count_quizzes(filter.clone()).await?;
    let quizzes = store
        .list_quizzes(filter, window.offset(), window.pagelength)
        .await?;

    Ok(QuizPage {
        quizzes: present(store.as_ref(), quizzes, viewer.id, false).await?,
        pageno: window.pageno,
        next_url: link.next_url(window, total),
    })
}

pub async fn show_quiz(
    state: &SharedState,
    viewer: &UserEntity,
    id: QuizId,
) -> Result<QuizView, ServiceError> {
    let store = state.require_quiz_store().await?;
    let quiz = load_quiz(store.as_ref(), id).await?;
    present_one(store.as_ref(), quiz, viewer.id, false).await
}

/// Create a quiz authored by `author`, enforcing the daily creation limit.
pub async fn create_quiz(
    state: &SharedState,
    author: &UserEntity,
    request: QuizRequest,
) -> Result<QuizView, ServiceError> {
    let store = state.require_quiz_store().await?;

    let limit = state.config().max_quizzes_per_day();
    let since = SystemTime::now()
        .checked_sub(DAILY_WINDOW)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let recent = store.count_authored_since(author.id, since).await?;
    if recent >= limit {
        return Err(ServiceError::LimitExceeded(format!(
            "at most {limit} quizzes may be created per day"
        )));
    }

    let quiz = store
        .insert_quiz(NewQuizEntity {
            question: request.question.trim().to_owned(),
            answer: request.answer.trim().to_owned(),
            author_id: Some(author.id),
        })
        .await?;
    info!(quiz_id = quiz.id, author_id = author.id, "quiz created");

    present_one(store.as_ref(), quiz, author.id, true).await
}

pub async fn update_quiz(
    state: &SharedState,
    caller: &UserEntity,
    id: QuizId,
    request: QuizRequest,
) -> Result<QuizView, ServiceError> {
    let store = state.require_quiz_store().await?;
    let quiz = load_quiz(store.as_ref(), id).await?;
    ensure_owner_or_admin(&quiz, caller)?;

    let updated = store
        .update_quiz(
            id,
            request.question.trim().to_owned(),
            request.answer.trim().to_owned(),
        )
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("there is no quiz with id={id}")))?;
    info!(quiz_id = id, user_id = caller.id, "quiz updated");

    present_one(store.as_ref(), updated, caller.id, true).await
}

pub async fn delete_quiz(
    state: &SharedState,
    caller: &UserEntity,
    id: QuizId,
) -> Result<(), ServiceError> {
    let store = state.require_quiz_store().await?;
    let quiz = load_quiz(store.as_ref(), id).await?;
    ensure_owner_or_admin(&quiz, caller)?;

    if !store.delete_quiz(id).await? {
        return Err(ServiceError::NotFound(format!("there is no quiz with id={id}")));
    }
    info!(quiz_id = id, user_id = caller.id, "quiz deleted");
    Ok(())
}

/// Compare a candidate answer with a quiz, without touching any play session.
pub async fn check_answer(
    state: &SharedState,
    id: QuizId,
    query: CheckQuery,
) -> Result<CheckResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let quiz = load_quiz(store.as_ref(), id).await?;
    Ok(CheckResponse {
        quiz_id: quiz.id,
        result: answer::matches(&quiz.answer, &query.answer),
        answer: query.answer,
    })
}

pub async fn reveal_answer(
    state: &SharedState,
    id: QuizId,
) -> Result<QuizAnswerResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let quiz = load_quiz(store.as_ref(), id).await?;
    Ok(QuizAnswerResponse {
        quiz_id: quiz.id,
        answer: quiz.answer,
    })
}

/// One random quiz out of the whole collection.
pub async fn random_quiz(
    state: &SharedState,
    viewer: &UserEntity,
) -> Result<RandomQuizResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let mut rng = StdRng::from_os_rng();
    match selection::pick_random_quiz(store.as_ref(), &[], &mut rng).await? {
        Some(quiz) => Ok(RandomQuizResponse::Quiz(
            present_one(store.as_ref(), quiz, viewer.id, false).await?,
        )),
        None => Ok(RandomQuizResponse::NoMore { nomore: true }),
    }
}

/// A batch of distinct random quizzes, with or without their answers.
pub async fn sample_quizzes(
    state: &SharedState,
    viewer: &UserEntity,
    include_answers: bool,
) -> Result<Vec<QuizView>, ServiceError> {
    let store = state.require_quiz_store().await?;
    let mut rng = StdRng::from_os_rng();
    let batch =
        selection::sample_batch(store.as_ref(), state.config().sample_size(), &mut rng).await?;
    present(store.as_ref(), batch, viewer.id, include_answers).await
}
