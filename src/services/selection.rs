//! Uniform random pick of quizzes outside an exclusion set.
//!
//! The store is asked for one count and one offset fetch per pick so the full collection is never
//! loaded or shuffled in memory.

use rand::Rng;
use tracing::debug;

use crate::dao::{
    models::{QuizEntity, QuizId},
    quiz_store::QuizStore,
    storage::StorageResult,
};

/// Pick one quiz uniformly among those whose id is not in `excluded`.
///
/// `None` means every quiz is excluded, or the drawn quiz vanished between the count and the
/// fetch.
pub async fn pick_random_quiz<R>(
    store: &dyn QuizStore,
    excluded: &[QuizId],
    rng: &mut R,
) -> StorageResult<Option<QuizEntity>>
where
    R: Rng + Send,
{
    let remaining = store.count_quizzes_excluding(excluded.to_vec()).await?;
    if remaining == 0 {
        return Ok(None);
    }

    let offset = rng.random_range(0..remaining);
    let quiz = store.quiz_at_offset(excluded.to_vec(), offset).await?;
    if quiz.is_none() {
        debug!(remaining, offset, "random pick hit an empty offset");
    }
    Ok(quiz)
}

/// Draw up to `size` distinct quizzes, stopping early once the store runs out.
pub async fn sample_batch<R>(
    store: &dyn QuizStore,
    size: usize,
    rng: &mut R,
) -> StorageResult<Vec<QuizEntity>>
where
    R: Rng + Send,
{
    let mut drawn: Vec<QuizId> = Vec::with_capacity(size);
    let mut batch = Vec::with_capacity(size);

    while batch.len() < size {
        let Some(quiz) = pick_random_quiz(store, &drawn, rng).await? else {
            break;
        };
        drawn.push(quiz.id);
        batch.push(quiz);
    }

    Ok(batch)
}
