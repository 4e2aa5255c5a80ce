use tracing::debug;

use crate::{
    dao::models::{QuizId, UserEntity},
    dto::favourite::FavouriteResponse,
    error::ServiceError,
    state::SharedState,
};

/// Mark or unmark a quiz as favourite of `user`. Repeating the same call is harmless.
pub async fn set_favourite(
    state: &SharedState,
    user: &UserEntity,
    quiz_id: QuizId,
    favourite: bool,
) -> Result<FavouriteResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    if !store.set_favourite(quiz_id, user.id, favourite).await? {
        return Err(ServiceError::NotFound(format!(
            "there is no quiz with id={quiz_id}"
        )));
    }
    debug!(quiz_id, user_id = user.id, favourite, "favourite updated");

    Ok(FavouriteResponse {
        id: quiz_id,
        favourite,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{NewQuizEntity, NewUserEntity},
            quiz_store::{QuizStore, memory::MemoryQuizStore},
        },
        state::AppState,
    };

    #[tokio::test]
    async fn toggles_favourite_and_rejects_unknown_quiz() {
        let store = MemoryQuizStore::new();
        let user = store
            .insert_user(NewUserEntity {
                username: "ana".into(),
                is_admin: false,
                token: "t".into(),
            })
            .await
            .unwrap();
        let quiz = store
            .insert_quiz(NewQuizEntity {
                question: "q".into(),
                answer: "a".into(),
                author_id: None,
            })
            .await
            .unwrap();
        let state = AppState::new(AppConfig::default());
        state.set_quiz_store(Arc::new(store.clone())).await;

        let added = set_favourite(&state, &user, quiz.id, true).await.unwrap();
        assert_eq!(
            added,
            FavouriteResponse {
                id: quiz.id,
                favourite: true
            }
        );
        assert!(store.find_quiz(quiz.id).await.unwrap().unwrap().is_fan(user.id));

        let removed = set_favourite(&state, &user, quiz.id, false).await.unwrap();
        assert!(!removed.favourite);
        assert!(!store.find_quiz(quiz.id).await.unwrap().unwrap().is_fan(user.id));

        assert!(matches!(
            set_favourite(&state, &user, 42, true).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
