use tracing::debug;

use crate::{
    dao::models::{UserEntity, UserId},
    dto::user::UserView,
    error::ServiceError,
    state::SharedState,
};

/// Resolve the owner of an API token.
pub async fn authenticate(state: &SharedState, token: &str) -> Result<UserEntity, ServiceError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ServiceError::Unauthorized("empty token".into()));
    }

    let store = state.require_quiz_store().await?;
    match store.find_user_by_token(token.to_owned()).await? {
        Some(user) => Ok(user),
        None => {
            debug!("rejected unknown token");
            Err(ServiceError::Unauthorized("unknown token".into()))
        }
    }
}

/// List every user ordered by username.
pub async fn list_users(state: &SharedState) -> Result<Vec<UserView>, ServiceError> {
    let store = state.require_quiz_store().await?;
    let users = store.list_users().await?;
    Ok(users.iter().map(UserView::from).collect())
}

/// Load a user, failing with [`ServiceError::NotFound`] when absent.
pub async fn find_user(state: &SharedState, id: UserId) -> Result<UserEntity, ServiceError> {
    let store = state.require_quiz_store().await?;
    store
        .find_user(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("no user with id={id}")))
}

pub async fn show_user(state: &SharedState, id: UserId) -> Result<UserView, ServiceError> {
    Ok(UserView::from(&find_user(state, id).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::NewUserEntity,
            quiz_store::{QuizStore, memory::MemoryQuizStore},
        },
        state::AppState,
    };

    async fn state_with_users() -> SharedState {
        let store = MemoryQuizStore::new();
        for (username, token) in [("zoe", "t-zoe"), ("ana", "t-ana")] {
            store
                .insert_user(NewUserEntity {
                    username: username.into(),
                    is_admin: false,
                    token: token.into(),
                })
                .await
                .unwrap();
        }
        let state = AppState::new(AppConfig::default());
        state.set_quiz_store(Arc::new(store)).await;
        state
    }

    #[tokio::test]
    async fn authenticate_resolves_known_tokens_only() {
        let state = state_with_users().await;

        let user = authenticate(&state, " t-ana ").await.unwrap();
        assert_eq!(user.username, "ana");

        assert!(matches!(
            authenticate(&state, "nope").await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            authenticate(&state, "").await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_requires_storage() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            authenticate(&state, "t-ana").await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn users_are_listed_by_username() {
        let state = state_with_users().await;
        let names: Vec<String> = list_users(&state)
            .await
            .unwrap()
            .into_iter()
            .map(|user| user.username)
            .collect();
        assert_eq!(names, vec!["ana", "zoe"]);

        assert!(matches!(
            show_user(&state, 99).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
