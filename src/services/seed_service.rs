use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        models::{NewQuizEntity, NewUserEntity, UserId},
        quiz_store::{QuizFilter, QuizStore},
        storage::StorageResult,
    },
};

/// Create the configured users that do not exist yet, then fill an empty quiz collection.
///
/// Safe to run on every (re)connection: existing users are left alone and quizzes are only
/// inserted when none exist.
pub async fn seed(store: &dyn QuizStore, config: &AppConfig) -> StorageResult<()> {
    let mut user_ids: HashMap<String, UserId> = HashMap::new();

    for seed in config.seed_users() {
        let user = match store.find_user_by_username(seed.username.clone()).await? {
            Some(user) => user,
            None => {
                let token = seed
                    .token
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
                let user = store
                    .insert_user(NewUserEntity {
                        username: seed.username.clone(),
                        is_admin: seed.is_admin,
                        token,
                    })
                    .await?;
                info!(user_id = user.id, username = %user.username, "seeded user");
                user
            }
        };
        user_ids.insert(user.username, user.id);
    }

    if store.count_quizzes(QuizFilter::default()).await? > 0 {
        return Ok(());
    }

    for seed in config.seed_quizzes() {
        let author_id = match seed.author.as_deref() {
            Some(username) => {
                let id = user_ids.get(username).copied();
                if id.is_none() {
                    warn!(username, "seed quiz author is not a seeded user; inserting without author");
                }
                id
            }
            None => None,
        };
        store
            .insert_quiz(NewQuizEntity {
                question: seed.question.clone(),
                answer: seed.answer.clone(),
                author_id,
            })
            .await?;
    }
    info!(count = config.seed_quizzes().len(), "seeded quizzes");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::quiz_store::memory::MemoryQuizStore;

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate() {
        let store = MemoryQuizStore::new();
        let config = AppConfig::default();

        seed(&store, &config).await.unwrap();
        seed(&store, &config).await.unwrap();

        let users = store.list_users().await.unwrap();
        assert_eq!(users.len(), config.seed_users().len());
        assert!(users.iter().all(|user| !user.token.is_empty()));
        assert_eq!(
            store.count_quizzes(QuizFilter::default()).await.unwrap(),
            config.seed_quizzes().len() as u64
        );
    }

    #[tokio::test]
    async fn seeded_quizzes_are_linked_to_their_authors() {
        let store = MemoryQuizStore::new();
        seed(&store, &AppConfig::default()).await.unwrap();

        let admin = store
            .find_user_by_username("admin".into())
            .await
            .unwrap()
            .unwrap();
        assert!(admin.is_admin);
        let filter = QuizFilter {
            author_id: Some(admin.id),
            ..QuizFilter::default()
        };
        assert_eq!(store.count_quizzes(filter).await.unwrap(), 2);
    }
}
