use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{DateTime, Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        CounterDocument, MongoQuizDocument, MongoUserDocument, bson_id, bson_ids, doc_id,
    },
};
use crate::dao::{
    models::{NewQuizEntity, NewUserEntity, QuizEntity, QuizId, UserEntity, UserId},
    quiz_store::{QuizFilter, QuizStore},
    storage::StorageResult,
};

const QUIZ_COLLECTION_NAME: &str = "quizzes";
const USER_COLLECTION_NAME: &str = "users";
const COUNTER_COLLECTION_NAME: &str = "counters";

#[derive(Clone)]
pub struct MongoQuizStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

/// Translate a listing filter into a MongoDB query document.
fn filter_document(filter: &QuizFilter) -> Document {
    let mut document = Document::new();
    if let Some(pattern) = &filter.search {
        document.insert(
            "question",
            doc! {"$regex": pattern.to_regex(), "$options": "i"},
        );
    }
    if let Some(author_id) = filter.author_id {
        document.insert("author_id", bson_id(author_id));
    }
    if let Some(fan_id) = filter.fan_id {
        document.insert("fans", bson_id(fan_id));
    }
    document
}

fn excluding_document(excluded: &[QuizId]) -> Document {
    doc! {"_id": {"$nin": bson_ids(excluded)}}
}

impl MongoQuizStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let quizzes = database.collection::<Document>(QUIZ_COLLECTION_NAME);
        for (index, keys) in [
            ("author_id", doc! {"author_id": 1, "created_at": 1}),
            ("fans", doc! {"fans": 1}),
        ] {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("quiz_{index}_idx")))
                        .build(),
                )
                .build();
            quizzes
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: QUIZ_COLLECTION_NAME,
                    index,
                    source,
                })?;
        }

        let users = database.collection::<Document>(USER_COLLECTION_NAME);
        for index in ["username", "token"] {
            let mut keys = Document::new();
            keys.insert(index, 1_i32);
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("user_{index}_idx")))
                        .unique(Some(true))
                        .build(),
                )
                .build();
            users
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: USER_COLLECTION_NAME,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn quizzes(&self) -> Collection<MongoQuizDocument> {
        self.database()
            .await
            .collection::<MongoQuizDocument>(QUIZ_COLLECTION_NAME)
    }

    async fn users(&self) -> Collection<MongoUserDocument> {
        self.database()
            .await
            .collection::<MongoUserDocument>(USER_COLLECTION_NAME)
    }

    /// Atomically bump and return the counter backing `sequence`.
    async fn next_id(&self, sequence: &'static str) -> MongoResult<u64> {
        let counters = self
            .database()
            .await
            .collection::<CounterDocument>(COUNTER_COLLECTION_NAME);

        let counter = counters
            .find_one_and_update(doc! {"_id": sequence}, doc! {"$inc": {"seq": 1_i64}})
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::NextId { sequence, source })?;

        Ok(counter.map_or(1, |counter| counter.seq as u64))
    }

    async fn count(&self, filter: Document) -> MongoResult<u64> {
        self.quizzes()
            .await
            .count_documents(filter)
            .await
            .map_err(|source| MongoDaoError::CountQuizzes { source })
    }

    async fn list(&self, filter: Document, offset: u64, limit: u64) -> MongoResult<Vec<QuizEntity>> {
        let documents: Vec<MongoQuizDocument> = self
            .quizzes()
            .await
            .find(filter)
            .sort(doc! {"_id": 1})
            .skip(offset)
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await
            .map_err(|source| MongoDaoError::ListQuizzes { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListQuizzes { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_quiz(&self, id: QuizId) -> MongoResult<Option<QuizEntity>> {
        let document = self
            .quizzes()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadQuiz { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn insert_quiz(&self, quiz: NewQuizEntity) -> MongoResult<QuizEntity> {
        let id = self.next_id(QUIZ_COLLECTION_NAME).await?;
        let now = SystemTime::now();
        let entity = QuizEntity {
            id,
            question: quiz.question,
            answer: quiz.answer,
            author_id: quiz.author_id,
            fans: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let document: MongoQuizDocument = entity.clone().into();
        self.quizzes()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveQuiz { id, source })?;

        Ok(entity)
    }

    async fn update_quiz(
        &self,
        id: QuizId,
        question: String,
        answer: String,
    ) -> MongoResult<Option<QuizEntity>> {
        let document = self
            .quizzes()
            .await
            .find_one_and_update(
                doc_id(id),
                doc! {"$set": {
                    "question": question,
                    "answer": answer,
                    "updated_at": DateTime::now(),
                }},
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::SaveQuiz { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn delete_quiz(&self, id: QuizId) -> MongoResult<bool> {
        let result = self
            .quizzes()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteQuiz { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn set_favourite(
        &self,
        quiz_id: QuizId,
        user_id: UserId,
        favourite: bool,
    ) -> MongoResult<bool> {
        let update = if favourite {
            doc! {"$addToSet": {"fans": bson_id(user_id)}}
        } else {
            doc! {"$pull": {"fans": bson_id(user_id)}}
        };

        let result = self
            .quizzes()
            .await
            .update_one(doc_id(quiz_id), update)
            .await
            .map_err(|source| MongoDaoError::SaveQuiz {
                id: quiz_id,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn insert_user(&self, user: NewUserEntity) -> MongoResult<UserEntity> {
        let id = self.next_id(USER_COLLECTION_NAME).await?;

        let entity = UserEntity {
            id,
            username: user.username,
            is_admin: user.is_admin,
            token: user.token,
            created_at: SystemTime::now(),
        };

        let document: MongoUserDocument = entity.clone().into();
        self.users()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveUser {
                username: entity.username.clone(),
                source,
            })?;

        Ok(entity)
    }

    async fn find_user_by(&self, filter: Document) -> MongoResult<Option<UserEntity>> {
        let document = self
            .users()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::LookupUser { source })?;
        Ok(document.map(Into::into))
    }

    async fn find_users(&self, filter: Document) -> MongoResult<Vec<UserEntity>> {
        let documents: Vec<MongoUserDocument> = self
            .users()
            .await
            .find(filter)
            .sort(doc! {"username": 1})
            .await
            .map_err(|source| MongoDaoError::ListUsers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListUsers { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

impl QuizStore for MongoQuizStore {
    fn count_quizzes_excluding(
        &self,
        excluded: Vec<QuizId>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .count(excluding_document(&excluded))
                .await
                .map_err(Into::into)
        })
    }

    fn quiz_at_offset(
        &self,
        excluded: Vec<QuizId>,
        offset: u64,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut page = store
                .list(excluding_document(&excluded), offset, 1)
                .await?;
            Ok(page.pop())
        })
    }

    fn find_quiz(&self, id: QuizId) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_quiz(id).await.map_err(Into::into) })
    }

    fn count_quizzes(&self, filter: QuizFilter) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .count(filter_document(&filter))
                .await
                .map_err(Into::into)
        })
    }

    fn list_quizzes(
        &self,
        filter: QuizFilter,
        offset: u64,
        limit: u64,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list(filter_document(&filter), offset, limit)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_quiz(&self, quiz: NewQuizEntity) -> BoxFuture<'static, StorageResult<QuizEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_quiz(quiz).await.map_err(Into::into) })
    }

    fn update_quiz(
        &self,
        id: QuizId,
        question: String,
        answer: String,
    ) -> BoxFuture<'static, StorageResult<Option<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_quiz(id, question, answer)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_quiz(&self, id: QuizId) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_quiz(id).await.map_err(Into::into) })
    }

    fn count_authored_since(
        &self,
        author_id: UserId,
        since: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .count(doc! {
                    "author_id": bson_id(author_id),
                    "created_at": {"$gte": DateTime::from_system_time(since)},
                })
                .await
                .map_err(Into::into)
        })
    }

    fn set_favourite(
        &self,
        quiz_id: QuizId,
        user_id: UserId,
        favourite: bool,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .set_favourite(quiz_id, user_id, favourite)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_user(&self, user: NewUserEntity) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_user(user).await.map_err(Into::into) })
    }

    fn find_user(&self, id: UserId) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .users()
                .await
                .find_one(doc_id(id))
                .await
                .map_err(|source| MongoDaoError::LoadUser { id, source })?;
            Ok(document.map(Into::into))
        })
    }

    fn find_user_by_token(
        &self,
        token: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_user_by(doc! {"token": token})
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_user_by(doc! {"username": username})
                .await
                .map_err(Into::into)
        })
    }

    fn find_users(&self, ids: Vec<UserId>) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_users(doc! {"_id": {"$in": bson_ids(&ids)}})
                .await
                .map_err(Into::into)
        })
    }

    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_users(doc! {}).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
