use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};

use crate::dao::models::{QuizEntity, UserEntity};

/// BSON has no unsigned 64-bit integer; ids come from the counters collection and stay positive.
pub fn bson_id(id: u64) -> i64 {
    id as i64
}

pub fn bson_ids(ids: &[u64]) -> Vec<i64> {
    ids.iter().copied().map(bson_id).collect()
}

pub fn doc_id(id: u64) -> Document {
    doc! {"_id": bson_id(id)}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuizDocument {
    #[serde(rename = "_id")]
    id: i64,
    question: String,
    answer: String,
    author_id: Option<i64>,
    #[serde(default)]
    fans: Vec<i64>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<QuizEntity> for MongoQuizDocument {
    fn from(value: QuizEntity) -> Self {
        Self {
            id: bson_id(value.id),
            question: value.question,
            answer: value.answer,
            author_id: value.author_id.map(bson_id),
            fans: bson_ids(&value.fans),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoQuizDocument> for QuizEntity {
    fn from(value: MongoQuizDocument) -> Self {
        Self {
            id: value.id as u64,
            question: value.question,
            answer: value.answer,
            author_id: value.author_id.map(|id| id as u64),
            fans: value.fans.into_iter().map(|id| id as u64).collect(),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    id: i64,
    username: String,
    #[serde(default)]
    is_admin: bool,
    token: String,
    created_at: DateTime,
}

impl From<UserEntity> for MongoUserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            id: bson_id(value.id),
            username: value.username,
            is_admin: value.is_admin,
            token: value.token,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoUserDocument> for UserEntity {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            id: value.id as u64,
            username: value.username,
            is_admin: value.is_admin,
            token: value.token,
            created_at: value.created_at.to_system_time(),
        }
    }
}

/// Monotonic id sequence, one document per collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterDocument {
    #[serde(rename = "_id")]
    pub name: String,
    pub seq: i64,
}
