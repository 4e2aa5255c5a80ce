use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::{UserEntity, UserId};

/// Public projection of a user; the API token is never exposed.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub is_admin: bool,
    pub username: String,
}

impl From<&UserEntity> for UserView {
    fn from(user: &UserEntity) -> Self {
        Self {
            id: user.id,
            is_admin: user.is_admin,
            username: user.username.clone(),
        }
    }
}
