use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::QuizId;

/// Favourite flag of a quiz for the token owner after a toggle.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct FavouriteResponse {
    pub id: QuizId,
    pub favourite: bool,
}
