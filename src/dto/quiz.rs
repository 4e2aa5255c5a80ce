//! DTO definitions for quiz browsing, authoring and single-quiz checks.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::{QuizEntity, QuizId, UserId},
    dto::{format_system_time, user::UserView, validation::validate_not_blank},
};

/// Quiz as shown to a given viewer.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub id: QuizId,
    pub question: String,
    /// Only present on endpoints that reveal answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub author: Option<UserView>,
    /// Whether the viewer marked this quiz as a favourite.
    pub favourite: bool,
    pub created_at: String,
}

impl QuizView {
    pub fn new(
        quiz: QuizEntity,
        author: Option<UserView>,
        viewer: UserId,
        include_answer: bool,
    ) -> Self {
        Self {
            favourite: quiz.is_fan(viewer),
            id: quiz.id,
            question: quiz.question,
            answer: include_answer.then_some(quiz.answer),
            author,
            created_at: format_system_time(quiz.created_at),
        }
    }
}

/// Body accepted when creating or editing a quiz.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct QuizRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub question: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub answer: String,
}

/// One page of a quiz listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizPage {
    pub quizzes: Vec<QuizView>,
    pub pageno: u64,
    /// Link to the next page, empty on the last page.
    pub next_url: String,
}

/// Query of `GET /api/quizzes/{quizId}/check`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckQuery {
    /// Candidate answer; missing is treated as empty.
    #[serde(default)]
    pub answer: String,
}

/// Verdict for a single quiz check.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub quiz_id: QuizId,
    pub answer: String,
    pub result: bool,
}

/// Revealed answer of a quiz.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswerResponse {
    pub quiz_id: QuizId,
    pub answer: String,
}

/// Either a random quiz or the marker telling that the store is empty.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum RandomQuizResponse {
    Quiz(QuizView),
    NoMore { nomore: bool },
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use serde_json::json;

    use super::*;

    fn quiz(fans: Vec<UserId>) -> QuizEntity {
        QuizEntity {
            id: 3,
            question: "Capital of France".into(),
            answer: "Paris".into(),
            author_id: None,
            fans,
            created_at: SystemTime::UNIX_EPOCH,
            updated_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn view_hides_answer_unless_requested() {
        let hidden = serde_json::to_value(QuizView::new(quiz(vec![]), None, 1, false)).unwrap();
        assert_eq!(
            hidden,
            json!({
                "id": 3,
                "question": "Capital of France",
                "author": null,
                "favourite": false,
                "createdAt": "1970-01-01T00:00:00Z",
            })
        );

        let shown = QuizView::new(quiz(vec![]), None, 1, true);
        assert_eq!(shown.answer.as_deref(), Some("Paris"));
    }

    #[test]
    fn favourite_flag_is_per_viewer() {
        assert!(QuizView::new(quiz(vec![1, 2]), None, 2, false).favourite);
        assert!(!QuizView::new(quiz(vec![1, 2]), None, 5, false).favourite);
    }

    #[test]
    fn blank_fields_are_rejected() {
        let request = QuizRequest {
            question: "  ".into(),
            answer: "Paris".into(),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("question"));
        assert!(!errors.field_errors().contains_key("answer"));
    }

    #[test]
    fn exhausted_random_serializes_as_marker() {
        let value = serde_json::to_value(RandomQuizResponse::NoMore { nomore: true }).unwrap();
        assert_eq!(value, json!({"nomore": true}));
    }
}
