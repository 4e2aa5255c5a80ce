use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dao::models::QuizId, dto::quiz::QuizView};

/// Quiz dealt by a play session, or the end-of-run marker when nothing is left.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum DealResponse {
    /// Quiz to answer and the score reached so far.
    Quiz {
        /// Dealt quiz, without its answer.
        quiz: QuizView,
        /// Quizzes solved before this one.
        score: usize,
    },
    /// Nothing left to deal.
    NoMore {
        /// Always `true`.
        nomore: bool,
        /// Final score of the run.
        score: usize,
    },
}

impl DealResponse {
    /// End-of-run marker carrying the final score.
    pub fn no_more(score: usize) -> Self {
        DealResponse::NoMore {
            nomore: true,
            score,
        }
    }

    /// Score carried by either variant.
    pub fn score(&self) -> usize {
        match self {
            DealResponse::Quiz { score, .. } | DealResponse::NoMore { score, .. } => *score,
        }
    }
}

/// Answer submitted for the pending quiz.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlayCheckRequest {
    /// Candidate answer; missing means empty.
    #[serde(default)]
    pub answer: String,
}

/// Verdict for the pending quiz of a play session.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayCheckResponse {
    /// Whether the answer matched.
    pub result: bool,
    /// Score after applying the verdict.
    pub score: usize,
    /// Quiz that was answered.
    pub quiz_id: QuizId,
    /// Answer as submitted.
    pub answer: String,
}
