//! Single-player "random play" session: deal quizzes the player has not solved yet until one is
//! answered wrong or none are left.
//!
//! Transitions are pure: each takes the session by value and returns the next value, so callers
//! only commit the result once every store read for the request succeeded.

use indexmap::IndexSet;
use thiserror::Error;

use crate::dao::models::QuizId;

/// Errors raised by session transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlayError {
    /// An answer was submitted while no quiz was waiting for one.
    #[error("no quiz is waiting for an answer")]
    NoActiveSession,
    /// Another request changed the session between read and commit.
    #[error("play session changed concurrently")]
    StaleSession,
}

/// What the session needs before it can show a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DealStep {
    /// A quiz was already dealt and not answered: show it again.
    Pending(QuizId),
    /// Pick a new quiz among those not listed in `excluded`.
    Draw { excluded: Vec<QuizId> },
}

/// Result of answering the pending quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Correct answer: the session continues with the next deal.
    Advanced { session: PlaySession, score: usize },
    /// Wrong answer: the session is over.
    Failed { score: usize },
}

/// Per-player play state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaySession {
    pending: Option<QuizId>,
    resolved: IndexSet<QuizId>,
}

impl PlaySession {
    /// Fresh session with nothing dealt and nothing solved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Quiz dealt and still waiting for an answer.
    pub fn pending(&self) -> Option<QuizId> {
        self.pending
    }

    /// Quizzes answered correctly, in the order they were solved.
    pub fn resolved(&self) -> &IndexSet<QuizId> {
        &self.resolved
    }

    /// Number of quizzes solved so far.
    pub fn score(&self) -> usize {
        self.resolved.len()
    }

    /// Decide how the next quiz is obtained. A pending quiz is always served again so that a
    /// refresh neither burns a random pick nor changes the question.
    pub fn next_step(&self) -> DealStep {
        match self.pending {
            Some(quiz_id) => DealStep::Pending(quiz_id),
            None => DealStep::Draw {
                excluded: self.resolved.iter().copied().collect(),
            },
        }
    }

    /// Record `quiz_id` as dealt.
    ///
    /// An id that was already solved is never dealt; the session is returned unchanged.
    pub fn deal(mut self, quiz_id: QuizId) -> Self {
        if !self.resolved.contains(&quiz_id) {
            self.pending = Some(quiz_id);
        }
        self
    }

    /// Apply the verdict for the pending quiz.
    ///
    /// Solving the same quiz twice (a retried submission) never inflates the score.
    pub fn answer(mut self, correct: bool) -> Result<AnswerOutcome, PlayError> {
        let quiz_id = self.pending.take().ok_or(PlayError::NoActiveSession)?;

        if !correct {
            return Ok(AnswerOutcome::Failed {
                score: self.score(),
            });
        }

        self.resolved.insert(quiz_id);
        let score = self.score();
        Ok(AnswerOutcome::Advanced {
            session: self,
            score,
        })
    }
}
