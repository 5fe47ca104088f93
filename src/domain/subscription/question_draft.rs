//! In-progress exam draft bounded by the plan's questions-per-exam limit.
//!
//! Question limits are enforced while an exam is being composed, not
//! through the usage ledger, so there is no stored counter to race on.

use super::{QuotaError, Subscription};

/// Ordered list of questions that refuses to grow past its limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft<Q> {
    limit: u32,
    questions: Vec<Q>,
}

impl<Q> QuestionDraft<Q> {
    /// Empty draft with an explicit limit.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            questions: Vec::new(),
        }
    }

    /// Empty draft bounded by the subscription's question limit.
    pub fn for_subscription(subscription: &Subscription) -> Self {
        Self::with_limit(subscription.question_limit)
    }

    /// Append a question.
    ///
    /// # Errors
    ///
    /// `QuotaError::QuestionLimitReached` if the draft is already full. The
    /// draft is left unchanged.
    pub fn push(&mut self, question: Q) -> Result<(), QuotaError> {
        if !self.can_add() {
            return Err(QuotaError::question_limit_reached(self.limit));
        }
        self.questions.push(question);
        Ok(())
    }

    /// Remove the question at `index`, if present.
    pub fn remove(&mut self, index: usize) -> Option<Q> {
        if index < self.questions.len() {
            Some(self.questions.remove(index))
        } else {
            None
        }
    }

    pub fn can_add(&self) -> bool {
        self.questions.len() < self.limit as usize
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Slots left before the limit is reached.
    pub fn remaining(&self) -> usize {
        (self.limit as usize).saturating_sub(self.questions.len())
    }

    pub fn questions(&self) -> &[Q] {
        &self.questions
    }

    pub fn into_questions(self) -> Vec<Q> {
        self.questions
    }
}
