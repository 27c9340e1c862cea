use async_trait::async_trait;
use shared::{Language, ProblemId};
use std::time::Duration;
use thiserror::Error;

/// Outcome of running a submission against a problem's test cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub score: u32,
    pub passed_test_count: u32,
}

#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge did not answer within {0:?}")]
    Timeout(Duration),
    #[error("judge unavailable: {0}")]
    Unavailable(String),
    #[error("judge rejected the submission: {0}")]
    Rejected(String),
}

/// The code-execution collaborator. A failed or timed-out call rejects the
/// submission and leaves room state untouched.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Languages the execution backend can compile and run.
    fn supports(&self, language: Language) -> bool;

    async fn evaluate(
        &self,
        problem_id: &ProblemId,
        code: &str,
        language: Language,
    ) -> Result<Verdict, JudgeError>;
}

/// Development backend returning the same verdict for every submission.
/// Deployments implement [`Judge`] against their execution service instead.
pub struct FixedJudge {
    verdict: Verdict,
}

impl FixedJudge {
    pub fn new(verdict: Verdict) -> Self {
        Self { verdict }
    }
}

#[async_trait]
impl Judge for FixedJudge {
    fn supports(&self, _language: Language) -> bool {
        true
    }

    async fn evaluate(
        &self,
        _problem_id: &ProblemId,
        _code: &str,
        _language: Language,
    ) -> Result<Verdict, JudgeError> {
        Ok(self.verdict)
    }
}
