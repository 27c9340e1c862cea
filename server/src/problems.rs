use async_trait::async_trait;
use rand::Rng;
use shared::ProblemId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProblemBankError {
    #[error("no problems available")]
    Empty,
}

/// The problem-selection collaborator.
#[async_trait]
pub trait ProblemBank: Send + Sync {
    /// Picks one problem uniformly at random.
    async fn pick_random(&self) -> Result<ProblemId, ProblemBankError>;
}

pub struct InMemoryProblemBank {
    problems: Vec<ProblemId>,
}

impl InMemoryProblemBank {
    pub fn new(problems: Vec<ProblemId>) -> Self {
        Self { problems }
    }
}

#[async_trait]
impl ProblemBank for InMemoryProblemBank {
    async fn pick_random(&self) -> Result<ProblemId, ProblemBankError> {
        if self.problems.is_empty() {
            return Err(ProblemBankError::Empty);
        }
        let idx = rand::thread_rng().gen_range(0..self.problems.len());
        Ok(self.problems[idx].clone())
    }
}
