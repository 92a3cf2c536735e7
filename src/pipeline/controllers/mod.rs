//! Controllers: pipes that orchestrate other pipes

pub mod batch;
pub mod condition;
pub mod parallel;
pub mod sequence;

pub use batch::PipeBatch;
pub use condition::PipeCondition;
pub use parallel::PipeParallel;
pub use sequence::PipeSequence;

use tokio::task::JoinSet;
use tracing::debug;

use super::core::PipeOutput;
use crate::error::{PipelineError, Result};

/// Wait for every branch, then surface the first failure in completion order.
/// Successful outputs come back in branch index order.
pub(crate) async fn join_branches(
    mut branches: JoinSet<(usize, Result<PipeOutput>)>,
    pipe_code: &str,
    count: usize,
) -> Result<Vec<PipeOutput>> {
    let mut outputs: Vec<Option<PipeOutput>> = (0..count).map(|_| None).collect();
    let mut first_error = None;

    while let Some(joined) = branches.join_next().await {
        match joined {
            Ok((index, Ok(output))) => {
                if let Some(slot) = outputs.get_mut(index) {
                    *slot = Some(output);
                }
            }
            Ok((index, Err(error))) => {
                debug!("Branch {} of '{}' failed: {}", index, pipe_code, error);
                first_error.get_or_insert(error);
            }
            Err(join_error) => {
                first_error.get_or_insert(PipelineError::BranchPanicked {
                    pipe_code: pipe_code.to_string(),
                    message: join_error.to_string(),
                });
            }
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(outputs.into_iter().flatten().collect()),
    }
}
