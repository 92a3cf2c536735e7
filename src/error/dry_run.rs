/// Dry-run validation error types
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DryRunError {
    #[error("Pipe '{pipe_code}' is missing required inputs: {}", join_names(.missing))]
    MissingInputs {
        pipe_code: String,
        missing: BTreeSet<String>,
    },

    #[error("Pipe '{pipe_code}' failed to evaluate '{expression}': {message}")]
    Evaluation {
        pipe_code: String,
        expression: String,
        message: String,
    },

    #[error("Pipe '{pipe_code}' produced an empty result")]
    EmptyResult { pipe_code: String },
}

fn join_names(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}

impl DryRunError {
    /// The pipe that failed validation
    pub fn pipe_code(&self) -> &str {
        match self {
            Self::MissingInputs { pipe_code, .. }
            | Self::Evaluation { pipe_code, .. }
            | Self::EmptyResult { pipe_code } => pipe_code,
        }
    }
}
