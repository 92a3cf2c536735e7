/// Unified error type for pipe execution
use std::collections::BTreeSet;
use thiserror::Error;

use super::{CollaboratorError, ConceptError, DryRunError, PipeDefinitionError, WorkingMemoryError};
use crate::pipeline::RunMode;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Concept error: {0}")]
    Concept(#[from] ConceptError),

    #[error("{0}")]
    Definition(#[from] PipeDefinitionError),

    #[error("Working memory error: {0}")]
    Memory(#[from] WorkingMemoryError),

    #[error("Dry run error: {0}")]
    DryRun(#[from] DryRunError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Condition error: {0}")]
    Condition(#[from] ConditionError),

    #[error("Pipe '{0}' not found")]
    PipeNotFound(String),

    #[error("Pipe stack overflow (limit {limit}): {}", .stack.join(" > "))]
    PipeStackOverflow { limit: usize, stack: Vec<String> },

    #[error(
        "Pipe '{pipe_code}' is missing required inputs: {}",
        .missing.iter().cloned().collect::<Vec<_>>().join(", ")
    )]
    MissingInputs {
        pipe_code: String,
        missing: BTreeSet<String>,
    },

    #[error(
        "Input '{input}' of pipe '{pipe_code}' expects concept '{expected}' but got '{found}'"
    )]
    InputConceptMismatch {
        pipe_code: String,
        input: String,
        expected: String,
        found: String,
    },

    #[error("Pipe '{pipe_code}' declares output '{expected}' but produced '{found}'")]
    OutputConceptMismatch {
        pipe_code: String,
        expected: String,
        found: String,
    },

    #[error("Branch of pipe '{pipe_code}' panicked: {message}")]
    BranchPanicked { pipe_code: String, message: String },

    #[error("{0}")]
    Router(Box<PipeRouterError>),
}

/// Result type alias using PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Create a missing inputs error for live runs
    pub fn missing_inputs(pipe_code: impl Into<String>, missing: BTreeSet<String>) -> Self {
        Self::MissingInputs {
            pipe_code: pipe_code.into(),
            missing,
        }
    }

    /// Create a pipe-not-found error
    pub fn pipe_not_found(code: impl Into<String>) -> Self {
        Self::PipeNotFound(code.into())
    }

    /// The error with every router annotation peeled off
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            Self::Router(annotated) => annotated.source.root_cause(),
            other => other,
        }
    }

    /// Router annotation carrying the failing pipe, mode and stack
    pub fn router_context(&self) -> Option<&PipeRouterError> {
        match self {
            Self::Router(annotated) => Some(annotated),
            _ => None,
        }
    }

    pub fn is_stack_overflow(&self) -> bool {
        matches!(self.root_cause(), Self::PipeStackOverflow { .. })
    }
}

/// A run-time failure annotated with where it happened
#[derive(Error, Debug)]
#[error(
    "Pipe '{pipe_code}' failed in {run_mode} mode (output: {}, stack: {}): {source}",
    .output_name.as_deref().unwrap_or("<main>"),
    .pipe_stack.join(" > ")
)]
pub struct PipeRouterError {
    pub pipe_code: String,
    pub run_mode: RunMode,
    pub output_name: Option<String>,
    pub pipe_stack: Vec<String>,
    #[source]
    pub source: Box<PipelineError>,
}

/// PipeCondition failure kinds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    #[error("Pipe '{pipe_code}' could not evaluate its expression: {message}")]
    Evaluation { pipe_code: String, message: String },

    #[error("Pipe '{pipe_code}' has no branch for '{value}' and no default pipe")]
    NoMatch { pipe_code: String, value: String },
}
