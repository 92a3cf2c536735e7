/// Construction-time pipe validation errors
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid definition for pipe '{pipe_code}': {message}")]
pub struct PipeDefinitionError {
    pub pipe_code: String,
    pub message: String,
}

impl PipeDefinitionError {
    pub fn new(pipe_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pipe_code: pipe_code.into(),
            message: message.into(),
        }
    }
}
