/// Errors raised by external collaborators (generators, renderers, evaluators, functions)
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Content generation failed: {0}")]
    Generation(String),

    #[error("Template rendering failed: {0}")]
    Render(String),

    #[error("Expression evaluation failed: {0}")]
    Evaluation(String),

    #[error("Function '{name}' failed: {message}")]
    Function { name: String, message: String },

    #[error("Function '{0}' is not registered")]
    FunctionNotFound(String),

    #[error("No {0} configured")]
    Unavailable(&'static str),

    #[error("Unexpected content: {0}")]
    UnexpectedContent(String),
}

impl CollaboratorError {
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    pub fn function(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Function {
            name: name.into(),
            message: msg.into(),
        }
    }
}
