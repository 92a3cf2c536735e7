/// Working memory error types
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkingMemoryError {
    #[error("Stuff '{0}' not found in working memory")]
    StuffNotFound(String),

    #[error("Alias '{alias}' points to missing stuff '{target}'")]
    AliasTargetMissing { alias: String, target: String },

    #[error("Stuff '{name}' is not a list (found '{class_name}')")]
    NotAList { name: String, class_name: String },

    #[error("Working memory has no main stuff")]
    NoMainStuff,
}
