/// Concept and structure-class error types
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConceptError {
    #[error("Concept '{concept_ref}' not found")]
    NotFound { concept_ref: String },

    #[error("Concept '{domain}.{code}' is already defined")]
    Duplicate { domain: String, code: String },

    #[error("Invalid concept definition '{concept_ref}': {message}")]
    Definition { concept_ref: String, message: String },

    #[error("Structure class '{class_name}' not found")]
    StructureNotFound { class_name: String },

    #[error("Structure cycle detected: {}", .cycles.join("; "))]
    StructureCycle { cycles: Vec<String> },

    #[error("Content of class '{found}' does not match concept '{concept}' (expected '{expected}')")]
    ContentMismatch {
        concept: String,
        expected: String,
        found: String,
    },
}

pub type ConceptDefinitionError = ConceptError;

impl ConceptError {
    /// Create a ConceptNotFound error
    pub fn not_found(concept_ref: impl Into<String>) -> Self {
        Self::NotFound {
            concept_ref: concept_ref.into(),
        }
    }

    /// Create a ConceptDefinitionError
    pub fn definition(concept_ref: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Definition {
            concept_ref: concept_ref.into(),
            message: message.into(),
        }
    }
}
