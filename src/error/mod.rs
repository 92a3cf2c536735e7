/// Centralized error handling for pipeweave
pub mod collaborator;
pub mod concept;
pub mod definition;
pub mod dry_run;
pub mod memory;
pub mod pipeline;

pub use collaborator::CollaboratorError;
pub use concept::{ConceptDefinitionError, ConceptError};
pub use definition::PipeDefinitionError;
pub use dry_run::DryRunError;
pub use memory::WorkingMemoryError;
pub use pipeline::{ConditionError, PipeRouterError, PipelineError, Result};
