pub mod api;
pub mod collaborator;
pub mod concept;
pub mod config;
pub mod content;
pub mod dry_run;
pub mod error;
pub mod logging;
pub mod memory;
pub mod pipeline;

pub use api::Engine;
pub use error::{PipelineError, Result};
