//! Operators: pipes that produce content through a collaborator

pub mod compose;
pub mod extract;
pub mod func;
pub mod img_gen;
pub mod llm;

pub use compose::PipeCompose;
pub use extract::PipeExtract;
pub use func::PipeFunc;
pub use img_gen::PipeImgGen;
pub use llm::PipeLlm;

use std::sync::Arc;

use super::core::PipeSignature;
use super::params::RunParams;
use super::router::PipeRouter;
use crate::content::StuffContent;
use crate::dry_run::synthesize_output;
use crate::error::{CollaboratorError, Result};
use crate::memory::Stuff;

/// Wrap generated content into the pipe's output stuff, checking it
/// against the output concept
pub(crate) fn output_stuff(
    signature: &PipeSignature,
    output_name: Option<&str>,
    content: StuffContent,
) -> Result<Stuff> {
    Ok(Stuff::new(
        signature.output_stuff_name(output_name),
        Arc::clone(&signature.output),
        content,
    )?)
}

/// Synthetic output for dry runs
pub(crate) fn dry_output(
    signature: &PipeSignature,
    router: &PipeRouter,
    params: &RunParams,
    output_name: Option<&str>,
) -> Result<Stuff> {
    let content = synthesize_output(signature, router.library().concepts(), params)?;
    output_stuff(signature, output_name, content)
}

/// Bring generated content in line with the requested multiplicity: a single
/// item becomes a one-item list when several were asked for, a list where one
/// was expected is rejected.
pub(crate) fn shape_output(
    pipe_code: &str,
    content: StuffContent,
    multiple: bool,
) -> std::result::Result<StuffContent, CollaboratorError> {
    match (multiple, content.is_list()) {
        (true, false) => Ok(StuffContent::list(vec![content])),
        (false, true) => Err(CollaboratorError::UnexpectedContent(format!(
            "pipe '{pipe_code}' expected a single output but got a list"
        ))),
        _ => Ok(content),
    }
}
