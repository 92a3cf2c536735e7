// Pipe router - single entry point for running any pipe

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

use super::core::{Pipe, PipeOutput, PipeProduct};
use super::library::Library;
use super::params::RunParams;
use crate::concept::{Concept, is_compatible};
use crate::error::{DryRunError, PipeRouterError, PipelineError, Result};
use crate::memory::WorkingMemory;

pub type PipeRun = Pin<Box<dyn Future<Output = Result<PipeOutput>> + Send>>;

/// Runs pipes against a working memory under the recursion guard
#[derive(Clone, Debug)]
pub struct PipeRouter {
    library: Arc<Library>,
}

impl PipeRouter {
    pub fn new(library: Arc<Library>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Run `pipe` and store its result under `output_name` (or the stuff's
    /// own name) as the new main stuff.
    ///
    /// The pipe's frame is pushed on the shared stack for the duration of the
    /// run and popped on every exit path. Failures are annotated once, by the
    /// innermost router, with the pipe, mode, output name and stack.
    pub fn run(
        &self,
        pipe: Arc<Pipe>,
        memory: WorkingMemory,
        params: RunParams,
        output_name: Option<String>,
    ) -> PipeRun {
        let router = self.clone();
        Box::pin(async move {
            let frame = match params
                .pipe_stack
                .enter(pipe.code(), params.pipe_stack_limit)
            {
                Ok(frame) => frame,
                Err(error) => {
                    let stack = params.pipe_stack.snapshot();
                    return Err(annotate(error, &pipe, &params, output_name, stack));
                }
            };

            let result = router
                .execute(&pipe, memory, &params, output_name.as_deref())
                .await;
            let result = result.map_err(|error| {
                let stack = params.pipe_stack.snapshot();
                annotate(error, &pipe, &params, output_name, stack)
            });
            drop(frame);
            result
        })
    }

    /// Look a pipe up by code, then run it
    pub async fn run_code(
        &self,
        pipe_code: &str,
        memory: WorkingMemory,
        params: RunParams,
        output_name: Option<String>,
    ) -> Result<PipeOutput> {
        let pipe = self.library.get_required_pipe(pipe_code)?;
        self.run(pipe, memory, params, output_name).await
    }

    async fn execute(
        &self,
        pipe: &Pipe,
        memory: WorkingMemory,
        params: &RunParams,
        output_name: Option<&str>,
    ) -> Result<PipeOutput> {
        self.check_inputs(pipe, &memory, params)?;
        debug!(
            "Running {} '{}' ({} mode, depth {})",
            pipe.type_name(),
            pipe.code(),
            params.run_mode,
            params.pipe_stack.depth()
        );

        let PipeProduct {
            mut working_memory,
            stuff,
        } = pipe.run_pipe(self, memory, params, output_name).await?;
        check_output(pipe, &stuff.concept)?;

        let name = output_name
            .map(str::to_string)
            .unwrap_or_else(|| stuff.name.clone());
        working_memory.set_new_main_stuff(name.clone(), stuff);
        let main_stuff = working_memory.get_stuff(&name)?.clone();

        debug!("Pipe '{}' produced '{}'", pipe.code(), name);
        Ok(PipeOutput {
            working_memory,
            main_stuff,
        })
    }

    fn check_inputs(&self, pipe: &Pipe, memory: &WorkingMemory, params: &RunParams) -> Result<()> {
        let missing = memory.missing_names(pipe.inputs().names());
        if !missing.is_empty() {
            return Err(if params.is_dry() {
                DryRunError::MissingInputs {
                    pipe_code: pipe.code().to_string(),
                    missing,
                }
                .into()
            } else {
                PipelineError::missing_inputs(pipe.code(), missing)
            });
        }

        for (name, requirement) in pipe.inputs().iter() {
            let stuff = memory.get_stuff(name)?;
            let wanted = &requirement.concept;
            if !wanted.accepts_any_content() && !is_compatible(&stuff.concept, wanted, false) {
                return Err(PipelineError::InputConceptMismatch {
                    pipe_code: pipe.code().to_string(),
                    input: name.to_string(),
                    expected: wanted.concept_string(),
                    found: stuff.concept.concept_string(),
                });
            }
        }
        Ok(())
    }
}

/// The produced stuff must fit the declared output, refinements and
/// siblings included
fn check_output(pipe: &Pipe, produced: &Concept) -> Result<()> {
    let declared = pipe.output();
    if declared.accepts_any_content() || is_compatible(produced, declared, false) {
        return Ok(());
    }
    Err(PipelineError::OutputConceptMismatch {
        pipe_code: pipe.code().to_string(),
        expected: declared.concept_string(),
        found: produced.concept_string(),
    })
}

fn annotate(
    error: PipelineError,
    pipe: &Pipe,
    params: &RunParams,
    output_name: Option<String>,
    pipe_stack: Vec<String>,
) -> PipelineError {
    match error {
        PipelineError::Router(_) => error,
        source => {
            debug!("Pipe '{}' failed: {}", pipe.code(), source);
            PipelineError::Router(Box::new(PipeRouterError {
                pipe_code: pipe.code().to_string(),
                run_mode: params.run_mode,
                output_name,
                pipe_stack,
                source: Box::new(source),
            }))
        }
    }
}
