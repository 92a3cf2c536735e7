// PipeSequence - ordered steps over one shared working memory

use async_trait::async_trait;
use tracing::debug;

use crate::error::{PipeDefinitionError, Result};
use crate::memory::WorkingMemory;
use crate::pipeline::core::{PipeOutput, PipeProduct, PipeSignature, RunPipe};
use crate::pipeline::params::RunParams;
use crate::pipeline::router::PipeRouter;
use crate::pipeline::sub_pipe::SubPipe;

#[derive(Clone, Debug)]
pub struct PipeSequence {
    steps: Vec<SubPipe>,
}

impl PipeSequence {
    pub fn new(
        pipe_code: &str,
        steps: Vec<SubPipe>,
    ) -> std::result::Result<Self, PipeDefinitionError> {
        if steps.is_empty() {
            return Err(PipeDefinitionError::new(
                pipe_code,
                "a sequence needs at least one step",
            ));
        }
        for step in &steps {
            if let Some(batch) = &step.batch_params {
                if batch.input_list_stuff_name.is_empty()
                    || batch.input_item_stuff_name.is_empty()
                {
                    return Err(PipeDefinitionError::new(
                        pipe_code,
                        format!("step '{}' has an empty batch_over or batch_as", step.pipe_code),
                    ));
                }
            }
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[SubPipe] {
        &self.steps
    }
}

#[async_trait]
impl RunPipe for PipeSequence {
    async fn run_pipe(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: WorkingMemory,
        params: &RunParams,
        _output_name: Option<&str>,
    ) -> Result<PipeProduct> {
        let mut memory = memory;
        let mut last = None;
        for (index, step) in self.steps.iter().enumerate() {
            debug!(
                "Sequence '{}' step {}/{}: '{}'",
                signature.code,
                index + 1,
                self.steps.len(),
                step.pipe_code
            );
            let PipeOutput {
                working_memory,
                main_stuff,
            } = step.run(router, memory, params).await?;
            memory = working_memory;
            last = Some(main_stuff);
        }

        let stuff = last.ok_or_else(|| {
            PipeDefinitionError::new(&signature.code, "a sequence needs at least one step")
        })?;
        Ok(PipeProduct {
            working_memory: memory,
            stuff,
        })
    }

    fn sub_pipe_codes(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.pipe_code.as_str()).collect()
    }
}
