// PipeFunc - call a registered function with the declared inputs

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::debug;

use super::{dry_output, output_stuff};
use crate::error::{PipeDefinitionError, Result};
use crate::memory::{Stuff, WorkingMemory};
use crate::pipeline::core::{PipeProduct, PipeSignature, RunPipe};
use crate::pipeline::params::RunParams;
use crate::pipeline::router::PipeRouter;

#[derive(Clone, Debug)]
pub struct PipeFunc {
    function_name: String,
}

impl PipeFunc {
    pub fn new(
        pipe_code: &str,
        function_name: impl Into<String>,
    ) -> std::result::Result<Self, PipeDefinitionError> {
        let function_name = function_name.into();
        if function_name.trim().is_empty() {
            return Err(PipeDefinitionError::new(pipe_code, "function_name is empty"));
        }
        Ok(Self { function_name })
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }
}

#[async_trait]
impl RunPipe for PipeFunc {
    async fn run_pipe(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: WorkingMemory,
        params: &RunParams,
        output_name: Option<&str>,
    ) -> Result<PipeProduct> {
        let function = router
            .library()
            .collaborators()
            .functions
            .get_required(&self.function_name)?;

        if params.is_dry() {
            let stuff = dry_output(signature, router, params, output_name)?;
            return Ok(PipeProduct {
                working_memory: memory,
                stuff,
            });
        }

        let inputs = signature
            .inputs
            .names()
            .map(|name| -> Result<(String, Stuff)> {
                Ok((name.to_string(), memory.get_stuff(name)?.clone()))
            })
            .collect::<Result<IndexMap<_, _>>>()?;
        debug!(
            "Calling function '{}' for pipe '{}'",
            self.function_name, signature.code
        );
        let content = function(&inputs)?;
        let stuff = output_stuff(signature, output_name, content)?;
        Ok(PipeProduct {
            working_memory: memory,
            stuff,
        })
    }
}
