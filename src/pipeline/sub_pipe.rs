// Sub-pipe references held by controllers, resolved at run time

use std::sync::Arc;
use tracing::debug;

use super::controllers::batch::run_fan_out;
use super::core::PipeOutput;
use super::multiplicity::Multiplicity;
use super::params::RunParams;
use super::router::PipeRouter;
use crate::error::Result;
use crate::memory::WorkingMemory;

/// Fan a step out over the items of a list stuff
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchParams {
    pub input_list_stuff_name: String,
    pub input_item_stuff_name: String,
}

impl BatchParams {
    pub fn new(list_name: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            input_list_stuff_name: list_name.into(),
            input_item_stuff_name: item_name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubPipe {
    pub pipe_code: String,
    pub result: Option<String>,
    pub output_multiplicity: Option<Multiplicity>,
    pub batch_params: Option<BatchParams>,
}

impl SubPipe {
    pub fn new(pipe_code: impl Into<String>) -> Self {
        Self {
            pipe_code: pipe_code.into(),
            result: None,
            output_multiplicity: None,
            batch_params: None,
        }
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_multiplicity(mut self, multiplicity: Option<Multiplicity>) -> Self {
        self.output_multiplicity = multiplicity;
        self
    }

    pub fn with_batch(
        mut self,
        list_name: impl Into<String>,
        item_name: impl Into<String>,
    ) -> Self {
        self.batch_params = Some(BatchParams::new(list_name, item_name));
        self
    }

    /// Resolve the referenced pipe and run it, once or once per list item
    pub async fn run(
        &self,
        router: &PipeRouter,
        memory: WorkingMemory,
        params: &RunParams,
    ) -> Result<PipeOutput> {
        let pipe = router.library().get_required_pipe(&self.pipe_code)?;
        let sub_params = params.for_sub_pipe(self.output_multiplicity);

        let Some(batch) = &self.batch_params else {
            return router
                .run(pipe, memory, sub_params, self.result.clone())
                .await;
        };

        let name = pipe.signature.output_stuff_name(self.result.as_deref());
        debug!(
            "Batching '{}' over '{}' as '{}'",
            self.pipe_code, batch.input_list_stuff_name, batch.input_item_stuff_name
        );
        let stuff = run_fan_out(
            router,
            Arc::clone(&pipe),
            &memory,
            &sub_params,
            &batch.input_list_stuff_name,
            &batch.input_item_stuff_name,
            &name,
        )
        .await?;

        let mut working_memory = memory;
        working_memory.set_new_main_stuff(name.clone(), stuff);
        let main_stuff = working_memory.get_stuff(&name)?.clone();
        Ok(PipeOutput {
            working_memory,
            main_stuff,
        })
    }
}
