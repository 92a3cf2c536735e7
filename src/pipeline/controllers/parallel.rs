// PipeParallel - concurrent branches over copies of the incoming memory

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

use super::join_branches;
use crate::concept::{Concept, NativeConcept};
use crate::content::StuffContent;
use crate::error::{PipeDefinitionError, Result};
use crate::memory::{Stuff, WorkingMemory};
use crate::pipeline::core::{PipeProduct, PipeSignature, RunPipe};
use crate::pipeline::params::RunParams;
use crate::pipeline::router::PipeRouter;
use crate::pipeline::sub_pipe::SubPipe;

#[derive(Clone, Debug)]
pub struct PipeParallel {
    parallels: Vec<SubPipe>,
    add_each_output: bool,
    combined_output: Option<Arc<Concept>>,
}

impl PipeParallel {
    /// `add_each_output` defaults to true once `combined_output` is set;
    /// leaving both unset produces nothing and is rejected.
    pub fn new(
        pipe_code: &str,
        parallels: Vec<SubPipe>,
        add_each_output: Option<bool>,
        combined_output: Option<Arc<Concept>>,
    ) -> std::result::Result<Self, PipeDefinitionError> {
        if parallels.is_empty() {
            return Err(PipeDefinitionError::new(pipe_code, "a parallel needs at least one branch"));
        }
        if let Some(branch) = parallels.iter().find(|branch| branch.result.is_none()) {
            return Err(PipeDefinitionError::new(
                pipe_code,
                format!("branch '{}' must name its result", branch.pipe_code),
            ));
        }
        if combined_output.is_none() && add_each_output != Some(true) {
            return Err(PipeDefinitionError::new(
                pipe_code,
                "set add_each_output or combined_output",
            ));
        }
        if let Some(concept) = &combined_output {
            let closed_native_class = NativeConcept::ALL.iter().any(|native| {
                !native.is_open() && native.structure_class_name() == concept.structure_class_name
            });
            if closed_native_class {
                return Err(PipeDefinitionError::new(
                    pipe_code,
                    format!(
                        "combined_output '{}' must have a record structure, not '{}'",
                        concept, concept.structure_class_name
                    ),
                ));
            }
        }
        Ok(Self {
            parallels,
            add_each_output: add_each_output.unwrap_or(true),
            combined_output,
        })
    }

    pub fn parallels(&self) -> &[SubPipe] {
        &self.parallels
    }

    pub fn add_each_output(&self) -> bool {
        self.add_each_output
    }

    pub fn combined_output(&self) -> Option<&Arc<Concept>> {
        self.combined_output.as_ref()
    }
}

#[async_trait]
impl RunPipe for PipeParallel {
    async fn run_pipe(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: WorkingMemory,
        params: &RunParams,
        output_name: Option<&str>,
    ) -> Result<PipeProduct> {
        // fail on dangling references before anything is spawned
        for branch in &self.parallels {
            router.library().get_required_pipe(&branch.pipe_code)?;
        }

        let mut branches = JoinSet::new();
        for (index, branch) in self.parallels.iter().enumerate() {
            debug!("Parallel '{}' spawning '{}'", signature.code, branch.pipe_code);
            let branch = branch.clone();
            let router = router.clone();
            let params = params.clone();
            let branch_memory = memory.clone();
            branches.spawn(async move {
                let output = branch.run(&router, branch_memory, &params).await;
                (index, output)
            });
        }
        let outputs = join_branches(branches, &signature.code, self.parallels.len()).await?;

        let mut memory = memory;
        let mut combined = Map::new();
        let mut last = None;
        for (branch, output) in self.parallels.iter().zip(outputs) {
            let stuff = output.main_stuff;
            let name = branch.result.clone().unwrap_or_else(|| stuff.name.clone());
            if self.add_each_output {
                memory.add_new_stuff(name.clone(), stuff.clone());
            }
            combined.insert(name, stuff.to_json());
            last = Some(stuff);
        }

        let stuff = match &self.combined_output {
            Some(concept) => Stuff::new(
                signature.output_stuff_name(output_name),
                Arc::clone(concept),
                StuffContent::structured(
                    concept.structure_class_name.clone(),
                    Value::Object(combined),
                ),
            )?,
            None => last.ok_or_else(|| {
                PipeDefinitionError::new(&signature.code, "a parallel needs at least one branch")
            })?,
        };
        Ok(PipeProduct {
            working_memory: memory,
            stuff,
        })
    }

    fn sub_pipe_codes(&self) -> Vec<&str> {
        self.parallels
            .iter()
            .map(|branch| branch.pipe_code.as_str())
            .collect()
    }
}
