// PipeBatch - one branch pipe run per item of a list input

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

use super::join_branches;
use crate::content::StuffContent;
use crate::error::{PipeDefinitionError, Result};
use crate::memory::{Stuff, WorkingMemory};
use crate::pipeline::core::{Pipe, PipeProduct, PipeSignature, RunPipe};
use crate::pipeline::input::PipeInputs;
use crate::pipeline::params::RunParams;
use crate::pipeline::router::PipeRouter;

#[derive(Clone, Debug)]
pub struct PipeBatch {
    branch_pipe_code: String,
    input_list_name: String,
    input_item_name: String,
}

impl PipeBatch {
    /// `input_list_name` defaults to the sole declared input
    pub fn new(
        pipe_code: &str,
        inputs: &PipeInputs,
        branch_pipe_code: impl Into<String>,
        input_list_name: Option<String>,
        input_item_name: impl Into<String>,
    ) -> std::result::Result<Self, PipeDefinitionError> {
        let input_list_name = match input_list_name {
            Some(name) => name,
            None => match inputs.sole() {
                Some((name, _)) => name.to_string(),
                None => {
                    return Err(PipeDefinitionError::new(
                        pipe_code,
                        format!(
                            "input_list_name must be set when the pipe declares {} inputs",
                            inputs.len()
                        ),
                    ));
                }
            },
        };
        let input_item_name = input_item_name.into();
        if input_item_name.is_empty() {
            return Err(PipeDefinitionError::new(pipe_code, "input_item_name is empty"));
        }
        if input_item_name == input_list_name {
            return Err(PipeDefinitionError::new(
                pipe_code,
                "input_item_name must differ from input_list_name",
            ));
        }
        Ok(Self {
            branch_pipe_code: branch_pipe_code.into(),
            input_list_name,
            input_item_name,
        })
    }

    pub fn branch_pipe_code(&self) -> &str {
        &self.branch_pipe_code
    }

    pub fn input_list_name(&self) -> &str {
        &self.input_list_name
    }

    pub fn input_item_name(&self) -> &str {
        &self.input_item_name
    }
}

#[async_trait]
impl RunPipe for PipeBatch {
    async fn run_pipe(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: WorkingMemory,
        params: &RunParams,
        output_name: Option<&str>,
    ) -> Result<PipeProduct> {
        let branch = router.library().get_required_pipe(&self.branch_pipe_code)?;
        let stuff = run_fan_out(
            router,
            branch,
            &memory,
            &params.for_sub_pipe(None),
            &self.input_list_name,
            &self.input_item_name,
            &signature.output_stuff_name(output_name),
        )
        .await?;
        Ok(PipeProduct {
            working_memory: memory,
            stuff,
        })
    }

    fn sub_pipe_codes(&self) -> Vec<&str> {
        vec![self.branch_pipe_code.as_str()]
    }
}

/// Run `branch` once per item of the list stuff `list_name`, each on its own
/// copy of `memory` with the item bound to `item_name`. Results are collected
/// in input order into a list stuff of the branch's output concept.
pub(crate) async fn run_fan_out(
    router: &PipeRouter,
    branch: Arc<Pipe>,
    memory: &WorkingMemory,
    params: &RunParams,
    list_name: &str,
    item_name: &str,
    result_name: &str,
) -> Result<Stuff> {
    let (list_stuff, items) = memory.get_list_items(list_name)?;
    debug!(
        "Fanning '{}' out over {} items of '{}'",
        branch.code(),
        items.len(),
        list_name
    );

    let mut branches = JoinSet::new();
    for (index, item) in items.iter().enumerate() {
        let item_stuff = Stuff {
            name: item_name.to_string(),
            concept: Arc::clone(&list_stuff.concept),
            content: item.clone(),
        };
        let mut branch_memory = memory.clone();
        branch_memory.add_new_stuff(item_name, item_stuff);
        let run = router.run(Arc::clone(&branch), branch_memory, params.clone(), None);
        branches.spawn(async move { (index, run.await) });
    }

    let outputs = join_branches(branches, branch.code(), items.len()).await?;
    let results = outputs
        .into_iter()
        .map(|output| output.main_stuff.content)
        .collect::<Vec<_>>();
    Ok(Stuff::new(
        result_name,
        Arc::clone(branch.output()),
        StuffContent::list(results),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::{Concept, NativeConcept};
    use crate::pipeline::input::InputRequirement;

    fn text() -> Arc<Concept> {
        Arc::new(Concept::native(NativeConcept::Text))
    }

    #[test]
    fn test_list_name_defaults_to_sole_input() {
        let inputs = PipeInputs::new().with("lines", InputRequirement::list(text()));
        let batch = PipeBatch::new("each_line", &inputs, "shout", None, "line").unwrap();
        assert_eq!(batch.input_list_name(), "lines");
        assert_eq!(batch.input_item_name(), "line");
    }

    #[test]
    fn test_ambiguous_list_name_rejected() {
        let inputs = PipeInputs::new()
            .with("a", InputRequirement::list(text()))
            .with("b", InputRequirement::single(text()));
        assert!(PipeBatch::new("each", &inputs, "shout", None, "line").is_err());
        assert!(PipeBatch::new("each", &inputs, "shout", Some("a".into()), "line").is_ok());
    }

    #[test]
    fn test_item_name_must_differ() {
        let inputs = PipeInputs::new().with("lines", InputRequirement::list(text()));
        assert!(PipeBatch::new("each", &inputs, "shout", None, "lines").is_err());
    }
}
