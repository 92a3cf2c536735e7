// PipeLLM - text or structured generation from a rendered prompt

use async_trait::async_trait;
use tracing::debug;

use super::{dry_output, output_stuff, shape_output};
use crate::collaborator::{GenerationJob, LlmJob};
use crate::content::{ImageContent, TEXT_CLASS};
use crate::error::{PipeDefinitionError, Result};
use crate::memory::WorkingMemory;
use crate::pipeline::core::{PipeProduct, PipeSignature, RunPipe};
use crate::pipeline::multiplicity::resolve_multiplicity;
use crate::pipeline::params::RunParams;
use crate::pipeline::router::PipeRouter;

#[derive(Clone, Debug)]
pub struct PipeLlm {
    prompt_template: String,
    system_prompt: Option<String>,
}

impl PipeLlm {
    pub fn new(
        pipe_code: &str,
        prompt_template: impl Into<String>,
        system_prompt: Option<String>,
    ) -> std::result::Result<Self, PipeDefinitionError> {
        let prompt_template = prompt_template.into();
        if prompt_template.trim().is_empty() {
            return Err(PipeDefinitionError::new(pipe_code, "prompt_template is empty"));
        }
        Ok(Self {
            prompt_template,
            system_prompt,
        })
    }

    pub fn prompt_template(&self) -> &str {
        &self.prompt_template
    }

    /// Images of every input whose concept is image-like, list items included
    fn collect_images(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: &WorkingMemory,
    ) -> Result<Vec<ImageContent>> {
        let concepts = router.library().concepts();
        let mut images = Vec::new();
        for (name, requirement) in signature.inputs.iter() {
            if !concepts.is_image_like(&requirement.concept)? {
                continue;
            }
            let content = &memory.get_stuff(name)?.content;
            match content.as_list() {
                Some(items) => images.extend(items.iter().flat_map(|item| item.images()).cloned()),
                None => images.extend(content.images().into_iter().cloned()),
            }
        }
        Ok(images)
    }
}

#[async_trait]
impl RunPipe for PipeLlm {
    async fn run_pipe(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: WorkingMemory,
        params: &RunParams,
        output_name: Option<&str>,
    ) -> Result<PipeProduct> {
        let collaborators = router.library().collaborators();
        let prompt = collaborators
            .renderer()?
            .render(&self.prompt_template, &memory.to_template_context())?;
        let images = self.collect_images(signature, router, &memory)?;

        if params.is_dry() {
            let stuff = dry_output(signature, router, params, output_name)?;
            return Ok(PipeProduct {
                working_memory: memory,
                stuff,
            });
        }

        let resolution =
            resolve_multiplicity(signature.output_multiplicity, params.output_multiplicity);
        let job = LlmJob {
            pipe_code: signature.code.clone(),
            prompt,
            system_prompt: self.system_prompt.clone(),
            images,
            output_class: signature.output.structure_class_name.clone(),
            output_concept: signature.output.concept_string(),
            multiple_outputs: resolution.is_multiple_outputs_enabled,
            nb_outputs: resolution.specific_output_count,
        };
        debug!(
            "LLM pipe '{}' requesting {} ({} images)",
            signature.code,
            job.output_concept,
            job.images.len()
        );
        let job = if job.output_class == TEXT_CLASS {
            GenerationJob::Text(job)
        } else {
            GenerationJob::Object(job)
        };

        let content = collaborators.generator()?.generate(job).await?;
        let content = shape_output(
            &signature.code,
            content,
            resolution.is_multiple_outputs_enabled,
        )?;
        let stuff = output_stuff(signature, output_name, content)?;
        Ok(PipeProduct {
            working_memory: memory,
            stuff,
        })
    }
}
