// PipeImgGen - image generation from a prompt

use async_trait::async_trait;

use super::{dry_output, output_stuff, shape_output};
use crate::collaborator::{GenerationJob, ImgGenJob};
use crate::concept::Concept;
use crate::content::{IMAGE_CLASS, TEXT_CLASS};
use crate::error::{PipeDefinitionError, Result};
use crate::memory::WorkingMemory;
use crate::pipeline::core::{PipeProduct, PipeSignature, RunPipe};
use crate::pipeline::input::PipeInputs;
use crate::pipeline::multiplicity::resolve_multiplicity;
use crate::pipeline::params::RunParams;
use crate::pipeline::router::PipeRouter;

#[derive(Clone, Debug)]
pub struct PipeImgGen {
    prompt_template: Option<String>,
}

impl PipeImgGen {
    /// Without a template the prompt is the sole text input
    pub fn new(
        pipe_code: &str,
        inputs: &PipeInputs,
        output: &Concept,
        prompt_template: Option<String>,
    ) -> std::result::Result<Self, PipeDefinitionError> {
        if output.structure_class_name != IMAGE_CLASS {
            return Err(PipeDefinitionError::new(
                pipe_code,
                format!("output '{output}' is not an image concept"),
            ));
        }
        if prompt_template.is_none() {
            match inputs.sole() {
                Some((_, requirement))
                    if requirement.concept.structure_class_name == TEXT_CLASS => {}
                _ => {
                    return Err(PipeDefinitionError::new(
                        pipe_code,
                        "needs a prompt_template or a single text input",
                    ));
                }
            }
        }
        Ok(Self { prompt_template })
    }

    fn prompt(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: &WorkingMemory,
    ) -> Result<String> {
        match &self.prompt_template {
            Some(template) => Ok(router
                .library()
                .collaborators()
                .renderer()?
                .render(template, &memory.to_template_context())?),
            None => {
                let name = signature.inputs.names().next().unwrap_or_default();
                Ok(memory.get_stuff(name)?.content.rendered_text())
            }
        }
    }
}

#[async_trait]
impl RunPipe for PipeImgGen {
    async fn run_pipe(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: WorkingMemory,
        params: &RunParams,
        output_name: Option<&str>,
    ) -> Result<PipeProduct> {
        let prompt = self.prompt(signature, router, &memory)?;
        if params.is_dry() {
            let stuff = dry_output(signature, router, params, output_name)?;
            return Ok(PipeProduct {
                working_memory: memory,
                stuff,
            });
        }

        let resolution =
            resolve_multiplicity(signature.output_multiplicity, params.output_multiplicity);
        let nb_images = resolution.specific_output_count.unwrap_or(1);
        let job = GenerationJob::Image(ImgGenJob {
            pipe_code: signature.code.clone(),
            prompt,
            nb_images,
        });
        let content = router
            .library()
            .collaborators()
            .generator()?
            .generate(job)
            .await?;
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
