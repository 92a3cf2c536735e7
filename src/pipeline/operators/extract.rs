// PipeExtract - split an image or PDF into pages

use async_trait::async_trait;

use super::{output_stuff, shape_output};
use crate::collaborator::{ExtractJob, GenerationJob};
use crate::concept::Concept;
use crate::content::{IMAGE_CLASS, PAGE_CLASS, PDF_CLASS};
use crate::dry_run::synthesize_list;
use crate::error::{PipeDefinitionError, Result};
use crate::memory::WorkingMemory;
use crate::pipeline::core::{PipeProduct, PipeSignature, RunPipe};
use crate::pipeline::input::PipeInputs;
use crate::pipeline::params::RunParams;
use crate::pipeline::router::PipeRouter;

#[derive(Clone, Debug)]
pub struct PipeExtract {
    input_name: String,
    page_views: bool,
}

impl PipeExtract {
    pub fn new(
        pipe_code: &str,
        inputs: &PipeInputs,
        output: &Concept,
        page_views: bool,
    ) -> std::result::Result<Self, PipeDefinitionError> {
        let (input_name, requirement) = inputs.sole().ok_or_else(|| {
            PipeDefinitionError::new(pipe_code, "needs exactly one image or PDF input")
        })?;
        let input_class = requirement.concept.structure_class_name.as_str();
        if input_class != IMAGE_CLASS && input_class != PDF_CLASS {
            return Err(PipeDefinitionError::new(
                pipe_code,
                format!("input '{input_name}' must be an image or a PDF, not '{input_class}'"),
            ));
        }
        if output.structure_class_name != PAGE_CLASS {
            return Err(PipeDefinitionError::new(
                pipe_code,
                format!("output '{output}' must be a page concept"),
            ));
        }
        Ok(Self {
            input_name: input_name.to_string(),
            page_views,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }
}

#[async_trait]
impl RunPipe for PipeExtract {
    async fn run_pipe(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: WorkingMemory,
        params: &RunParams,
        output_name: Option<&str>,
    ) -> Result<PipeProduct> {
        let document = memory.get_stuff(&self.input_name)?.content.clone();

        let content = if params.is_dry() {
            synthesize_list(
                &signature.output,
                router.library().concepts(),
                params.dry_run_list_len,
            )?
        } else {
            let job = GenerationJob::Extract(ExtractJob {
                pipe_code: signature.code.clone(),
                document,
                page_views: self.page_views,
            });
            let pages = router
                .library()
                .collaborators()
                .generator()?
                .generate(job)
                .await?;
            shape_output(&signature.code, pages, true)?
        };
        let stuff = output_stuff(signature, output_name, content)?;
        Ok(PipeProduct {
            working_memory: memory,
            stuff,
        })
    }
}
