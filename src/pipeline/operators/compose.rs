// PipeCompose - render a template into text or HTML

use async_trait::async_trait;

use super::output_stuff;
use crate::concept::Concept;
use crate::content::{HTML_CLASS, HtmlContent, StuffContent, TEXT_CLASS};
use crate::error::{PipeDefinitionError, Result};
use crate::memory::WorkingMemory;
use crate::pipeline::core::{PipeProduct, PipeSignature, RunPipe};
use crate::pipeline::params::RunParams;
use crate::pipeline::router::PipeRouter;

const COMPOSE_CSS_CLASS: &str = "pipeweave-compose";

#[derive(Clone, Debug)]
pub struct PipeCompose {
    template: String,
}

impl PipeCompose {
    pub fn new(
        pipe_code: &str,
        output: &Concept,
        template: impl Into<String>,
    ) -> std::result::Result<Self, PipeDefinitionError> {
        let class = output.structure_class_name.as_str();
        if class != TEXT_CLASS && class != HTML_CLASS {
            return Err(PipeDefinitionError::new(
                pipe_code,
                format!("output '{output}' must be text or HTML, not '{class}'"),
            ));
        }
        Ok(Self {
            template: template.into(),
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

// Rendering has no side effects, so dry runs compose for real.
#[async_trait]
impl RunPipe for PipeCompose {
    async fn run_pipe(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: WorkingMemory,
        _params: &RunParams,
        output_name: Option<&str>,
    ) -> Result<PipeProduct> {
        let rendered = router
            .library()
            .collaborators()
            .renderer()?
            .render(&self.template, &memory.to_template_context())?;
        let content = if signature.output.structure_class_name == HTML_CLASS {
            StuffContent::Html(HtmlContent {
                inner_html: rendered,
                css_class: COMPOSE_CSS_CLASS.to_string(),
            })
        } else {
            StuffContent::text(rendered)
        };
        let stuff = output_stuff(signature, output_name, content)?;
        Ok(PipeProduct {
            working_memory: memory,
            stuff,
        })
    }
}
