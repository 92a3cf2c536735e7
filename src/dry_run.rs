//! Dry runs: synthetic content and whole-library validation

use indexmap::IndexMap;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::concept::{Concept, ConceptLibrary, FieldType};
use crate::config::EngineConfig;
use crate::content::{
    HTML_CLASS, HtmlContent, IMAGE_CLASS, NUMBER_CLASS, PAGE_CLASS, PDF_CLASS,
    PageContent, PdfContent, StuffContent, TEXT_AND_IMAGES_CLASS, TEXT_CLASS,
    TextAndImagesContent, TextContent,
};
use crate::error::{ConceptError, PipelineError};
use crate::memory::{Stuff, WorkingMemory};
use crate::pipeline::core::{Pipe, PipeOutput, PipeSignature, to_snake_case};
use crate::pipeline::multiplicity::resolve_multiplicity;
use crate::pipeline::{Library, PipeRouter, RunMode, RunParams};

/// Minimal valid single content for `concept`
pub fn synthesize_content(
    concept: &Concept,
    concepts: &ConceptLibrary,
) -> Result<StuffContent, ConceptError> {
    let label = format!("dry run {}", concept.code);
    if concept.accepts_any_content() {
        return Ok(StuffContent::text(label));
    }
    let slug = to_snake_case(&concept.code);
    let content = match concept.structure_class_name.as_str() {
        TEXT_CLASS => StuffContent::text(label),
        NUMBER_CLASS => StuffContent::number(0.0),
        IMAGE_CLASS => StuffContent::image(format!("dry-run://{slug}.png")),
        PDF_CLASS => StuffContent::Pdf(PdfContent {
            url: format!("dry-run://{slug}.pdf"),
        }),
        TEXT_AND_IMAGES_CLASS => StuffContent::TextAndImages(TextAndImagesContent {
            text: Some(TextContent { text: label }),
            images: Vec::new(),
        }),
        PAGE_CLASS => StuffContent::Page(PageContent {
            text_and_images: TextAndImagesContent {
                text: Some(TextContent { text: label }),
                images: Vec::new(),
            },
            page_view: None,
        }),
        HTML_CLASS => StuffContent::Html(HtmlContent {
            inner_html: format!("<p>{label}</p>"),
            css_class: "dry-run".to_string(),
        }),
        class_name => {
            let mut visiting = Vec::new();
            let value = synthesize_record(concepts, class_name, &mut visiting)?;
            StuffContent::structured(class_name, value)
        }
    };
    Ok(content)
}

/// `count` synthetic items of `concept` as list content
pub fn synthesize_list(
    concept: &Concept,
    concepts: &ConceptLibrary,
    count: usize,
) -> Result<StuffContent, ConceptError> {
    let items = (0..count)
        .map(|_| synthesize_content(concept, concepts))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(StuffContent::list(items))
}

/// Synthetic output of a pipe, honouring the resolved multiplicity
pub fn synthesize_output(
    signature: &PipeSignature,
    concepts: &ConceptLibrary,
    params: &RunParams,
) -> Result<StuffContent, ConceptError> {
    let resolution =
        resolve_multiplicity(signature.output_multiplicity, params.output_multiplicity);
    if resolution.is_multiple_outputs_enabled {
        let count = resolution
            .specific_output_count
            .map(|count| count as usize)
            .unwrap_or(params.dry_run_list_len);
        synthesize_list(&signature.output, concepts, count)
    } else {
        synthesize_content(&signature.output, concepts)
    }
}

/// A memory holding one synthetic stuff per declared input of `pipe`
pub fn synthesize_inputs(
    pipe: &Pipe,
    concepts: &ConceptLibrary,
    list_len: usize,
) -> Result<WorkingMemory, ConceptError> {
    let list_inputs = pipe.list_input_names();
    let mut memory = WorkingMemory::new();
    for (name, requirement) in pipe.inputs().iter() {
        let content = if list_inputs.contains(&name) {
            let count = requirement
                .multiplicity
                .and_then(|m| m.count())
                .map(|count| count as usize)
                .unwrap_or(list_len);
            synthesize_list(&requirement.concept, concepts, count)?
        } else {
            synthesize_content(&requirement.concept, concepts)?
        };
        memory.add_new_stuff(name, Stuff::new(name, Arc::clone(&requirement.concept), content)?);
    }
    Ok(memory)
}

fn synthesize_record(
    concepts: &ConceptLibrary,
    class_name: &str,
    visiting: &mut Vec<String>,
) -> Result<Value, ConceptError> {
    if visiting.iter().any(|visited| visited == class_name) {
        return Ok(Value::Null);
    }
    let class = concepts.structures().get_required(class_name)?;
    visiting.push(class_name.to_string());
    let mut record = Map::new();
    for (field, field_type) in &class.fields {
        let value = synthesize_field(concepts, field, field_type, visiting)?;
        record.insert(field.clone(), value);
    }
    visiting.pop();
    Ok(Value::Object(record))
}

fn synthesize_field(
    concepts: &ConceptLibrary,
    field: &str,
    field_type: &FieldType,
    visiting: &mut Vec<String>,
) -> Result<Value, ConceptError> {
    let value = match field_type {
        FieldType::Text => json!(format!("dry run {field}")),
        FieldType::Number => json!(0),
        FieldType::Bool => json!(false),
        FieldType::Image => json!({ "url": format!("dry-run://{field}.png") }),
        FieldType::List(inner) => json!([synthesize_field(concepts, field, inner, visiting)?]),
        FieldType::Optional(inner) => synthesize_field(concepts, field, inner, visiting)?,
        FieldType::Record(class_name) => synthesize_record(concepts, class_name, visiting)?,
    };
    Ok(value)
}

#[derive(Debug)]
pub enum DryRunOutcome {
    Passed,
    Failed(PipelineError),
}

impl DryRunOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Per-pipe results of a library dry run, in library order
#[derive(Debug, Default)]
pub struct DryRunReport {
    outcomes: IndexMap<String, DryRunOutcome>,
    dangling: Vec<(String, String)>,
}

impl DryRunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, pipe_code: impl Into<String>, outcome: DryRunOutcome) {
        self.outcomes.insert(pipe_code.into(), outcome);
    }

    pub fn get(&self, pipe_code: &str) -> Option<&DryRunOutcome> {
        self.outcomes.get(pipe_code)
    }

    pub fn passed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_passed())
            .map(|(code, _)| code.as_str())
            .collect()
    }

    pub fn failed(&self) -> Vec<(&str, &PipelineError)> {
        self.outcomes
            .iter()
            .filter_map(|(code, outcome)| match outcome {
                DryRunOutcome::Failed(error) => Some((code.as_str(), error)),
                DryRunOutcome::Passed => None,
            })
            .collect()
    }

    /// Sub-pipe references that resolve to nothing, as (owner, missing)
    pub fn dangling_references(&self) -> &[(String, String)] {
        &self.dangling
    }

    pub fn is_success(&self) -> bool {
        self.dangling.is_empty() && self.outcomes.values().all(DryRunOutcome::is_passed)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Dry-run one pipe against inputs synthesized from its declared concepts
pub async fn dry_run_pipe(
    library: &Arc<Library>,
    pipe: Arc<Pipe>,
    config: &EngineConfig,
) -> Result<PipeOutput, PipelineError> {
    let memory = synthesize_inputs(&pipe, library.concepts(), config.dry_run_list_len)?;
    let router = PipeRouter::new(Arc::clone(library));
    let params = RunParams::from_config(config, RunMode::Dry);
    router.run(pipe, memory, params, None).await
}

/// Dry-run every pipe of the library, collecting failures instead of
/// stopping at the first one
pub async fn validate_dry_run(library: &Arc<Library>, config: &EngineConfig) -> DryRunReport {
    let mut report = DryRunReport::new();
    report.dangling = library.dangling_references();
    for (owner, missing) in &report.dangling {
        warn!("Pipe '{}' references undefined pipe '{}'", owner, missing);
    }
    for pipe in library.pipes().iter() {
        let code = pipe.code().to_string();
        match dry_run_pipe(library, Arc::clone(pipe), config).await {
            Ok(_) => {
                debug!("Dry run of '{}' passed", code);
                report.record(code, DryRunOutcome::Passed);
            }
            Err(error) => {
                warn!("Dry run of '{}' failed: {}", code, error);
                report.record(code, DryRunOutcome::Failed(error));
            }
        }
    }
    info!(
        "Dry run complete: {} passed, {} failed",
        report.passed().len(),
        report.failed().len()
    );
    report
}
