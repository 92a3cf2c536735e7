// Declarative bundle and pipe definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::controllers::{PipeBatch, PipeCondition, PipeParallel, PipeSequence};
use super::core::{Pipe, PipeKind, PipeSignature};
use super::input::{InputRequirement, PipeInputs};
use super::multiplicity::Multiplicity;
use super::operators::{PipeCompose, PipeExtract, PipeFunc, PipeImgGen, PipeLlm};
use super::sub_pipe::SubPipe;
use crate::concept::{Concept, ConceptBlueprint, ConceptLibrary};
use crate::error::{PipeDefinitionError, Result};

/// One domain's concepts and pipes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BundleBlueprint {
    pub domain: String,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub concepts: IndexMap<String, ConceptBlueprint>,
    #[serde(default)]
    pub pipes: IndexMap<String, PipeBlueprint>,
}

impl BundleBlueprint {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// A declared input: a bare concept reference or one with multiplicity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputBlueprint {
    Concept(String),
    Full {
        concept: String,
        #[serde(default)]
        multiplicity: Option<Multiplicity>,
    },
}

impl InputBlueprint {
    pub fn concept_ref(&self) -> &str {
        match self {
            Self::Concept(concept) | Self::Full { concept, .. } => concept,
        }
    }

    pub fn multiplicity(&self) -> Option<Multiplicity> {
        match self {
            Self::Concept(_) => None,
            Self::Full { multiplicity, .. } => *multiplicity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipeBlueprint {
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub inputs: IndexMap<String, InputBlueprint>,
    pub output: String,
    #[serde(default)]
    pub nb_output: Option<u32>,
    #[serde(default)]
    pub multiple_output: Option<bool>,
    #[serde(flatten)]
    pub kind: PipeKindBlueprint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipeKindBlueprint {
    #[serde(rename = "PipeSequence")]
    Sequence { steps: Vec<SubPipeBlueprint> },
    #[serde(rename = "PipeParallel")]
    Parallel {
        parallels: Vec<SubPipeBlueprint>,
        #[serde(default)]
        add_each_output: Option<bool>,
        #[serde(default)]
        combined_output: Option<String>,
    },
    #[serde(rename = "PipeCondition")]
    Condition {
        #[serde(default)]
        expression: Option<String>,
        #[serde(default)]
        expression_template: Option<String>,
        #[serde(default)]
        pipe_map: IndexMap<String, String>,
        #[serde(default)]
        default_pipe_code: Option<String>,
        #[serde(default)]
        add_alias_from_expression_to: Option<String>,
    },
    #[serde(rename = "PipeBatch")]
    Batch {
        branch_pipe_code: String,
        #[serde(default)]
        input_list_name: Option<String>,
        input_item_name: String,
    },
    #[serde(rename = "PipeLLM")]
    Llm {
        prompt_template: String,
        #[serde(default)]
        system_prompt: Option<String>,
    },
    #[serde(rename = "PipeImgGen")]
    ImgGen {
        #[serde(default)]
        prompt_template: Option<String>,
    },
    #[serde(rename = "PipeExtract")]
    Extract {
        #[serde(default)]
        page_views: bool,
    },
    #[serde(rename = "PipeFunc")]
    Func { function_name: String },
    #[serde(rename = "PipeCompose")]
    Compose { template: String },
}

/// A controller step or branch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubPipeBlueprint {
    pub pipe: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub nb_output: Option<u32>,
    #[serde(default)]
    pub multiple_output: Option<bool>,
    #[serde(default)]
    pub batch_over: Option<String>,
    #[serde(default)]
    pub batch_as: Option<String>,
}

impl SubPipeBlueprint {
    fn build(&self, owner: &str) -> std::result::Result<SubPipe, PipeDefinitionError> {
        let multiplicity = Multiplicity::from_fields(self.nb_output, self.multiple_output)
            .map_err(|message| {
                PipeDefinitionError::new(owner, format!("step '{}': {message}", self.pipe))
            })?;
        let mut sub_pipe = SubPipe::new(&self.pipe).with_multiplicity(multiplicity);
        if let Some(result) = &self.result {
            sub_pipe = sub_pipe.with_result(result);
        }
        match (&self.batch_over, &self.batch_as) {
            (Some(list), Some(item)) => Ok(sub_pipe.with_batch(list, item)),
            (None, None) => Ok(sub_pipe),
            _ => Err(PipeDefinitionError::new(
                owner,
                format!("step '{}' must set both batch_over and batch_as", self.pipe),
            )),
        }
    }
}

impl PipeBlueprint {
    /// Build the pipe `code` of `domain`, resolving concept references eagerly
    pub fn build(&self, domain: &str, code: &str, concepts: &ConceptLibrary) -> Result<Pipe> {
        let mut inputs = PipeInputs::new();
        for (name, input) in &self.inputs {
            let concept = concepts.get_required_in_domain(input.concept_ref(), domain)?;
            inputs.insert(
                name.clone(),
                InputRequirement {
                    concept,
                    multiplicity: input.multiplicity(),
                },
            );
        }
        let output = concepts.get_required_in_domain(&self.output, domain)?;
        let multiplicity = Multiplicity::from_fields(self.nb_output, self.multiple_output)
            .map_err(|message| PipeDefinitionError::new(code, message))?;

        let kind = self.kind.build(code, domain, &inputs, &output, concepts)?;
        let signature = PipeSignature::new(domain, code, inputs, output)
            .with_definition(self.definition.clone())
            .with_output_multiplicity(multiplicity);
        Ok(Pipe::new(signature, kind))
    }
}

impl PipeKindBlueprint {
    fn build(
        &self,
        code: &str,
        domain: &str,
        inputs: &PipeInputs,
        output: &Arc<Concept>,
        concepts: &ConceptLibrary,
    ) -> Result<PipeKind> {
        let sub_pipes = |blueprints: &[SubPipeBlueprint]| {
            blueprints
                .iter()
                .map(|blueprint| blueprint.build(code))
                .collect::<std::result::Result<Vec<_>, _>>()
        };
        let kind = match self {
            Self::Sequence { steps } => {
                PipeKind::Sequence(PipeSequence::new(code, sub_pipes(steps)?)?)
            }
            Self::Parallel {
                parallels,
                add_each_output,
                combined_output,
            } => {
                let combined_output = combined_output
                    .as_deref()
                    .map(|concept_ref| concepts.get_required_in_domain(concept_ref, domain))
                    .transpose()?;
                PipeKind::Parallel(PipeParallel::new(
                    code,
                    sub_pipes(parallels)?,
                    *add_each_output,
                    combined_output,
                )?)
            }
            Self::Condition {
                expression,
                expression_template,
                pipe_map,
                default_pipe_code,
                add_alias_from_expression_to,
            } => {
                let mut condition = PipeCondition::new(
                    code,
                    expression.clone(),
                    expression_template.clone(),
                    pipe_map.clone(),
                    default_pipe_code.clone(),
                )?;
                if let Some(alias) = add_alias_from_expression_to {
                    condition = condition.with_alias_from_expression(alias);
                }
                PipeKind::Condition(condition)
            }
            Self::Batch {
                branch_pipe_code,
                input_list_name,
                input_item_name,
            } => PipeKind::Batch(PipeBatch::new(
                code,
                inputs,
                branch_pipe_code,
                input_list_name.clone(),
                input_item_name,
            )?),
            Self::Llm {
                prompt_template,
                system_prompt,
            } => PipeKind::Llm(PipeLlm::new(code, prompt_template, system_prompt.clone())?),
            Self::ImgGen { prompt_template } => PipeKind::ImgGen(PipeImgGen::new(
                code,
                inputs,
                output,
                prompt_template.clone(),
            )?),
            Self::Extract { page_views } => {
                PipeKind::Extract(PipeExtract::new(code, inputs, output, *page_views)?)
            }
            Self::Func { function_name } => PipeKind::Func(PipeFunc::new(code, function_name)?),
            Self::Compose { template } => {
                PipeKind::Compose(PipeCompose::new(code, output, template)?)
            }
        };
        Ok(kind)
    }
}
