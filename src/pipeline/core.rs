// Pipe core - signature, variants and the run contract

use async_trait::async_trait;
use std::sync::Arc;

use super::controllers::{PipeBatch, PipeCondition, PipeParallel, PipeSequence};
use super::input::PipeInputs;
use super::multiplicity::Multiplicity;
use super::operators::{PipeCompose, PipeExtract, PipeFunc, PipeImgGen, PipeLlm};
use super::params::RunParams;
use super::router::PipeRouter;
use crate::concept::Concept;
use crate::error::Result;
use crate::memory::{Stuff, WorkingMemory};

/// Attributes shared by every pipe variant
#[derive(Clone, Debug, PartialEq)]
pub struct PipeSignature {
    pub domain: String,
    pub code: String,
    pub definition: String,
    pub inputs: PipeInputs,
    pub output: Arc<Concept>,
    pub output_multiplicity: Option<Multiplicity>,
}

impl PipeSignature {
    pub fn new(
        domain: impl Into<String>,
        code: impl Into<String>,
        inputs: PipeInputs,
        output: Arc<Concept>,
    ) -> Self {
        Self {
            domain: domain.into(),
            code: code.into(),
            definition: String::new(),
            inputs,
            output,
            output_multiplicity: None,
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn with_output_multiplicity(mut self, multiplicity: Option<Multiplicity>) -> Self {
        self.output_multiplicity = multiplicity;
        self
    }

    /// Name for the stuff this pipe produces: the requested output name,
    /// else the output concept code in snake_case
    pub fn output_stuff_name(&self, output_name: Option<&str>) -> String {
        output_name
            .map(str::to_string)
            .unwrap_or_else(|| to_snake_case(&self.output.code))
    }
}

/// What a pipe hands back to its router: the memory and the produced stuff
#[derive(Clone, Debug)]
pub struct PipeProduct {
    pub working_memory: WorkingMemory,
    pub stuff: Stuff,
}

/// Result of a routed run: the memory with the output stored as main stuff
#[derive(Clone, Debug)]
pub struct PipeOutput {
    pub working_memory: WorkingMemory,
    pub main_stuff: Stuff,
}

/// Behaviour of one pipe variant
#[async_trait]
pub trait RunPipe: Send + Sync {
    async fn run_pipe(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: WorkingMemory,
        params: &RunParams,
        output_name: Option<&str>,
    ) -> Result<PipeProduct>;

    /// Codes of the pipes this variant delegates to
    fn sub_pipe_codes(&self) -> Vec<&str> {
        Vec::new()
    }
}

#[derive(Clone, Debug)]
pub enum PipeKind {
    Sequence(PipeSequence),
    Parallel(PipeParallel),
    Condition(PipeCondition),
    Batch(PipeBatch),
    Llm(PipeLlm),
    ImgGen(PipeImgGen),
    Extract(PipeExtract),
    Func(PipeFunc),
    Compose(PipeCompose),
}

impl PipeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Sequence(_) => "PipeSequence",
            Self::Parallel(_) => "PipeParallel",
            Self::Condition(_) => "PipeCondition",
            Self::Batch(_) => "PipeBatch",
            Self::Llm(_) => "PipeLLM",
            Self::ImgGen(_) => "PipeImgGen",
            Self::Extract(_) => "PipeExtract",
            Self::Func(_) => "PipeFunc",
            Self::Compose(_) => "PipeCompose",
        }
    }

    fn runner(&self) -> &dyn RunPipe {
        match self {
            Self::Sequence(pipe) => pipe,
            Self::Parallel(pipe) => pipe,
            Self::Condition(pipe) => pipe,
            Self::Batch(pipe) => pipe,
            Self::Llm(pipe) => pipe,
            Self::ImgGen(pipe) => pipe,
            Self::Extract(pipe) => pipe,
            Self::Func(pipe) => pipe,
            Self::Compose(pipe) => pipe,
        }
    }
}

/// A pipe: shared signature plus its variant
#[derive(Clone, Debug)]
pub struct Pipe {
    pub signature: PipeSignature,
    pub kind: PipeKind,
}

impl Pipe {
    pub fn new(signature: PipeSignature, kind: PipeKind) -> Self {
        Self { signature, kind }
    }

    pub fn code(&self) -> &str {
        &self.signature.code
    }

    pub fn domain(&self) -> &str {
        &self.signature.domain
    }

    pub fn inputs(&self) -> &PipeInputs {
        &self.signature.inputs
    }

    pub fn output(&self) -> &Arc<Concept> {
        &self.signature.output
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn sub_pipe_codes(&self) -> Vec<&str> {
        self.kind.runner().sub_pipe_codes()
    }

    /// Inputs that must hold list content
    pub fn list_input_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .signature
            .inputs
            .iter()
            .filter(|(_, requirement)| requirement.is_list())
            .map(|(name, _)| name)
            .collect();
        if let PipeKind::Batch(batch) = &self.kind {
            if !names.contains(&batch.input_list_name()) {
                names.push(batch.input_list_name());
            }
        }
        names
    }

    pub async fn run_pipe(
        &self,
        router: &PipeRouter,
        memory: WorkingMemory,
        params: &RunParams,
        output_name: Option<&str>,
    ) -> Result<PipeProduct> {
        self.kind
            .runner()
            .run_pipe(&self.signature, router, memory, params, output_name)
            .await
    }
}

pub(crate) fn to_snake_case(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut snake = String::with_capacity(code.len() + 4);
    for (index, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = index.checked_sub(1).and_then(|i| chars.get(i));
            let next = chars.get(index + 1);
            let starts_word = match prev {
                None => false,
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                Some(_) => false,
            };
            if starts_word {
                snake.push('_');
            }
            snake.push(c.to_ascii_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("Text"), "text");
        assert_eq!(to_snake_case("TextAndImages"), "text_and_images");
        assert_eq!(to_snake_case("PDF"), "pdf");
        assert_eq!(to_snake_case("HTMLPage"), "html_page");
        assert_eq!(to_snake_case("Page2Text"), "page2_text");
    }
}
