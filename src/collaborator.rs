//! External collaborators consumed by operators and controllers

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::content::{ImageContent, StuffContent};
use crate::error::CollaboratorError;
use crate::memory::Stuff;

/// Request for text or structured-object generation
#[derive(Clone, Debug, PartialEq)]
pub struct LlmJob {
    pub pipe_code: String,
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub images: Vec<ImageContent>,
    /// Structure class of each generated item
    pub output_class: String,
    pub output_concept: String,
    pub multiple_outputs: bool,
    pub nb_outputs: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImgGenJob {
    pub pipe_code: String,
    pub prompt: String,
    pub nb_images: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtractJob {
    pub pipe_code: String,
    /// Image or PDF to extract pages from
    pub document: StuffContent,
    pub page_views: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GenerationJob {
    Text(LlmJob),
    Object(LlmJob),
    Image(ImgGenJob),
    Extract(ExtractJob),
}

impl GenerationJob {
    pub fn pipe_code(&self) -> &str {
        match self {
            Self::Text(job) | Self::Object(job) => &job.pipe_code,
            Self::Image(job) => &job.pipe_code,
            Self::Extract(job) => &job.pipe_code,
        }
    }
}

/// Vendor-agnostic content generation backend
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, job: GenerationJob) -> Result<StuffContent, CollaboratorError>;
}

pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<String, CollaboratorError>;
}

pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, context: &Value) -> Result<Value, CollaboratorError>;
}

/// A raw function called by `PipeFunc` with the pipe's declared input stuffs
pub type PipeFunction =
    Arc<dyn Fn(&IndexMap<String, Stuff>) -> Result<StuffContent, CollaboratorError> + Send + Sync>;

/// Registry for functions callable from pipes
#[derive(Clone, Default)]
pub struct FuncRegistry {
    functions: HashMap<String, PipeFunction>,
}

impl FuncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under a name
    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&IndexMap<String, Stuff>) -> Result<StuffContent, CollaboratorError>
            + Send
            + Sync
            + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<PipeFunction> {
        self.functions.get(name).cloned()
    }

    pub fn get_required(&self, name: &str) -> Result<PipeFunction, CollaboratorError> {
        self.get(name)
            .ok_or_else(|| CollaboratorError::FunctionNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn list_functions(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FuncRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncRegistry")
            .field("functions", &self.list_functions())
            .finish()
    }
}

/// Every collaborator a library may call into
#[derive(Clone, Default)]
pub struct Collaborators {
    pub generator: Option<Arc<dyn ContentGenerator>>,
    pub renderer: Option<Arc<dyn TemplateRenderer>>,
    pub evaluator: Option<Arc<dyn ExpressionEvaluator>>,
    pub functions: FuncRegistry,
}

impl Collaborators {
    pub fn generator(&self) -> Result<&dyn ContentGenerator, CollaboratorError> {
        self.generator
            .as_deref()
            .ok_or(CollaboratorError::Unavailable("content generator"))
    }

    pub fn renderer(&self) -> Result<&dyn TemplateRenderer, CollaboratorError> {
        self.renderer
            .as_deref()
            .ok_or(CollaboratorError::Unavailable("template renderer"))
    }

    pub fn evaluator(&self) -> Result<&dyn ExpressionEvaluator, CollaboratorError> {
        self.evaluator
            .as_deref()
            .ok_or(CollaboratorError::Unavailable("expression evaluator"))
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("generator", &self.generator.is_some())
            .field("renderer", &self.renderer.is_some())
            .field("evaluator", &self.evaluator.is_some())
            .field("functions", &self.functions)
            .finish()
    }
}
