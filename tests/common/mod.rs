// Shared collaborator doubles for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use pipeweave::collaborator::{
    ContentGenerator, ExpressionEvaluator, GenerationJob, TemplateRenderer,
};
use pipeweave::content::StuffContent;
use pipeweave::error::CollaboratorError;
use pipeweave::memory::Stuff;
use pipeweave::pipeline::{BundleBlueprint, Library, LibraryBuilder};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::{Arc, Mutex};

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(context, |value, key| match key.parse::<usize>() {
        Ok(index) => value.get(index),
        Err(_) => value.get(key),
    })
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitutes `{{ dotted.path }}` from the context
pub struct MiniRenderer;

impl TemplateRenderer for MiniRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, CollaboratorError> {
        let placeholder = Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").unwrap();
        let mut missing = None;
        let rendered = placeholder.replace_all(template, |caps: &Captures| {
            match lookup(context, &caps[1]) {
                Some(value) => scalar(value),
                None => {
                    missing.get_or_insert_with(|| caps[1].to_string());
                    String::new()
                }
            }
        });
        match missing {
            Some(path) => Err(CollaboratorError::render(format!("undefined '{path}'"))),
            None => Ok(rendered.into_owned()),
        }
    }
}

/// Evaluates `path` or `path|length > N`
pub struct MiniEvaluator;

impl ExpressionEvaluator for MiniEvaluator {
    fn evaluate(&self, expression: &str, context: &Value) -> Result<Value, CollaboratorError> {
        let (operand, threshold) = match expression.split_once('>') {
            Some((operand, threshold)) => {
                let threshold = threshold
                    .trim()
                    .parse::<usize>()
                    .map_err(|e| CollaboratorError::evaluation(e.to_string()))?;
                (operand.trim(), Some(threshold))
            }
            None => (expression.trim(), None),
        };
        let (path, length) = match operand.strip_suffix("|length") {
            Some(path) => (path, true),
            None => (operand, false),
        };
        let value = lookup(context, path)
            .ok_or_else(|| CollaboratorError::evaluation(format!("undefined '{path}'")))?;
        let value = if length {
            Value::from(scalar(value).chars().count())
        } else {
            value.clone()
        };
        match threshold {
            Some(threshold) => {
                let number = value
                    .as_u64()
                    .ok_or_else(|| CollaboratorError::evaluation("not a number"))?;
                Ok(Value::Bool(number as usize > threshold))
            }
            None => Ok(value),
        }
    }
}

type Respond = dyn Fn(&GenerationJob) -> Result<StuffContent, CollaboratorError> + Send + Sync;

/// Answers every job with a scripted response and records the jobs it saw
pub struct ScriptedGenerator {
    respond: Box<Respond>,
    jobs: Mutex<Vec<GenerationJob>>,
}

impl ScriptedGenerator {
    pub fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&GenerationJob) -> Result<StuffContent, CollaboratorError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            respond: Box::new(respond),
            jobs: Mutex::new(Vec::new()),
        })
    }

    pub fn jobs(&self) -> Vec<GenerationJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(&self, job: GenerationJob) -> Result<StuffContent, CollaboratorError> {
        self.jobs.lock().unwrap().push(job.clone());
        (self.respond)(&job)
    }
}

fn text_input(inputs: &IndexMap<String, Stuff>, name: &str) -> Result<String, CollaboratorError> {
    inputs
        .get(name)
        .and_then(|stuff| stuff.as_text())
        .map(str::to_string)
        .ok_or_else(|| CollaboratorError::function(name, "missing text input"))
}

/// Builder with the mini renderer and evaluator plus a few text functions
pub fn builder() -> LibraryBuilder {
    LibraryBuilder::new()
        .with_renderer(Arc::new(MiniRenderer))
        .with_evaluator(Arc::new(MiniEvaluator))
        .with_function("capitalize", |inputs: &IndexMap<String, Stuff>| {
            Ok(StuffContent::text(text_input(inputs, "input_text")?.to_uppercase()))
        })
        .with_function("lowercase", |inputs: &IndexMap<String, Stuff>| {
            Ok(StuffContent::text(text_input(inputs, "input_text")?.to_lowercase()))
        })
        .with_function("shout_line", |inputs: &IndexMap<String, Stuff>| {
            Ok(StuffContent::text(format!("{}!", text_input(inputs, "line")?.to_uppercase())))
        })
        .with_function("count_chars", |inputs: &IndexMap<String, Stuff>| {
            let text = text_input(inputs, "input_text")?;
            Ok(StuffContent::number(text.chars().count() as f64))
        })
        .with_function("explode", |_: &IndexMap<String, Stuff>| {
            Err(CollaboratorError::function("explode", "boom"))
        })
}

pub fn load(builder: LibraryBuilder, bundle: Value) -> Arc<Library> {
    let bundle: BundleBlueprint = serde_json::from_value(bundle).unwrap();
    builder.load_bundle(&bundle).unwrap().build()
}
