// PipeCondition - route to one pipe based on an evaluated expression

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::concept::NativeConcept;
use crate::error::{ConditionError, DryRunError, PipeDefinitionError, PipelineError, Result};
use crate::memory::{Stuff, WorkingMemory};
use crate::pipeline::core::{PipeOutput, PipeProduct, PipeSignature, RunPipe};
use crate::pipeline::params::RunParams;
use crate::pipeline::router::PipeRouter;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConditionExpression {
    /// Evaluated by the expression evaluator
    Expression(String),
    /// Rendered by the template renderer
    Template(String),
}

impl ConditionExpression {
    pub fn source(&self) -> &str {
        match self {
            Self::Expression(source) | Self::Template(source) => source,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PipeCondition {
    expression: ConditionExpression,
    pipe_map: IndexMap<String, String>,
    default_pipe_code: Option<String>,
    add_alias_from_expression_to: Option<String>,
}

impl PipeCondition {
    pub fn new(
        pipe_code: &str,
        expression: Option<String>,
        expression_template: Option<String>,
        pipe_map: IndexMap<String, String>,
        default_pipe_code: Option<String>,
    ) -> std::result::Result<Self, PipeDefinitionError> {
        let expression = match (expression, expression_template) {
            (Some(expression), None) => ConditionExpression::Expression(expression),
            (None, Some(template)) => ConditionExpression::Template(template),
            _ => {
                return Err(PipeDefinitionError::new(
                    pipe_code,
                    "exactly one of expression and expression_template must be set",
                ));
            }
        };
        if pipe_map.is_empty() && default_pipe_code.is_none() {
            return Err(PipeDefinitionError::new(
                pipe_code,
                "an empty pipe_map requires a default_pipe_code",
            ));
        }
        Ok(Self {
            expression,
            pipe_map,
            default_pipe_code,
            add_alias_from_expression_to: None,
        })
    }

    /// Also store the evaluated value as a text stuff under `name`
    pub fn with_alias_from_expression(mut self, name: impl Into<String>) -> Self {
        self.add_alias_from_expression_to = Some(name.into());
        self
    }

    pub fn expression(&self) -> &ConditionExpression {
        &self.expression
    }

    pub fn pipe_map(&self) -> &IndexMap<String, String> {
        &self.pipe_map
    }

    pub fn default_pipe_code(&self) -> Option<&str> {
        self.default_pipe_code.as_deref()
    }

    fn evaluate(&self, router: &PipeRouter, memory: &WorkingMemory) -> Result<String> {
        let context = memory.to_template_context();
        let collaborators = router.library().collaborators();
        let value = match &self.expression {
            ConditionExpression::Expression(expression) => collaborators
                .evaluator()?
                .evaluate(expression, &context)
                .map(|value| scalar_to_string(&value))?,
            ConditionExpression::Template(template) => {
                collaborators.renderer()?.render(template, &context)?
            }
        };
        Ok(value.trim().to_string())
    }

    /// Exact match, then the default. Dry runs fall back to the first mapped pipe.
    fn select(&self, pipe_code: &str, value: &str, params: &RunParams) -> Result<&str> {
        if let Some(selected) = self.pipe_map.get(value).or(self.default_pipe_code.as_ref()) {
            return Ok(selected.as_str());
        }
        match self.pipe_map.values().next() {
            Some(fallback) if params.is_dry() => {
                warn!(
                    "Condition '{}' matched nothing for '{}', dry run falls back to '{}'",
                    pipe_code, value, fallback
                );
                Ok(fallback.as_str())
            }
            _ => Err(ConditionError::NoMatch {
                pipe_code: pipe_code.to_string(),
                value: value.to_string(),
            }
            .into()),
        }
    }
}

#[async_trait]
impl RunPipe for PipeCondition {
    async fn run_pipe(
        &self,
        signature: &PipeSignature,
        router: &PipeRouter,
        memory: WorkingMemory,
        params: &RunParams,
        output_name: Option<&str>,
    ) -> Result<PipeProduct> {
        let value = self.evaluate(router, &memory).map_err(|error| {
            let message = error.to_string();
            if params.is_dry() {
                PipelineError::from(DryRunError::Evaluation {
                    pipe_code: signature.code.clone(),
                    expression: self.expression.source().to_string(),
                    message,
                })
            } else {
                PipelineError::from(ConditionError::Evaluation {
                    pipe_code: signature.code.clone(),
                    message,
                })
            }
        })?;
        debug!("Condition '{}' evaluated to '{}'", signature.code, value);
        if value.is_empty() && params.is_dry() {
            // non-fatal in dry runs, selection falls back below
            let tolerated = DryRunError::EmptyResult {
                pipe_code: signature.code.clone(),
            };
            warn!("{}", tolerated);
        }

        let mut memory = memory;
        if let Some(alias) = &self.add_alias_from_expression_to {
            let text = router.library().concepts().get_native(NativeConcept::Text);
            memory.add_new_stuff(alias.clone(), Stuff::text(alias.clone(), text, value.clone())?);
        }

        let selected = self.select(&signature.code, &value, params)?;
        let pipe = router.library().get_required_pipe(selected)?;
        let PipeOutput {
            working_memory,
            main_stuff,
        } = router
            .run(pipe, memory, params.clone(), output_name.map(str::to_string))
            .await?;
        Ok(PipeProduct {
            working_memory,
            stuff: main_stuff,
        })
    }

    fn sub_pipe_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.pipe_map.values().map(String::as_str).collect();
        if let Some(default) = &self.default_pipe_code {
            if !codes.contains(&default.as_str()) {
                codes.push(default);
            }
        }
        codes
    }
}

/// Scalar view of an evaluated expression
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
