// Library - the loaded concepts, pipes and collaborators of one bundle set

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::blueprint::BundleBlueprint;
use super::core::Pipe;
use crate::collaborator::{
    Collaborators, ContentGenerator, ExpressionEvaluator, FuncRegistry, TemplateRenderer,
};
use crate::concept::{Concept, ConceptLibrary, StructureClass};
use crate::content::StuffContent;
use crate::error::{CollaboratorError, ConceptError, PipeDefinitionError, PipelineError, Result};
use crate::memory::Stuff;

/// Registry of pipes by code
#[derive(Clone, Debug, Default)]
pub struct PipeLibrary {
    pipes: IndexMap<String, Arc<Pipe>>,
}

impl PipeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pipe: Pipe) -> std::result::Result<(), PipeDefinitionError> {
        if self.pipes.contains_key(pipe.code()) {
            return Err(PipeDefinitionError::new(
                pipe.code(),
                "a pipe with this code is already defined",
            ));
        }
        debug!("Registering {} '{}'", pipe.type_name(), pipe.code());
        self.pipes.insert(pipe.code().to_string(), Arc::new(pipe));
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<Arc<Pipe>> {
        self.pipes.get(code).cloned()
    }

    pub fn get_required(&self, code: &str) -> Result<Arc<Pipe>> {
        self.get(code)
            .ok_or_else(|| PipelineError::pipe_not_found(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.pipes.contains_key(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Pipe>> {
        self.pipes.values()
    }

    pub fn codes(&self) -> Vec<String> {
        self.pipes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Library {
    concepts: ConceptLibrary,
    pipes: PipeLibrary,
    collaborators: Collaborators,
}

impl Library {
    pub fn builder() -> LibraryBuilder {
        LibraryBuilder::new()
    }

    pub fn concepts(&self) -> &ConceptLibrary {
        &self.concepts
    }

    pub fn pipes(&self) -> &PipeLibrary {
        &self.pipes
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn get_required_pipe(&self, code: &str) -> Result<Arc<Pipe>> {
        self.pipes.get_required(code)
    }

    pub fn get_required_concept(
        &self,
        concept_ref: &str,
    ) -> std::result::Result<Arc<Concept>, ConceptError> {
        self.concepts.get_required(concept_ref)
    }

    /// Build a stuff of the referenced concept
    pub fn make_stuff(
        &self,
        name: impl Into<String>,
        concept_ref: &str,
        content: StuffContent,
    ) -> std::result::Result<Stuff, ConceptError> {
        let concept = self.concepts.get_required(concept_ref)?;
        Stuff::new(name, concept, content)
    }

    /// Sub-pipe references that do not resolve to a pipe, as (owner, missing)
    pub fn dangling_references(&self) -> Vec<(String, String)> {
        self.pipes
            .iter()
            .flat_map(|pipe| {
                pipe.sub_pipe_codes()
                    .into_iter()
                    .filter(|code| !self.pipes.contains(code))
                    .map(|code| (pipe.code().to_string(), code.to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Builder collecting collaborators and bundles into a shared library
#[derive(Default)]
pub struct LibraryBuilder {
    concepts: ConceptLibrary,
    pipes: PipeLibrary,
    generator: Option<Arc<dyn ContentGenerator>>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
    evaluator: Option<Arc<dyn ExpressionEvaluator>>,
    functions: FuncRegistry,
}

impl LibraryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generator(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Register a function callable by `PipeFunc`
    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&IndexMap<String, Stuff>) -> std::result::Result<StuffContent, CollaboratorError>
            + Send
            + Sync
            + 'static,
    {
        self.functions.register(name, function);
        self
    }

    pub fn with_structure(mut self, class: StructureClass) -> Self {
        self.concepts.register_structure(class);
        self
    }

    pub fn with_concept(mut self, concept: Concept) -> Result<Self> {
        self.concepts.add(concept)?;
        Ok(self)
    }

    /// Concept library as loaded so far, for building pipes by hand
    pub fn concepts(&self) -> &ConceptLibrary {
        &self.concepts
    }

    pub fn add_pipe(mut self, pipe: Pipe) -> Result<Self> {
        self.pipes.add(pipe)?;
        Ok(self)
    }

    /// Load a bundle: its concepts first, then its pipes, validating eagerly.
    /// Sub-pipe references stay unresolved until run time.
    pub fn load_bundle(mut self, bundle: &BundleBlueprint) -> Result<Self> {
        let concepts = self
            .concepts
            .load_blueprints(&bundle.domain, &bundle.concepts)?;
        for (code, blueprint) in &bundle.pipes {
            let pipe = blueprint.build(&bundle.domain, code, &self.concepts)?;
            self.pipes.add(pipe)?;
        }
        info!(
            "Loaded bundle '{}': {} concepts, {} pipes",
            bundle.domain,
            concepts.len(),
            bundle.pipes.len()
        );
        Ok(self)
    }

    pub fn build(self) -> Arc<Library> {
        Arc::new(Library {
            concepts: self.concepts,
            pipes: self.pipes,
            collaborators: Collaborators {
                generator: self.generator,
                renderer: self.renderer,
                evaluator: self.evaluator,
                functions: self.functions,
            },
        })
    }
}
