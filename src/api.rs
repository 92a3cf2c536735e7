// Stable API facade: run pipes of a loaded library

use std::sync::Arc;
use tracing::info;

use crate::config::EngineConfig;
use crate::content::StuffContent;
use crate::dry_run::{self, DryRunReport};
use crate::error::{ConceptError, Result};
use crate::memory::{Stuff, WorkingMemory};
use crate::pipeline::{Library, PipeOutput, PipeRouter, RunMode, RunParams};

/// Entry point for callers: a library plus the engine configuration
#[derive(Clone, Debug)]
pub struct Engine {
    library: Arc<Library>,
    config: EngineConfig,
    router: PipeRouter,
}

impl Engine {
    pub fn new(library: Arc<Library>) -> Self {
        Self::with_config(library, EngineConfig::default())
    }

    pub fn with_config(library: Arc<Library>, config: EngineConfig) -> Self {
        let router = PipeRouter::new(Arc::clone(&library));
        Self {
            library,
            config,
            router,
        }
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build an input stuff of the referenced concept
    pub fn make_stuff(
        &self,
        name: impl Into<String>,
        concept_ref: &str,
        content: StuffContent,
    ) -> std::result::Result<Stuff, ConceptError> {
        self.library.make_stuff(name, concept_ref, content)
    }

    /// Run `pipe_code` on a fresh memory seeded with `inputs`. Without an
    /// explicit mode the configured default applies.
    pub async fn run<I>(
        &self,
        pipe_code: &str,
        inputs: I,
        run_mode: Option<RunMode>,
    ) -> Result<PipeOutput>
    where
        I: IntoIterator<Item = Stuff>,
    {
        let run_mode = run_mode.unwrap_or(self.config.default_run_mode);
        let memory = WorkingMemory::from_stuffs(inputs);
        info!("Running pipe '{}' ({} mode)", pipe_code, run_mode);
        self.run_with_memory(pipe_code, memory, RunParams::from_config(&self.config, run_mode))
            .await
    }

    pub async fn run_with_memory(
        &self,
        pipe_code: &str,
        memory: WorkingMemory,
        params: RunParams,
    ) -> Result<PipeOutput> {
        self.router.run_code(pipe_code, memory, params, None).await
    }

    /// Dry-run one pipe against synthesized inputs
    pub async fn dry_run_pipe(&self, pipe_code: &str) -> Result<PipeOutput> {
        let pipe = self.library.get_required_pipe(pipe_code)?;
        dry_run::dry_run_pipe(&self.library, pipe, &self.config).await
    }

    /// Dry-run every pipe of the library
    pub async fn validate_dry_run(&self) -> DryRunReport {
        dry_run::validate_dry_run(&self.library, &self.config).await
    }
}
