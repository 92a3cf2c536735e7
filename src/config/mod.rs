/// Engine configuration
pub mod constants;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::pipeline::RunMode;
use constants::{
    DEFAULT_PIPE_STACK_LIMIT, DRY_RUN_LIST_LEN, PIPE_STACK_LIMIT_ENV, RUN_MODE_ENV,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pipe_stack_limit: usize,
    pub dry_run_list_len: usize,
    pub default_run_mode: RunMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pipe_stack_limit: DEFAULT_PIPE_STACK_LIMIT,
            dry_run_list_len: DRY_RUN_LIST_LEN,
            default_run_mode: RunMode::Live,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `PIPEWEAVE_*` environment variables.
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(PIPE_STACK_LIMIT_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(limit) => config.pipe_stack_limit = limit,
                Err(_) => warn!("Ignoring invalid {}: '{}'", PIPE_STACK_LIMIT_ENV, raw),
            }
        }
        if let Ok(raw) = std::env::var(RUN_MODE_ENV) {
            match raw.trim().parse::<RunMode>() {
                Ok(mode) => config.default_run_mode = mode,
                Err(_) => warn!("Ignoring invalid {}: '{}'", RUN_MODE_ENV, raw),
            }
        }
        config
    }

    pub fn with_pipe_stack_limit(mut self, limit: usize) -> Self {
        self.pipe_stack_limit = limit;
        self
    }

    pub fn with_dry_run_list_len(mut self, len: usize) -> Self {
        self.dry_run_list_len = len;
        self
    }

    pub fn with_default_run_mode(mut self, mode: RunMode) -> Self {
        self.default_run_mode = mode;
        self
    }
}
