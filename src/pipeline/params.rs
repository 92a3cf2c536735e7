//! Per-invocation run parameters and the run-wide pipe stack

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use super::multiplicity::Multiplicity;
use crate::config::EngineConfig;
use crate::error::{PipelineError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Live,
    Dry,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Dry => write!(f, "dry"),
        }
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "dry" | "dry_run" => Ok(Self::Dry),
            other => Err(format!("unknown run mode '{other}'")),
        }
    }
}

/// In-flight pipe codes of one run, shared by every branch of that run
#[derive(Clone, Debug, Default)]
pub struct PipeStack {
    frames: Arc<Mutex<Vec<String>>>,
}

impl PipeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `code`, failing when the depth would exceed `limit`.
    /// The returned frame pops the code when dropped.
    pub fn enter(&self, code: &str, limit: usize) -> Result<PipeStackFrame> {
        let mut frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        frames.push(code.to_string());
        if frames.len() > limit {
            let stack = frames.clone();
            frames.pop();
            return Err(PipelineError::PipeStackOverflow { limit, stack });
        }
        Ok(PipeStackFrame {
            stack: self.clone(),
            code: code.to_string(),
        })
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn depth(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn leave(&self, code: &str) {
        let mut frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        // concurrent branches interleave, so remove the latest frame for this code
        if let Some(position) = frames.iter().rposition(|frame| frame == code) {
            frames.remove(position);
        }
    }
}

/// Guard for one pipe on the stack
#[derive(Debug)]
pub struct PipeStackFrame {
    stack: PipeStack,
    code: String,
}

impl Drop for PipeStackFrame {
    fn drop(&mut self) {
        self.stack.leave(&self.code);
    }
}

#[derive(Clone, Debug)]
pub struct RunParams {
    pub run_mode: RunMode,
    pub pipe_stack: PipeStack,
    pub pipe_stack_limit: usize,
    pub output_multiplicity: Option<Multiplicity>,
    pub dry_run_list_len: usize,
}

impl RunParams {
    pub fn new(run_mode: RunMode) -> Self {
        Self::from_config(&EngineConfig::default(), run_mode)
    }

    pub fn from_config(config: &EngineConfig, run_mode: RunMode) -> Self {
        Self {
            run_mode,
            pipe_stack: PipeStack::new(),
            pipe_stack_limit: config.pipe_stack_limit,
            output_multiplicity: None,
            dry_run_list_len: config.dry_run_list_len,
        }
    }

    pub fn with_pipe_stack_limit(mut self, limit: usize) -> Self {
        self.pipe_stack_limit = limit;
        self
    }

    pub fn with_output_multiplicity(mut self, multiplicity: Option<Multiplicity>) -> Self {
        self.output_multiplicity = multiplicity;
        self
    }

    /// Params for a child pipe: same mode and shared stack, the child's own
    /// multiplicity override instead of ours.
    pub fn for_sub_pipe(&self, multiplicity: Option<Multiplicity>) -> Self {
        Self {
            output_multiplicity: multiplicity,
            ..self.clone()
        }
    }

    pub fn is_dry(&self) -> bool {
        self.run_mode == RunMode::Dry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_parse_and_display() {
        assert_eq!("DRY".parse::<RunMode>(), Ok(RunMode::Dry));
        assert_eq!("live".parse::<RunMode>(), Ok(RunMode::Live));
        assert!("fast".parse::<RunMode>().is_err());
        assert_eq!(RunMode::Dry.to_string(), "dry");
    }

    #[test]
    fn test_frames_pop_on_drop() {
        let stack = PipeStack::new();
        {
            let _outer = stack.enter("outer", 5).unwrap();
            let _inner = stack.enter("inner", 5).unwrap();
            assert_eq!(stack.snapshot(), vec!["outer", "inner"]);
        }
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_overflow_reports_full_stack() {
        let stack = PipeStack::new();
        let _a = stack.enter("a", 2).unwrap();
        let _b = stack.enter("b", 2).unwrap();
        match stack.enter("c", 2) {
            Err(PipelineError::PipeStackOverflow { limit, stack: frames }) => {
                assert_eq!(limit, 2);
                assert_eq!(frames, vec!["a", "b", "c"]);
            }
            other => panic!("expected overflow, got {other:?}"),
        }
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_sub_pipe_params_share_stack() {
        let params = RunParams::new(RunMode::Dry)
            .with_output_multiplicity(Some(Multiplicity::Count(3)));
        let child = params.for_sub_pipe(None);
        assert_eq!(child.output_multiplicity, None);
        assert!(child.is_dry());
        let _frame = child.pipe_stack.enter("x", 3).unwrap();
        assert_eq!(params.pipe_stack.depth(), 1);
    }
}
