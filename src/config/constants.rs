//! Constants for pipeweave

/// Reserved alias pointing at the latest result of a run
pub const MAIN_STUFF_NAME: &str = "main_stuff";

/// Domain holding the built-in concepts
pub const NATIVE_DOMAIN: &str = "native";

/// Maximum nesting of in-flight pipes for one run
pub const DEFAULT_PIPE_STACK_LIMIT: usize = 20;

/// Number of items fabricated for list outputs during a dry run
pub const DRY_RUN_LIST_LEN: usize = 3;

/// Environment variable overriding the pipe stack limit
pub const PIPE_STACK_LIMIT_ENV: &str = "PIPEWEAVE_PIPE_STACK_LIMIT";

/// Environment variable selecting the default run mode ("live" or "dry")
pub const RUN_MODE_ENV: &str = "PIPEWEAVE_RUN_MODE";
