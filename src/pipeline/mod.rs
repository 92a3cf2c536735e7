//! Pipes, their router and the library they are loaded into

pub mod blueprint;
pub mod controllers;
pub mod core;
pub mod input;
pub mod library;
pub mod multiplicity;
pub mod operators;
pub mod params;
pub mod router;
pub mod sub_pipe;

pub use blueprint::{
    BundleBlueprint, InputBlueprint, PipeBlueprint, PipeKindBlueprint, SubPipeBlueprint,
};
pub use controllers::{PipeBatch, PipeCondition, PipeParallel, PipeSequence};
pub use self::core::{Pipe, PipeKind, PipeOutput, PipeProduct, PipeSignature, RunPipe};
pub use input::{InputRequirement, PipeInputs};
pub use library::{Library, LibraryBuilder, PipeLibrary};
pub use multiplicity::{Multiplicity, MultiplicityResolution, resolve_multiplicity};
pub use operators::{PipeCompose, PipeExtract, PipeFunc, PipeImgGen, PipeLlm};
pub use params::{PipeStack, RunMode, RunParams};
pub use router::{PipeRouter, PipeRun};
pub use sub_pipe::{BatchParams, SubPipe};
