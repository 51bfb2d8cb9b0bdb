//! Generation pipeline: backend descriptions, asset swapping, and the stage
//! runner that drives external generation programs as subprocesses.

pub mod backend;
pub mod error;
pub mod runner;
pub mod swap;

pub use backend::{BackendSpec, PromptStyle};
pub use error::{PipelineError, Result};
pub use runner::{
    build_invocation, motion_segments, reconcile_durations, render_invocation, run_process,
    run_stage, StageInvocation, StageOutcome, DEFAULT_SEGMENT_DURATION, FALLBACK_DURATION,
};
