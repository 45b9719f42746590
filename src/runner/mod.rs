//! Step invocation.

pub mod invoke;
pub mod pipeline;

pub use invoke::{BuildContext, InvocationOutcome, InvocationState, Invoker};
pub use pipeline::{run_steps, PipelineResult, RunProgress, StepOutcome};
