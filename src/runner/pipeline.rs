//! Running configured steps in order.

use std::time::{Duration, Instant};

use super::invoke::{BuildContext, Invoker};
use crate::steps::{StepConfig, StepContext, TokenBuilder};

/// Progress events emitted while steps run.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// A step is about to start.
    StepStarting {
        kind: &'a str,
        index: usize,
        total: usize,
    },
    /// A step finished.
    StepFinished { kind: &'a str, success: bool },
}

/// Result of one step in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Position in the configured list.
    pub index: usize,
    /// Step type, e.g. `build`.
    pub kind: String,
    pub success: bool,
}

/// Result of running a list of steps.
#[derive(Debug)]
pub struct PipelineResult {
    /// Steps that ran, in order.
    pub steps: Vec<StepOutcome>,
    /// Steps never started because an earlier one failed.
    pub skipped: usize,
    pub duration: Duration,
    /// Whether every step ran and succeeded.
    pub success: bool,
}

/// Run steps in order, stopping at the first failure.
pub fn run_steps(
    steps: &[StepConfig],
    step_ctx: &StepContext,
    ctx: &mut BuildContext,
    invoker: &Invoker,
    mut on_progress: impl FnMut(RunProgress<'_>),
) -> PipelineResult {
    let start = Instant::now();
    let total = steps.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, step) in steps.iter().enumerate() {
        let kind = step.kind();
        on_progress(RunProgress::StepStarting { kind, index, total });

        let success = invoker.run(&step.parameters(step_ctx), ctx);
        on_progress(RunProgress::StepFinished { kind, success });

        outcomes.push(StepOutcome {
            index,
            kind: kind.to_string(),
            success,
        });

        if !success {
            tracing::debug!("Step {} ({}) failed, stopping", index + 1, kind);
            break;
        }
    }

    let success = outcomes.len() == total && outcomes.iter().all(|o| o.success);
    PipelineResult {
        skipped: total - outcomes.len(),
        steps: outcomes,
        duration: start.elapsed(),
        success,
    }
}
