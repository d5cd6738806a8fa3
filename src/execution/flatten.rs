//! Status resolution and error flattening for scenario results

use crate::ipc::protocol::{ExecutionError, Status};
use crate::model::{HookFailure, Item, ScenarioResult, StepOutcome};

/// Resolve a scenario's status
///
/// Failure wins over skip; anything else passed.
pub fn resolve_status(result: &ScenarioResult) -> Status {
    if result.failed {
        Status::Failed
    } else if result.skipped {
        Status::Skipped
    } else {
        Status::Passed
    }
}

/// Collect step errors in depth-first, left-to-right order
///
/// Skipped steps contribute their reason, failed steps their failure
/// details, passing steps nothing. A concept's errors are spliced in where
/// its steps sit; the concept itself contributes nothing.
pub fn flatten_errors(items: &[Item]) -> Vec<ExecutionError> {
    let mut errors = Vec::new();
    collect_errors(items, &mut errors);
    errors
}

fn collect_errors(items: &[Item], errors: &mut Vec<ExecutionError>) {
    for item in items {
        match item {
            Item::Step(step) => match &step.outcome {
                StepOutcome::Skipped { reason } => {
                    errors.push(ExecutionError::message(reason.clone()));
                }
                StepOutcome::Failed(failure) => errors.push(ExecutionError {
                    error_message: failure.error_message.clone(),
                    stack_trace: failure.stack_trace.clone(),
                    screenshot: failure.screenshot.clone(),
                }),
                StepOutcome::Passed => {}
            },
            Item::Concept(concept) => collect_errors(&concept.items, errors),
        }
    }
}

/// Convert a hook failure, keeping absence as absence
pub fn hook_failure(hook: Option<&HookFailure>) -> Option<ExecutionError> {
    hook.map(|failure| ExecutionError {
        error_message: failure.error_message.clone(),
        stack_trace: failure.stack_trace.clone(),
        screenshot: failure.screenshot.clone(),
    })
}
