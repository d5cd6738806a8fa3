//! Engine event → wire response translation

use crate::event::ExecutionEvent;
use crate::ipc::protocol::{ExecutionResponse, ResponseType, RunResult};
use crate::model::{ExecutionInfo, HookFailure, Scenario};

use super::flatten::{flatten_errors, hook_failure, resolve_status};

/// Translate one engine event into the response sent to the client
///
/// Returns `None` for topics that are not part of the client-visible
/// lifecycle (step and concept events).
pub fn translate(event: &ExecutionEvent) -> Option<ExecutionResponse> {
    let response = match event {
        ExecutionEvent::SuiteStart => ExecutionResponse::bare(ResponseType::SuiteStart),

        ExecutionEvent::SpecStart { info } => ExecutionResponse {
            kind: ResponseType::SpecStart,
            id: Some(spec_id(info)),
            result: None,
        },

        ExecutionEvent::SpecEnd { info, result } => ExecutionResponse {
            kind: ResponseType::SpecEnd,
            id: Some(spec_id(info)),
            result: Some(hooks_only(result.pre_hook.as_ref(), result.post_hook.as_ref())),
        },

        ExecutionEvent::ScenarioStart { info, scenario } => ExecutionResponse {
            kind: ResponseType::ScenarioStart,
            id: Some(scenario_id(info, scenario)),
            result: Some(RunResult {
                table_row_number: Some(scenario.table_row_number()),
                ..Default::default()
            }),
        },

        ExecutionEvent::ScenarioEnd {
            info,
            scenario,
            result,
        } => ExecutionResponse {
            kind: ResponseType::ScenarioEnd,
            id: Some(scenario_id(info, scenario)),
            result: Some(RunResult {
                status: Some(resolve_status(result)),
                execution_time_millis: Some(millis(result.execution_time)),
                errors: flatten_errors(&result.items),
                before_hook_failure: hook_failure(result.pre_hook.as_ref()),
                after_hook_failure: hook_failure(result.post_hook.as_ref()),
                table_row_number: Some(scenario.table_row_number()),
            }),
        },

        ExecutionEvent::SuiteEnd { result } => ExecutionResponse {
            kind: ResponseType::SuiteEnd,
            id: None,
            result: Some(hooks_only(result.pre_hook.as_ref(), result.post_hook.as_ref())),
        },

        ExecutionEvent::ConceptStart { .. }
        | ExecutionEvent::ConceptEnd { .. }
        | ExecutionEvent::StepStart { .. }
        | ExecutionEvent::StepEnd { .. } => return None,
    };

    Some(response)
}

fn spec_id(info: &ExecutionInfo) -> String {
    info.current_spec.file_name.clone()
}

fn scenario_id(info: &ExecutionInfo, scenario: &Scenario) -> String {
    format!("{}:{}", info.current_spec.file_name, scenario.heading.line_no)
}

fn hooks_only(pre: Option<&HookFailure>, post: Option<&HookFailure>) -> RunResult {
    RunResult {
        before_hook_failure: hook_failure(pre),
        after_hook_failure: hook_failure(post),
        ..Default::default()
    }
}

fn millis(duration: std::time::Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
