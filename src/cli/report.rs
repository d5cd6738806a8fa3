//! Rendering of the response stream

use colored::Colorize;

use crate::common::Result;
use crate::ipc::protocol::{ExecutionError, ExecutionResponse, ResponseType, RunResult, Status};

/// Accumulates run totals while rendering responses
#[derive(Debug, Default)]
pub struct Report {
    json: bool,
    passed: usize,
    failed: usize,
    skipped: usize,
    hook_failures: usize,
    rejected: bool,
    completed: bool,
}

impl Report {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            ..Default::default()
        }
    }

    /// Record a response and render it as one block of output
    pub fn render(&mut self, response: &ExecutionResponse) -> Result<String> {
        self.record(response);
        if self.json {
            return Ok(serde_json::to_string(response)?);
        }
        Ok(self.render_text(response))
    }

    fn record(&mut self, response: &ExecutionResponse) {
        match response.kind {
            ResponseType::ScenarioEnd => match response.status() {
                Some(Status::Failed) => self.failed += 1,
                Some(Status::Skipped) => self.skipped += 1,
                _ => self.passed += 1,
            },
            ResponseType::ErrorResult => self.rejected = true,
            ResponseType::SuiteEnd => self.completed = true,
            _ => {}
        }
        if let Some(result) = &response.result {
            self.hook_failures += usize::from(result.before_hook_failure.is_some())
                + usize::from(result.after_hook_failure.is_some());
        }
    }

    fn render_text(&self, response: &ExecutionResponse) -> String {
        let id = response.id.as_deref().unwrap_or_default();
        let mut out = match response.kind {
            ResponseType::SuiteStart => "Running specs".bold().to_string(),
            ResponseType::SpecStart => format!("# {}", id.bold()),
            ResponseType::ScenarioStart => format!("  {} {}", "…".dimmed(), id.dimmed()),
            ResponseType::ScenarioEnd => render_scenario_end(id, response.result.as_ref()),
            ResponseType::SpecEnd => String::new(),
            ResponseType::SuiteEnd => self.summary(),
            ResponseType::ErrorResult => "Run rejected:".red().bold().to_string(),
        };

        if let Some(result) = &response.result {
            if response.kind == ResponseType::ErrorResult {
                for error in &result.errors {
                    out.push_str(&format!("\n  {}", error.error_message.red()));
                }
            }
            push_hook(&mut out, "before hook", result.before_hook_failure.as_ref());
            push_hook(&mut out, "after hook", result.after_hook_failure.as_ref());
        }
        out
    }

    fn summary(&self) -> String {
        format!(
            "Scenarios: {} passed, {} failed, {} skipped",
            self.passed.to_string().green(),
            self.failed.to_string().red(),
            self.skipped.to_string().yellow()
        )
    }

    /// Process exit code for the run seen so far
    pub fn exit_code(&self) -> i32 {
        if self.rejected || !self.completed || self.failed > 0 || self.hook_failures > 0 {
            1
        } else {
            0
        }
    }
}

fn render_scenario_end(id: &str, result: Option<&RunResult>) -> String {
    let Some(result) = result else {
        return format!("  {}", id);
    };

    let marker = match result.status {
        Some(Status::Failed) => "✘".red(),
        Some(Status::Skipped) => "-".yellow(),
        _ => "✔".green(),
    };
    let mut out = format!("  {} {}", marker, id);
    if let Some(row) = result.table_row_number.filter(|row| *row > 0) {
        out.push_str(&format!(" [row {}]", row));
    }
    if let Some(ms) = result.execution_time_millis {
        out.push_str(&format!(" ({} ms)", ms).dimmed().to_string());
    }
    for error in &result.errors {
        push_error(&mut out, error);
    }
    out
}

fn push_error(out: &mut String, error: &ExecutionError) {
    out.push_str(&format!("\n      {}", error.error_message.red()));
    for line in error.stack_trace.lines() {
        out.push_str(&format!("\n        {}", line.dimmed()));
    }
}

fn push_hook(out: &mut String, label: &str, failure: Option<&ExecutionError>) {
    if let Some(failure) = failure {
        out.push_str(&format!("\n  {} failed:", label.red()));
        push_error(out, failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_end(status: Status) -> ExecutionResponse {
        ExecutionResponse {
            kind: ResponseType::ScenarioEnd,
            id: Some("a.spec:3".to_string()),
            result: Some(RunResult {
                status: Some(status),
                ..Default::default()
            }),
        }
    }

    fn suite_end() -> ExecutionResponse {
        ExecutionResponse {
            kind: ResponseType::SuiteEnd,
            id: None,
            result: Some(RunResult::default()),
        }
    }

    #[test]
    fn test_passing_run_exits_zero() {
        let mut report = Report::new(false);
        report.render(&ExecutionResponse::bare(ResponseType::SuiteStart)).unwrap();
        report.render(&scenario_end(Status::Passed)).unwrap();
        report.render(&scenario_end(Status::Skipped)).unwrap();
        let summary = report.render(&suite_end()).unwrap();

        assert!(summary.contains("passed"));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_failed_scenario_exits_nonzero() {
        let mut report = Report::new(false);
        report.render(&scenario_end(Status::Failed)).unwrap();
        report.render(&suite_end()).unwrap();
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_incomplete_stream_exits_nonzero() {
        let mut report = Report::new(false);
        report.render(&scenario_end(Status::Passed)).unwrap();
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_error_result_lists_errors() {
        let mut report = Report::new(false);
        let text = report
            .render(&ExecutionResponse::error_result(vec![ExecutionError::message(
                "specs directory not found",
            )]))
            .unwrap();

        assert!(text.contains("specs directory not found"));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_json_mode_prints_wire_format() {
        let mut report = Report::new(true);
        let line = report
            .render(&ExecutionResponse::bare(ResponseType::SuiteStart))
            .unwrap();
        assert_eq!(line, r#"{"type":"SuiteStart"}"#);
    }
}
