//! Result tree model
//!
//! Snapshot types the engine attaches to lifecycle events: which spec and
//! scenario is being processed, and what happened while executing them.
//! Nothing here is mutated after the engine hands it over.

use std::time::Duration;

/// The spec file currently being processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecInfo {
    /// Spec file path, used verbatim as the response id
    pub file_name: String,
}

impl SpecInfo {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

/// Engine-side context carried by every spec- and scenario-level event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionInfo {
    pub current_spec: SpecInfo,
}

impl ExecutionInfo {
    pub fn new(current_spec: SpecInfo) -> Self {
        Self { current_spec }
    }
}

/// A scenario heading and its position in the spec file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub text: String,
    pub line_no: usize,
}

/// A data-table row bound to a data-driven scenario execution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRow {
    pub cells: Vec<String>,
}

/// Scenario descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub heading: Heading,
    /// Zero-based index of the data-table row this execution uses
    pub data_table_row_index: usize,
    /// The materialized row, when the engine bound one to this execution
    pub data_table_row: Option<TableRow>,
}

impl Scenario {
    pub fn new(text: impl Into<String>, line_no: usize) -> Self {
        Self {
            heading: Heading {
                text: text.into(),
                line_no,
            },
            data_table_row_index: 0,
            data_table_row: None,
        }
    }

    /// Bind a data-table row to this execution
    pub fn with_table_row(mut self, index: usize, row: TableRow) -> Self {
        self.data_table_row_index = index;
        self.data_table_row = Some(row);
        self
    }

    /// User-facing row number
    ///
    /// The internal index is zero-based; once a row is bound the number
    /// reported to clients is one-based.
    pub fn table_row_number(&self) -> i64 {
        let index = i64::try_from(self.data_table_row_index).unwrap_or(i64::MAX);
        if self.data_table_row.is_some() {
            index.saturating_add(1)
        } else {
            index
        }
    }
}

/// Failure of a before/after hook
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HookFailure {
    pub error_message: String,
    pub stack_trace: String,
    pub screenshot: Option<Vec<u8>>,
}

/// Failure details of a step execution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepFailure {
    pub error_message: String,
    pub stack_trace: String,
    pub screenshot: Option<Vec<u8>>,
}

/// What happened when a step executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Failed(StepFailure),
    Skipped { reason: String },
}

/// A leaf of the item tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub text: String,
    pub outcome: StepOutcome,
}

impl Step {
    pub fn passed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: StepOutcome::Passed,
        }
    }

    pub fn failed(
        text: impl Into<String>,
        error_message: impl Into<String>,
        stack_trace: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            outcome: StepOutcome::Failed(StepFailure {
                error_message: error_message.into(),
                stack_trace: stack_trace.into(),
                screenshot: None,
            }),
        }
    }

    pub fn skipped(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: StepOutcome::Skipped {
                reason: reason.into(),
            },
        }
    }
}

/// An internal node of the item tree: a named group of steps and concepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concept {
    pub text: String,
    pub items: Vec<Item>,
}

/// Executed content of a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Step(Step),
    Concept(Concept),
}

impl Item {
    pub fn concept(text: impl Into<String>, items: Vec<Item>) -> Self {
        Item::Concept(Concept {
            text: text.into(),
            items,
        })
    }
}

impl From<Step> for Item {
    fn from(step: Step) -> Self {
        Item::Step(step)
    }
}

/// Outcome of one scenario execution (one per data-table row)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScenarioResult {
    /// The scenario failed (a step or a hook failed)
    pub failed: bool,
    /// The execution record marks the scenario as skipped
    pub skipped: bool,
    pub execution_time: Duration,
    pub items: Vec<Item>,
    pub pre_hook: Option<HookFailure>,
    pub post_hook: Option<HookFailure>,
}

/// Outcome of a spec
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecResult {
    pub failed: bool,
    pub execution_time: Duration,
    pub pre_hook: Option<HookFailure>,
    pub post_hook: Option<HookFailure>,
}

/// Outcome of the whole suite
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuiteResult {
    pub failed: bool,
    pub execution_time: Duration,
    pub pre_hook: Option<HookFailure>,
    pub post_hook: Option<HookFailure>,
}
