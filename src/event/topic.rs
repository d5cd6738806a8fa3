//! Lifecycle topics and the events published under them
//!
//! Each [`ExecutionEvent`] variant carries exactly the payload its topic can
//! have: `SuiteStart` has nothing, scenario events always have a scenario,
//! end events always have a result.

use std::fmt;

use crate::model::{
    Concept, ExecutionInfo, Scenario, ScenarioResult, SpecResult, Step, SuiteResult,
};

/// Classification of engine events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    SuiteStart,
    SpecStart,
    SpecEnd,
    ScenarioStart,
    ScenarioEnd,
    ConceptStart,
    ConceptEnd,
    StepStart,
    StepEnd,
    SuiteEnd,
}

impl Topic {
    /// Topics that make up the client-visible run lifecycle
    pub const LIFECYCLE: [Topic; 6] = [
        Topic::SuiteStart,
        Topic::SpecStart,
        Topic::SpecEnd,
        Topic::ScenarioStart,
        Topic::ScenarioEnd,
        Topic::SuiteEnd,
    ];
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SuiteStart => "suite_start",
            Self::SpecStart => "spec_start",
            Self::SpecEnd => "spec_end",
            Self::ScenarioStart => "scenario_start",
            Self::ScenarioEnd => "scenario_end",
            Self::ConceptStart => "concept_start",
            Self::ConceptEnd => "concept_end",
            Self::StepStart => "step_start",
            Self::StepEnd => "step_end",
            Self::SuiteEnd => "suite_end",
        };
        f.write_str(name)
    }
}

/// Event emitted by the engine at a lifecycle boundary
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    SuiteStart,
    SpecStart {
        info: ExecutionInfo,
    },
    SpecEnd {
        info: ExecutionInfo,
        result: SpecResult,
    },
    ScenarioStart {
        info: ExecutionInfo,
        scenario: Scenario,
    },
    ScenarioEnd {
        info: ExecutionInfo,
        scenario: Scenario,
        result: ScenarioResult,
    },
    ConceptStart {
        info: ExecutionInfo,
        text: String,
    },
    ConceptEnd {
        info: ExecutionInfo,
        concept: Concept,
    },
    StepStart {
        info: ExecutionInfo,
        text: String,
    },
    StepEnd {
        info: ExecutionInfo,
        step: Step,
    },
    SuiteEnd {
        result: SuiteResult,
    },
}

impl ExecutionEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::SuiteStart => Topic::SuiteStart,
            Self::SpecStart { .. } => Topic::SpecStart,
            Self::SpecEnd { .. } => Topic::SpecEnd,
            Self::ScenarioStart { .. } => Topic::ScenarioStart,
            Self::ScenarioEnd { .. } => Topic::ScenarioEnd,
            Self::ConceptStart { .. } => Topic::ConceptStart,
            Self::ConceptEnd { .. } => Topic::ConceptEnd,
            Self::StepStart { .. } => Topic::StepStart,
            Self::StepEnd { .. } => Topic::StepEnd,
            Self::SuiteEnd { .. } => Topic::SuiteEnd,
        }
    }
}
