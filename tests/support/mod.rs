//! Validator and engine doubles shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use execution_api::event::{EventPublisher, ExecutionEvent};
use execution_api::execution::{Engine, ErrorMap, RunRequest, Validated, Validator};
use execution_api::model::{
    ExecutionInfo, Item, Scenario, ScenarioResult, SpecInfo, SpecResult, Step, SuiteResult,
    TableRow,
};
use execution_api::ValidationError;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Accepts only the directories it knows about
pub struct KnownDirs(pub Vec<&'static str>);

impl Validator for KnownDirs {
    type Specs = Vec<String>;
    type Runner = ();

    fn validate(
        &self,
        spec_dirs: &[String],
    ) -> Result<Validated<Vec<String>, ()>, Vec<ValidationError>> {
        let errors: Vec<_> = spec_dirs
            .iter()
            .filter(|dir| !self.0.contains(&dir.as_str()))
            .map(|dir| ValidationError::general(format!("Specs directory does not exist: {}", dir)))
            .collect();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Validated {
            specs: spec_dirs.to_vec(),
            runner: (),
            error_map: ErrorMap::new(),
        })
    }
}

/// Publishes a fixed script of events
pub struct ScriptedEngine {
    script: Vec<ExecutionEvent>,
    pub runs: Arc<AtomicUsize>,
    pub finished: Arc<AtomicBool>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<ExecutionEvent>) -> Self {
        Self {
            script,
            runs: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Engine<Vec<String>, ()> for ScriptedEngine {
    async fn run(&self, _run: RunRequest<Vec<String>, ()>, events: EventPublisher) {
        self.runs.fetch_add(1, Ordering::SeqCst);
        for event in self.script.clone() {
            events.publish(event).await;
        }
        self.finished.store(true, Ordering::SeqCst);
    }
}

pub fn login_info() -> ExecutionInfo {
    ExecutionInfo::new(SpecInfo::new("login.spec"))
}

/// login.spec: a failing scenario at line 12, then a data-driven scenario
/// at line 20 executed for two table rows
pub fn login_run() -> Vec<ExecutionEvent> {
    let failing = Scenario::new("Log in with wrong user", 12);
    let row = |index: usize, user: &str| {
        Scenario::new("Log in as user", 20).with_table_row(
            index,
            TableRow {
                cells: vec![user.to_string()],
            },
        )
    };

    vec![
        ExecutionEvent::SuiteStart,
        ExecutionEvent::SpecStart { info: login_info() },
        ExecutionEvent::ScenarioStart {
            info: login_info(),
            scenario: failing.clone(),
        },
        ExecutionEvent::StepStart {
            info: login_info(),
            text: "Click login".to_string(),
        },
        ExecutionEvent::ScenarioEnd {
            info: login_info(),
            scenario: failing,
            result: ScenarioResult {
                failed: true,
                execution_time: Duration::from_millis(87),
                items: vec![
                    Step::passed("Open login page").into(),
                    Step::failed("Click login", "element not found", "at step.run:42").into(),
                ],
                ..Default::default()
            },
        },
        ExecutionEvent::ScenarioStart {
            info: login_info(),
            scenario: row(0, "alice"),
        },
        ExecutionEvent::ScenarioEnd {
            info: login_info(),
            scenario: row(0, "alice"),
            result: ScenarioResult {
                items: vec![Item::concept(
                    "Log in as <user>",
                    vec![Step::passed("Enter name").into()],
                )],
                ..Default::default()
            },
        },
        ExecutionEvent::ScenarioStart {
            info: login_info(),
            scenario: row(1, "bob"),
        },
        ExecutionEvent::ScenarioEnd {
            info: login_info(),
            scenario: row(1, "bob"),
            result: ScenarioResult::default(),
        },
        ExecutionEvent::SpecEnd {
            info: login_info(),
            result: SpecResult::default(),
        },
        ExecutionEvent::SuiteEnd {
            result: SuiteResult::default(),
        },
    ]
}
