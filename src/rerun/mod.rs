//! Failed-scenario bookkeeping
//!
//! [`FailureRecorder`] listens to every run and, once the suite ends,
//! writes the failed scenarios to a JSON file so a later run can pick
//! exactly those up again:
//!
//! ```json
//! {
//!   "args": ["specs"],
//!   "failedItems": ["specs/login.spec:12"]
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::{config::RerunConfig, Error, Result};
use crate::event::{Broker, EventReceiver, ExecutionEvent, Topic};
use crate::execution::{flatten::resolve_status, RunListener};
use crate::ipc::protocol::Status;

/// Contents of the failures file
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedItems {
    /// Spec directories the run was started with
    pub args: Vec<String>,
    /// `<file>:<line>` of every failed scenario, in first-failure order
    pub failed_items: Vec<String>,
}

impl FailedItems {
    /// Write the file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| Error::file_write(dir, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| Error::file_write(path, e))
    }

    /// Read a previously written file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Records failed scenarios of each run into the failures file
#[derive(Debug, Clone)]
pub struct FailureRecorder {
    failures_file: PathBuf,
}

impl FailureRecorder {
    pub fn new(failures_file: impl Into<PathBuf>) -> Self {
        Self {
            failures_file: failures_file.into(),
        }
    }

    /// Recorder configured from `[rerun]`, if enabled
    pub fn from_config(config: &RerunConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.failures_file.clone()))
    }
}

impl RunListener for FailureRecorder {
    fn name(&self) -> &'static str {
        "failure-recorder"
    }

    fn arm(&self, broker: &mut Broker, spec_dirs: &[String]) {
        let events = broker.register(&[Topic::ScenarioEnd, Topic::SuiteEnd]);
        let path = self.failures_file.clone();
        let args = spec_dirs.to_vec();
        tokio::spawn(async move {
            if let Some(failed) = collect_failures(events, args).await {
                match failed.save(&path) {
                    Ok(()) => tracing::debug!(
                        path = %path.display(),
                        failed = failed.failed_items.len(),
                        "Wrote failed scenarios"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Could not record failed scenarios"),
                }
            }
        });
    }
}

/// Collect failed scenario ids until `SuiteEnd`
///
/// Returns `None` if the run ended without a `SuiteEnd`.
async fn collect_failures(mut events: EventReceiver, args: Vec<String>) -> Option<FailedItems> {
    let mut failed = FailedItems {
        args,
        failed_items: Vec::new(),
    };
    let mut seen = HashSet::new();

    while let Some(event) = events.recv().await {
        match event {
            ExecutionEvent::ScenarioEnd {
                info,
                scenario,
                result,
            } => {
                if resolve_status(&result) == Status::Failed {
                    let id = format!("{}:{}", info.current_spec.file_name, scenario.heading.line_no);
                    if seen.insert(id.clone()) {
                        failed.failed_items.push(id);
                    }
                }
            }
            ExecutionEvent::SuiteEnd { .. } => return Some(failed),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExecutionInfo, Scenario, ScenarioResult, SpecInfo, SuiteResult};

    fn scenario_end(file: &str, line: usize, failed: bool) -> ExecutionEvent {
        ExecutionEvent::ScenarioEnd {
            info: ExecutionInfo::new(SpecInfo::new(file)),
            scenario: Scenario::new("scenario", line),
            result: ScenarioResult {
                failed,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_records_failed_scenarios_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("failures.json");
        let recorder = FailureRecorder::new(&path);

        let mut broker = Broker::new();
        recorder.arm(&mut broker, &["specs".to_string()]);
        let publisher = broker.into_publisher();

        publisher.publish(ExecutionEvent::SuiteStart).await;
        publisher.publish(scenario_end("a.spec", 3, true)).await;
        publisher.publish(scenario_end("a.spec", 9, false)).await;
        // Second data-table row of the same scenario
        publisher.publish(scenario_end("a.spec", 3, true)).await;
        publisher.publish(scenario_end("b.spec", 5, true)).await;
        publisher
            .publish(ExecutionEvent::SuiteEnd {
                result: SuiteResult::default(),
            })
            .await;

        let written = tokio::time::timeout(std::time::Duration::from_secs(2), async {
            loop {
                if let Ok(items) = FailedItems::load(&path) {
                    return items;
                }
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("failures file was not written");

        assert_eq!(written.args, vec!["specs"]);
        assert_eq!(written.failed_items, vec!["a.spec:3", "b.spec:5"]);
    }

    #[tokio::test]
    async fn test_no_file_without_suite_end() {
        let mut broker = Broker::new();
        let events = broker.register(&[Topic::ScenarioEnd, Topic::SuiteEnd]);
        let publisher = broker.into_publisher();

        let collector = tokio::spawn(collect_failures(events, Vec::new()));
        publisher.publish(scenario_end("a.spec", 3, true)).await;
        drop(publisher);

        assert_eq!(collector.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_repeated_failures_keep_first_seen_order() {
        let mut broker = Broker::new();
        let events = broker.register(&[Topic::ScenarioEnd, Topic::SuiteEnd]);
        let publisher = broker.into_publisher();

        let collector = tokio::spawn(collect_failures(events, Vec::new()));
        for round in 0..2 {
            for line in (1..=300).rev() {
                publisher.publish(scenario_end("big.spec", line, true)).await;
            }
            if round == 0 {
                publisher.publish(scenario_end("big.spec", 1000, false)).await;
            }
        }
        publisher
            .publish(ExecutionEvent::SuiteEnd {
                result: SuiteResult::default(),
            })
            .await;

        let failed = collector.await.unwrap().unwrap();
        let expected: Vec<_> = (1..=300).rev().map(|line| format!("big.spec:{}", line)).collect();
        assert_eq!(failed.failed_items, expected);
    }

    #[test]
    fn test_disabled_config_has_no_recorder() {
        let config = RerunConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(FailureRecorder::from_config(&config).is_none());
        assert!(FailureRecorder::from_config(&RerunConfig::default()).is_some());
    }
}
