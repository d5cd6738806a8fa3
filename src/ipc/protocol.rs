//! IPC protocol message types
//!
//! Defines the request/response format of the server-streaming `Execute`
//! call. One [`ExecutionRequest`] goes up, a sequence of
//! [`ExecutionResponse`] messages comes down.

use serde::{Deserialize, Serialize};

/// Request to run the specs in the given directories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub specs: Vec<String>,
}

/// Type of a response message, mirroring the event topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    SuiteStart,
    SpecStart,
    SpecEnd,
    ScenarioStart,
    ScenarioEnd,
    SuiteEnd,
    ErrorResult,
}

impl ResponseType {
    /// Whether no further responses follow this one
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::SuiteEnd | Self::ErrorResult)
    }
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SuiteStart => "SuiteStart",
            Self::SpecStart => "SpecStart",
            Self::SpecEnd => "SpecEnd",
            Self::ScenarioStart => "ScenarioStart",
            Self::ScenarioEnd => "ScenarioEnd",
            Self::SuiteEnd => "SuiteEnd",
            Self::ErrorResult => "ErrorResult",
        };
        f.write_str(name)
    }
}

/// Scenario status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Passed,
    Failed,
    Skipped,
}

/// A step failure, skip reason, hook failure or validation error
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionError {
    pub error_message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stack_trace: String,
    /// PNG bytes, base64-encoded on the wire
    #[serde(default, skip_serializing_if = "Option::is_none", with = "screenshot")]
    pub screenshot: Option<Vec<u8>>,
}

impl ExecutionError {
    /// Error carrying only a message
    pub fn message(error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
            ..Default::default()
        }
    }
}

/// Result payload attached to end events and scenario starts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_millis: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ExecutionError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_hook_failure: Option<ExecutionError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_hook_failure: Option<ExecutionError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_row_number: Option<i64>,
}

/// A message on the outbound stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    #[serde(rename = "type")]
    pub kind: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RunResult>,
}

impl ExecutionResponse {
    /// Response with neither id nor result
    pub fn bare(kind: ResponseType) -> Self {
        Self {
            kind,
            id: None,
            result: None,
        }
    }

    /// Single terminal response reporting why a run was not started
    pub fn error_result(errors: Vec<ExecutionError>) -> Self {
        Self {
            kind: ResponseType::ErrorResult,
            id: None,
            result: Some(RunResult {
                errors,
                ..Default::default()
            }),
        }
    }

    /// Status of the result, if the response carries one
    pub fn status(&self) -> Option<Status> {
        self.result.as_ref().and_then(|r| r.status)
    }

    /// Whether any error in the result carries a screenshot
    pub fn has_screenshots(&self) -> bool {
        self.result.as_ref().is_some_and(|result| {
            result
                .errors
                .iter()
                .chain(result.before_hook_failure.iter())
                .chain(result.after_hook_failure.iter())
                .any(|e| e.screenshot.is_some())
        })
    }

    /// Copy of this response with every screenshot removed
    pub fn without_screenshots(&self) -> Self {
        let mut response = self.clone();
        if let Some(result) = response.result.as_mut() {
            result
                .errors
                .iter_mut()
                .chain(result.before_hook_failure.iter_mut())
                .chain(result.after_hook_failure.iter_mut())
                .for_each(|e| e.screenshot = None);
        }
        response
    }
}

mod screenshot {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
