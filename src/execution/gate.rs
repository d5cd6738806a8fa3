//! Request gate: validation before anything runs

use crate::common::{config::ExecutionConfig, Result, ValidationError};
use crate::ipc::protocol::{ExecutionError, ExecutionResponse};

use super::collaborators::{Validated, Validator};
use super::dispatch::ResponseSink;

/// Outcome of the gate
#[derive(Debug)]
pub enum Admission<S, R> {
    /// The run may start
    Admitted(Validated<S, R>),
    /// An `ErrorResult` carrying `errors` entries was sent instead
    Rejected { errors: usize },
}

/// Validate flags and spec directories
///
/// On failure a single `ErrorResult` is written to `sink` and the run must
/// not start. Only a failure to write that response is returned as `Err`.
pub async fn admit<V, K>(
    flags: &ExecutionConfig,
    validator: &V,
    spec_dirs: &[String],
    sink: &mut K,
) -> Result<Admission<V::Specs, V::Runner>>
where
    V: Validator,
    K: ResponseSink,
{
    let errors = match flags.validate() {
        Err(e) => vec![e],
        Ok(()) => match validator.validate(spec_dirs) {
            Ok(validated) => {
                tracing::info!(spec_dirs = spec_dirs.len(), "Run admitted");
                return Ok(Admission::Admitted(validated));
            }
            Err(errors) if errors.is_empty() => {
                vec![ValidationError::general("spec validation failed")]
            }
            Err(errors) => errors,
        },
    };

    tracing::info!(errors = errors.len(), "Run rejected by validation");
    for error in &errors {
        tracing::debug!(%error, "Validation error");
    }

    let response = ExecutionResponse::error_result(
        errors
            .iter()
            .map(|e| ExecutionError::message(e.to_string()))
            .collect(),
    );
    sink.send(&response).await?;

    Ok(Admission::Rejected {
        errors: errors.len(),
    })
}
