//! Per-connection handling of the `Execute` call

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::common::{Error, Result};
use crate::execution::{Engine, Executor, FramedSink, ResponseSink, RunOutcome, Validator};
use crate::ipc::protocol::{ExecutionError, ExecutionRequest, ExecutionResponse};
use crate::ipc::transport;

/// Serve one connection: read the request, then stream the run
///
/// Returns `Ok(None)` when the client disconnected before sending a
/// request.
pub async fn handle_connection<S, V, E>(
    executor: &Executor<V, E>,
    stream: S,
    client_timeout: Duration,
) -> Result<Option<RunOutcome>>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    V: Validator,
    E: Engine<V::Specs, V::Runner>,
{
    let (mut reader, writer) = tokio::io::split(stream);

    let request: ExecutionRequest =
        match tokio::time::timeout(client_timeout, transport::recv_json(&mut reader)).await {
            Ok(Ok(request)) => request,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::debug!("Client disconnected before sending a request");
                return Ok(None);
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::error!("Invalid request: {}", e);
                let mut sink = FramedSink::new(writer);
                sink.send(&ExecutionResponse::error_result(vec![ExecutionError::message(
                    format!("invalid request: {}", e),
                )]))
                .await?;
                return Err(Error::Protocol(e.to_string()));
            }
            Ok(Err(e)) => return Err(Error::Communication(e.to_string())),
            Err(_) => {
                tracing::debug!("Client timeout");
                return Err(Error::Timeout(client_timeout.as_secs()));
            }
        };

    tracing::info!(specs = ?request.specs, "Received execution request");
    let outcome = executor.execute(request.specs, FramedSink::new(writer)).await?;
    tracing::debug!(?outcome, "Execution request finished");
    Ok(Some(outcome))
}
