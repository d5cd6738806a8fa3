//! Streaming dispatcher
//!
//! Drains a run's lifecycle subscription, translates every event and writes
//! the response to the client before taking the next event. Combined with
//! the rendezvous broker this means the engine never gets ahead of what the
//! client has been sent.
//!
//! ```text
//! Engine ──publish──► EventReceiver ──► translate ──► ResponseSink::send
//!                          ▲                                   │
//!                          └───────── next event ◄─────────────┘
//! ```
//!
//! The loop ends after a successful `SuiteEnd` write, after the first
//! failed write, or when the event source closes. A failed write does not
//! stop the engine; later events are simply dropped by the broker.

use async_trait::async_trait;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::common::{Error, Result};
use crate::event::{Broker, EventReceiver, Topic};
use crate::ipc::protocol::{ExecutionResponse, ResponseType};
use crate::ipc::transport;

use super::translate::translate;

/// Outbound side of the response stream
///
/// Only the forwarding loop writes to it.
#[async_trait]
pub trait ResponseSink: Send + 'static {
    /// Write one response; returns once the transport accepted it
    async fn send(&mut self, response: &ExecutionResponse) -> Result<()>;
}

/// Sink writing length-prefixed JSON frames
pub struct FramedSink<W> {
    writer: W,
}

impl<W> FramedSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W> ResponseSink for FramedSink<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Screenshots are dropped from a response that would not fit in one
    /// frame; the rest of the response is still delivered.
    async fn send(&mut self, response: &ExecutionResponse) -> Result<()> {
        let mut frame = serde_json::to_vec(response)?;
        if frame.len() > transport::MAX_MESSAGE_SIZE && response.has_screenshots() {
            tracing::error!(
                size = frame.len(),
                limit = transport::MAX_MESSAGE_SIZE,
                id = ?response.id,
                "Response exceeds the frame limit, sending it without screenshots"
            );
            frame = serde_json::to_vec(&response.without_screenshots())?;
        }
        if frame.len() > transport::MAX_MESSAGE_SIZE {
            return Err(Error::MessageTooLarge {
                size: frame.len(),
                limit: transport::MAX_MESSAGE_SIZE,
            });
        }
        transport::send_message(&mut self.writer, &frame).await?;
        Ok(())
    }
}

/// In-process sink, for embedding the API behind another transport
#[async_trait]
impl ResponseSink for mpsc::Sender<ExecutionResponse> {
    async fn send(&mut self, response: &ExecutionResponse) -> Result<()> {
        mpsc::Sender::send(self, response.clone())
            .await
            .map_err(|_| Error::Communication("response receiver closed".to_string()))
    }
}

/// How the forwarding loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// `SuiteEnd` was delivered
    Completed { delivered: usize },
    /// A write failed; the client no longer observes the run
    Detached { delivered: usize },
    /// Every publisher went away without a `SuiteEnd`
    SourceClosed { delivered: usize },
}

impl ForwardOutcome {
    /// Number of responses successfully written
    pub fn delivered(&self) -> usize {
        match *self {
            Self::Completed { delivered }
            | Self::Detached { delivered }
            | Self::SourceClosed { delivered } => delivered,
        }
    }
}

/// Subscribe to the lifecycle topics and spawn the forwarding loop
pub fn listen_execution_events<K: ResponseSink>(
    broker: &mut Broker,
    sink: K,
) -> JoinHandle<ForwardOutcome> {
    let events = broker.register(&Topic::LIFECYCLE);
    tokio::spawn(forward(events, sink))
}

/// Forward events to the sink until the run ends or the client goes away
pub async fn forward<K: ResponseSink>(mut events: EventReceiver, mut sink: K) -> ForwardOutcome {
    let mut delivered = 0;

    while let Some(event) = events.recv().await {
        let topic = event.topic();
        let Some(response) = translate(&event) else {
            tracing::trace!(%topic, "Event has no client-visible response");
            continue;
        };

        if let Err(e) = sink.send(&response).await {
            if matches!(e, Error::MessageTooLarge { .. }) {
                tracing::error!(
                    error = %e,
                    %topic,
                    delivered,
                    "Response cannot be framed, no longer forwarding events for this run"
                );
            } else {
                tracing::warn!(
                    error = %e,
                    %topic,
                    delivered,
                    "Failed to write response, no longer forwarding events for this run"
                );
            }
            return ForwardOutcome::Detached { delivered };
        }
        delivered += 1;
        tracing::trace!(%topic, id = ?response.id, "Forwarded response");

        if response.kind == ResponseType::SuiteEnd {
            tracing::info!(delivered, "Run completed");
            return ForwardOutcome::Completed { delivered };
        }
    }

    tracing::warn!(delivered, "Event source closed before SuiteEnd");
    ForwardOutcome::SourceClosed { delivered }
}
