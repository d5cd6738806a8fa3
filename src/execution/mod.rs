//! Execution bridge
//!
//! Turns one `Execute` request into one engine run and streams the run's
//! lifecycle to the client:
//!
//! 1. The request gate validates flags and spec directories. On failure the
//!    client gets a single `ErrorResult` and nothing else happens.
//! 2. A fresh per-run [`Broker`] is created; the dispatcher subscribes to
//!    the lifecycle topics and every [`RunListener`] is armed.
//! 3. The engine is started on its own task with the broker's publisher.
//! 4. The call returns when the forwarding loop ends. The engine is never
//!    awaited or cancelled from here.

pub mod collaborators;
pub mod dispatch;
pub mod flatten;
pub mod gate;
pub mod translate;

use std::sync::Arc;

use crate::common::{config::ExecutionConfig, Error, Result};
use crate::event::Broker;

pub use collaborators::{Engine, ErrorMap, RunListener, RunRequest, Validated, Validator};
pub use dispatch::{FramedSink, ForwardOutcome, ResponseSink};
pub use gate::Admission;

/// Row the engine starts data-driven scenarios from
const START_ROW: usize = 0;

/// How a request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The gate rejected the run; an `ErrorResult` with this many errors was sent
    Rejected { errors: usize },
    /// The run started and the forwarding loop ended this way
    Forwarded(ForwardOutcome),
}

/// Wires validator, engine and listeners together for each request
pub struct Executor<V, E> {
    validator: Arc<V>,
    engine: Arc<E>,
    flags: ExecutionConfig,
    listeners: Vec<Arc<dyn RunListener>>,
}

impl<V, E> Executor<V, E>
where
    V: Validator,
    E: Engine<V::Specs, V::Runner>,
{
    pub fn new(validator: V, engine: E, flags: ExecutionConfig) -> Self {
        Self {
            validator: Arc::new(validator),
            engine: Arc::new(engine),
            flags,
            listeners: Vec::new(),
        }
    }

    /// Arm `listener` on every run
    pub fn with_listener(mut self, listener: Arc<dyn RunListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Execute the specs in `spec_dirs`, streaming responses into `sink`
    #[tracing::instrument(skip(self, sink), fields(parallel = self.flags.parallel))]
    pub async fn execute<K: ResponseSink>(
        &self,
        spec_dirs: Vec<String>,
        mut sink: K,
    ) -> Result<RunOutcome> {
        let validated =
            match gate::admit(&self.flags, self.validator.as_ref(), &spec_dirs, &mut sink).await? {
                Admission::Admitted(validated) => validated,
                Admission::Rejected { errors } => return Ok(RunOutcome::Rejected { errors }),
            };

        let mut broker = Broker::new();
        let forwarder = dispatch::listen_execution_events(&mut broker, sink);
        for listener in &self.listeners {
            tracing::debug!(listener = listener.name(), "Arming run listener");
            listener.arm(&mut broker, &spec_dirs);
        }
        let publisher = broker.into_publisher();

        let run = RunRequest {
            specs: validated.specs,
            runner: validated.runner,
            error_map: validated.error_map,
            parallel: self.flags.parallel,
            start_row: START_ROW,
        };
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            engine.run(run, publisher).await;
            tracing::debug!("Engine run finished");
        });

        let outcome = forwarder
            .await
            .map_err(|e| Error::Internal(format!("Forwarding task failed: {}", e)))?;
        Ok(RunOutcome::Forwarded(outcome))
    }
}
