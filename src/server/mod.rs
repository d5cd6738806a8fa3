//! Execution server - IPC listener serving the `Execute` call
//!
//! The server runs inside the engine's process. Each accepted connection
//! carries exactly one run: the client sends an `ExecutionRequest` and
//! receives the response stream until `SuiteEnd` or `ErrorResult`.
//! Connections are served concurrently, each with its own broker.

mod handler;

use std::sync::Arc;
use std::time::Duration;

use interprocess::local_socket::traits::tokio::Listener as ListenerTrait;

use crate::common::{config::Config, paths, Result};
use crate::execution::{Engine, Executor, Validator};
use crate::ipc::transport;
use crate::rerun::FailureRecorder;

pub use handler::handle_connection;

/// Execution server
pub struct Server<V, E> {
    executor: Arc<Executor<V, E>>,
    client_timeout: Duration,
}

impl<V, E> Server<V, E>
where
    V: Validator,
    E: Engine<V::Specs, V::Runner>,
{
    /// Build a server from the user's configuration file
    pub fn load(validator: V, engine: E) -> Result<Self> {
        let config = Config::load()?;
        Ok(Self::new(&config, validator, engine))
    }

    /// Build a server from configuration
    ///
    /// Arms the failed-scenario recorder when `[rerun]` is enabled.
    pub fn new(config: &Config, validator: V, engine: E) -> Self {
        let mut executor = Executor::new(validator, engine, config.execution.clone());
        if let Some(recorder) = FailureRecorder::from_config(&config.rerun) {
            executor = executor.with_listener(Arc::new(recorder));
        }
        Self::with_executor(executor, Duration::from_secs(config.server.client_timeout_secs))
    }

    pub fn with_executor(executor: Executor<V, E>, client_timeout: Duration) -> Self {
        Self {
            executor: Arc::new(executor),
            client_timeout,
        }
    }

    /// Accept connections until SIGINT/SIGTERM
    pub async fn run(&self) -> Result<()> {
        let listener = transport::create_listener().await?;
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            pid = std::process::id(),
            "Execution API listening on {}",
            paths::socket_name()
        );

        self.accept_loop(&listener).await?;

        paths::remove_socket()?;
        tracing::info!("Execution API shutdown complete");
        Ok(())
    }

    #[cfg(unix)]
    async fn accept_loop(&self, listener: &transport::platform::Listener) -> Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down");
                    return Ok(());
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT (Ctrl+C), shutting down");
                    return Ok(());
                }
                accept_result = listener.accept() => self.on_accept(accept_result),
            }
        }
    }

    #[cfg(not(unix))]
    async fn accept_loop(&self, listener: &transport::platform::Listener) -> Result<()> {
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    return Ok(());
                }
                accept_result = listener.accept() => self.on_accept(accept_result),
            }
        }
    }

    fn on_accept(&self, accept_result: std::io::Result<transport::Stream>) {
        match accept_result {
            Ok(stream) => {
                let executor = Arc::clone(&self.executor);
                let client_timeout = self.client_timeout;
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(&executor, stream, client_timeout).await {
                        tracing::error!("Error handling client: {}", e);
                    }
                });
            }
            Err(e) => {
                tracing::error!("Accept error: {}", e);
            }
        }
    }
}
