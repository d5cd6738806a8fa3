//! Execution API - streams test-run lifecycle events to a remote client
//!
//! The engine publishes lifecycle events on a per-run broker; this library
//! translates them into wire responses and delivers them, strictly ordered
//! and with backpressure, over one server-streaming connection.

pub mod cli;
pub mod commands;
pub mod common;
pub mod event;
pub mod execution;
pub mod ipc;
pub mod model;
pub mod rerun;
pub mod server;

// Re-export commonly used types
pub use common::{Error, Result, ValidationError};
pub use execution::{Engine, Executor, RunListener, Validator};
pub use ipc::protocol::{ExecutionResponse, ResponseType};
