//! Interfaces of the components a run depends on but does not implement
//!
//! The validator parses and checks spec directories, the engine executes
//! what was validated and publishes lifecycle events, and run listeners
//! observe those events for their own bookkeeping.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::common::ValidationError;
use crate::event::{Broker, EventPublisher};

/// Build errors keyed by spec file, passed through to the engine untouched
pub type ErrorMap = HashMap<String, Vec<String>>;

/// Everything a successful validation hands to the engine
#[derive(Debug)]
pub struct Validated<S, R> {
    pub specs: S,
    pub runner: R,
    pub error_map: ErrorMap,
}

/// Checks spec directories before a run starts
pub trait Validator: Send + Sync + 'static {
    /// Parsed spec collection
    type Specs: Send + 'static;
    /// Handle to the test-code runner the specs execute against
    type Runner: Send + 'static;

    /// Validate the given spec directories
    ///
    /// An `Err` must carry at least one error; every error ends up in the
    /// `ErrorResult` sent to the client.
    fn validate(
        &self,
        spec_dirs: &[String],
    ) -> std::result::Result<Validated<Self::Specs, Self::Runner>, Vec<ValidationError>>;
}

/// Arguments of one engine run
#[derive(Debug)]
pub struct RunRequest<S, R> {
    pub specs: S,
    pub runner: R,
    pub error_map: ErrorMap,
    pub parallel: bool,
    pub start_row: usize,
}

/// Executes specs and publishes lifecycle events while doing so
///
/// `run` publishes `SuiteStart` first and `SuiteEnd` last. Publishing
/// waits for every subscriber, so the engine advances at the pace of its
/// slowest listener.
#[async_trait]
pub trait Engine<S, R>: Send + Sync + 'static
where
    S: Send + 'static,
    R: Send + 'static,
{
    async fn run(&self, run: RunRequest<S, R>, events: EventPublisher);
}

/// A listener armed on every run before the engine starts
pub trait RunListener: Send + Sync + 'static {
    /// Name used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Register subscriptions on the run's broker and start consuming them
    fn arm(&self, broker: &mut Broker, spec_dirs: &[String]);
}
