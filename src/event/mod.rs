//! Engine events and the per-run broker that delivers them

mod bus;
mod topic;

pub use bus::{Broker, EventPublisher, EventReceiver};
pub use topic::{ExecutionEvent, Topic};
