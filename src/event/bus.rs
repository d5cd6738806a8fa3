//! # Per-run event broker with rendezvous delivery.
//!
//! A [`Broker`] is created when a run is admitted and dropped when it ends.
//! Listeners register the topics they care about and get an
//! [`EventReceiver`]; the broker is then frozen into an [`EventPublisher`]
//! that is handed to the engine.
//!
//! ## Architecture
//! ```text
//! Engine ──► EventPublisher ──► [slot] ──► EventReceiver (dispatcher)
//!                          └──► [slot] ──► EventReceiver (rerun listener)
//! ```
//!
//! ## Rules
//! - **Rendezvous**: `publish()` returns only after every subscriber of the
//!   event's topic has taken it out of its slot. The engine can never run
//!   ahead of what its listeners have observed.
//! - **Ordering**: subscribers are served in registration order, and each
//!   subscriber sees events in publish order.
//! - **Detach**: once a receiver is dropped, publishing to it is a no-op.
//! - **Per run**: brokers are never shared between runs.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::topic::{ExecutionEvent, Topic};

/// An event in flight together with the receiver's hand-off acknowledgement
type Envelope = (ExecutionEvent, oneshot::Sender<()>);

/// Topic → subscriber mapping for a single run
#[derive(Debug, Default)]
pub struct Broker {
    subscribers: HashMap<Topic, Vec<mpsc::Sender<Envelope>>>,
    registrations: usize,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscription for the given topics
    ///
    /// Repeated topics are only registered once.
    pub fn register(&mut self, topics: &[Topic]) -> EventReceiver {
        // One slot: together with the ack this makes the hand-off synchronous
        let (tx, rx) = mpsc::channel(1);
        let mut registered: Vec<Topic> = Vec::with_capacity(topics.len());
        for topic in topics {
            if registered.contains(topic) {
                continue;
            }
            registered.push(*topic);
            self.subscribers.entry(*topic).or_default().push(tx.clone());
        }
        self.registrations += 1;
        tracing::debug!(
            subscription = self.registrations,
            topics = ?registered,
            "Registered event subscription"
        );
        EventReceiver { rx }
    }

    /// Freeze the mapping and hand out the publishing side
    pub fn into_publisher(self) -> EventPublisher {
        EventPublisher {
            subscribers: Arc::new(self.subscribers),
        }
    }
}

/// Publishing side of a run's broker
///
/// Cheap to clone. When every clone is dropped, receivers observe the end
/// of the event source.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    subscribers: Arc<HashMap<Topic, Vec<mpsc::Sender<Envelope>>>>,
}

impl EventPublisher {
    /// Publish an event and wait until every subscriber of its topic took it
    ///
    /// Subscribers that are no longer listening are skipped.
    pub async fn publish(&self, event: ExecutionEvent) {
        let topic = event.topic();
        let Some(subscribers) = self.subscribers.get(&topic) else {
            return;
        };

        for tx in subscribers {
            let (ack_tx, ack_rx) = oneshot::channel();
            if tx.send((event.clone(), ack_tx)).await.is_err() {
                tracing::debug!(%topic, "Subscriber detached, dropping event");
                continue;
            }
            // Err means the receiver went away with the event still queued
            if ack_rx.await.is_err() {
                tracing::debug!(%topic, "Subscriber detached before receiving event");
            }
        }
    }
}

/// Receiving side of one subscription
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<Envelope>,
}

impl EventReceiver {
    /// Receive the next event, releasing the publisher waiting on it
    ///
    /// Returns `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<ExecutionEvent> {
        let (event, ack) = self.rx.recv().await?;
        let _ = ack.send(());
        Some(event)
    }
}
