//! Broadcast delivery of events to live host subscribers.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use callsim_contracts::{error::CallsimResult, event::TelephonyEvent};
use callsim_core::traits::EventPublisher;

/// Default number of events a slow subscriber may fall behind by.
pub const DEFAULT_CAPACITY: usize = 256;

/// Fans events out over a `tokio::sync::broadcast` channel.
///
/// Publishing never blocks. With no subscriber attached the event is
/// dropped and the publish still succeeds; a subscriber that falls more
/// than `capacity` events behind sees `RecvError::Lagged`.
#[derive(Clone)]
pub struct ChannelPublisher {
    sender: broadcast::Sender<TelephonyEvent>,
}

impl ChannelPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Attach a new host subscriber. It receives events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TelephonyEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChannelPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventPublisher for ChannelPublisher {
    fn publish(&self, event: TelephonyEvent) -> CallsimResult<()> {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receivers) => debug!(event_type = %event_type, receivers, "event broadcast"),
            Err(_) => debug!(event_type = %event_type, "no subscribers, event dropped"),
        }
        Ok(())
    }
}

/// Publishes every event to each inner publisher in order.
///
/// All publishers are attempted; the first failure is returned.
#[derive(Clone, Default)]
pub struct FanoutPublisher {
    publishers: Vec<Arc<dyn EventPublisher>>,
}

impl FanoutPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }
}

impl EventPublisher for FanoutPublisher {
    fn publish(&self, event: TelephonyEvent) -> CallsimResult<()> {
        let mut first_error = None;
        for publisher in &self.publishers {
            if let Err(err) = publisher.publish(event.clone()) {
                warn!(error = %err, "fan-out publisher failed");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
