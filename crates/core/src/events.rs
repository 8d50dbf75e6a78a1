//! Event System
//! 
//! Provides a pub/sub event bus so screens and loggers can observe toggle sessions.

use parking_lot::RwLock;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// Events emitted by toggle sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A toggle session was opened for an app
    SessionStarted { app: String },
    /// A permission group was granted or revoked through the backend
    PermissionToggled { app: String, group: String, granted: bool },
    /// A revoke is waiting for the user to confirm
    ConfirmationRequested { app: String, group: String, reason: String },
    /// The user dismissed a confirmation prompt
    ConfirmationCancelled { app: String, group: String },
    /// The grant backend rejected a toggle
    ToggleFailed { app: String, group: String, message: String },
    /// A toggle session was closed and its audit log flushed
    SessionEnded { app: String, toggled: Vec<String> },
}

/// Subscriber handle for receiving events
#[derive(Clone)]
pub struct EventSubscription {
    receiver: Receiver<Event>,
}

impl EventSubscription {
    /// Receive the next event (blocking)
    pub fn recv(&self) -> Result<Event, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Result<Event, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain every event already queued
    pub fn drain(&self) -> Vec<Event> {
        self.receiver.try_iter().collect()
    }
}

/// Event bus for publish/subscribe pattern
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<Event>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> EventSubscription {
        let (sender, receiver) = unbounded();
        self.subscribers.write().push(sender);
        EventSubscription { receiver }
    }

    /// Emit an event to all subscribers, dropping the ones that hung up
    pub fn emit(&self, event: Event) -> usize {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
        let delivered = subscribers.len();

        debug!("Event {:?} delivered to {} subscribers", event, delivered);
        delivered
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
