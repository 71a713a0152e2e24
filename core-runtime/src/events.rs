//! # Broadcast Events
//!
//! Native messaging events are re-emitted to bridge clients under their own
//! broadcast names with reshaped payloads. The mapping is a closed, total
//! function from [`MessagingEvent`] to [`BroadcastEvent`]:
//!
//! | native            | broadcast                | payload                     |
//! |-------------------|--------------------------|-----------------------------|
//! | `sending`         | `message-sending`        | `{ message }`               |
//! | `failed`          | `message-failed-to-send` | `{ message }`               |
//! | `deliverysuccess` | `message-delivered`      | `{ message }`               |
//! | `readsuccess`     | `message-read`           | `{ message }`               |
//! | `sent`            | `message-sent`           | `{ message }`               |
//! | `deleted`         | `threads-deleted`        | `{ ids: deletedThreadIds }` |
//!
//! Broadcasts can additionally be fanned out in-process through an
//! [`EventBus`] backed by a broadcast channel.
//!
//! ## Usage
//!
//! ```rust
//! use bridge_traits::MessagingEvent;
//! use core_runtime::events::{BroadcastEvent, EventBus};
//!
//! # core_async::runtime::block_on(async {
//! let bus = EventBus::new(16);
//! let mut sub = bus.subscribe();
//!
//! let event = BroadcastEvent::from(MessagingEvent::Deleted {
//!     deleted_thread_ids: vec![1, 2],
//!     deleted_message_ids: vec![],
//! });
//! assert_eq!(event.name(), "threads-deleted");
//!
//! bus.emit(event.clone()).ok();
//! assert_eq!(sub.recv().await.unwrap(), event);
//! # });
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events and may
//!   continue.
//! - **`RecvError::Closed`**: every bus handle was dropped; stop receiving.

use std::fmt;

use bridge_traits::{Message, MessagingEvent, MessagingEventKind, ThreadId};
use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Broadcast Event Types
// ============================================================================

/// An event as published to bridge clients.
///
/// Serializes as `{ "name": <broadcast name>, "payload": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload", rename_all = "kebab-case")]
pub enum BroadcastEvent {
    MessageSending { message: Message },
    MessageFailedToSend { message: Message },
    MessageDelivered { message: Message },
    MessageRead { message: Message },
    MessageSent { message: Message },
    ThreadsDeleted { ids: Vec<ThreadId> },
}

impl BroadcastEvent {
    /// Every broadcast name, in the order of [`MessagingEventKind::ALL`].
    pub const NAMES: [&'static str; 6] = [
        "message-sending",
        "message-failed-to-send",
        "message-delivered",
        "message-read",
        "message-sent",
        "threads-deleted",
    ];

    /// Name clients subscribe to.
    pub fn name(&self) -> &'static str {
        Self::name_for(self.source_kind())
    }

    /// Broadcast name a native event kind is published under.
    pub fn name_for(kind: MessagingEventKind) -> &'static str {
        match kind {
            MessagingEventKind::Sending => "message-sending",
            MessagingEventKind::Failed => "message-failed-to-send",
            MessagingEventKind::DeliverySuccess => "message-delivered",
            MessagingEventKind::ReadSuccess => "message-read",
            MessagingEventKind::Sent => "message-sent",
            MessagingEventKind::Deleted => "threads-deleted",
        }
    }

    /// Native event kind this broadcast originates from.
    pub fn source_kind(&self) -> MessagingEventKind {
        match self {
            BroadcastEvent::MessageSending { .. } => MessagingEventKind::Sending,
            BroadcastEvent::MessageFailedToSend { .. } => MessagingEventKind::Failed,
            BroadcastEvent::MessageDelivered { .. } => MessagingEventKind::DeliverySuccess,
            BroadcastEvent::MessageRead { .. } => MessagingEventKind::ReadSuccess,
            BroadcastEvent::MessageSent { .. } => MessagingEventKind::Sent,
            BroadcastEvent::ThreadsDeleted { .. } => MessagingEventKind::Deleted,
        }
    }

    /// Payload sent alongside the broadcast name.
    pub fn payload(&self) -> serde_json::Result<Value> {
        Ok(match self {
            BroadcastEvent::MessageSending { message }
            | BroadcastEvent::MessageFailedToSend { message }
            | BroadcastEvent::MessageDelivered { message }
            | BroadcastEvent::MessageRead { message }
            | BroadcastEvent::MessageSent { message } => {
                json!({ "message": serde_json::to_value(message)? })
            }
            BroadcastEvent::ThreadsDeleted { ids } => json!({ "ids": ids }),
        })
    }

    /// One-line summary logged when the event is published.
    pub fn description(&self) -> &'static str {
        match self {
            BroadcastEvent::MessageSending { .. } => "Message is being sent",
            BroadcastEvent::MessageFailedToSend { .. } => "Message failed to send",
            BroadcastEvent::MessageDelivered { .. } => "Message delivered",
            BroadcastEvent::MessageRead { .. } => "Message read by recipient",
            BroadcastEvent::MessageSent { .. } => "Message sent",
            BroadcastEvent::ThreadsDeleted { .. } => "Threads deleted",
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            BroadcastEvent::MessageFailedToSend { .. } => EventSeverity::Warning,
            BroadcastEvent::MessageSent { .. } | BroadcastEvent::ThreadsDeleted { .. } => {
                EventSeverity::Info
            }
            _ => EventSeverity::Debug,
        }
    }
}

impl From<MessagingEvent> for BroadcastEvent {
    fn from(event: MessagingEvent) -> Self {
        match event {
            MessagingEvent::Sending { message } => BroadcastEvent::MessageSending { message },
            MessagingEvent::Failed { message } => BroadcastEvent::MessageFailedToSend { message },
            MessagingEvent::DeliverySuccess { message } => {
                BroadcastEvent::MessageDelivered { message }
            }
            MessagingEvent::ReadSuccess { message } => BroadcastEvent::MessageRead { message },
            MessagingEvent::Sent { message } => BroadcastEvent::MessageSent { message },
            MessagingEvent::Deleted {
                deleted_thread_ids, ..
            } => BroadcastEvent::ThreadsDeleted {
                ids: deleted_thread_ids,
            },
        }
    }
}

/// How loudly a broadcast is logged; ordered from quietest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
}

// ============================================================================
// Event Bus
// ============================================================================

/// In-process fan-out of broadcast events.
///
/// Cloning the bus yields another publisher on the same channel. Each
/// `subscribe()` creates an independent receiver that sees future events
/// only.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers reached, or an error if there are
    /// none. Callers that do not care use `.ok()`.
    pub fn emit(&self, event: BroadcastEvent) -> Result<usize, SendError<BroadcastEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&BroadcastEvent) -> bool + Send + Sync>;

/// Receiver wrapper that skips events not matching a predicate.
///
/// ```rust
/// use core_runtime::events::{BroadcastEvent, EventBus, EventStream};
///
/// let bus = EventBus::default();
/// let deletions = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, BroadcastEvent::ThreadsDeleted { .. }));
/// ```
pub struct EventStream {
    receiver: Receiver<BroadcastEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<BroadcastEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&BroadcastEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &BroadcastEvent) -> bool {
        self.filter.as_ref().map_or(true, |f| f(event))
    }

    /// Receives the next matching event.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once every publisher is gone.
    pub async fn recv(&mut self) -> Result<BroadcastEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv). `None` when nothing
    /// matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<BroadcastEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
