//! Messaging Platform Abstraction
//!
//! The device's native messaging API as seen by the core. Hosts implement
//! [`MessagingApi`] on top of their telephony stack (RIL, Android
//! `SmsManager`, a test double, ...). The core never talks to the platform
//! through anything else.
//!
//! # Events
//!
//! The platform reports message lifecycle changes through listeners
//! registered per [`MessagingEventKind`]. Listeners are invoked on whatever
//! thread the platform chooses and must not block.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cursor::{MessageCursor, ThreadCursor};
use crate::error::Result;
use crate::models::{
    Message, MessageFilter, MessageId, MmsParameters, SegmentInfo, SendOptions, ThreadId,
};

/// Native event names emitted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagingEventKind {
    Sending,
    Failed,
    DeliverySuccess,
    ReadSuccess,
    Sent,
    Deleted,
}

impl MessagingEventKind {
    /// Every native event, in registration order.
    pub const ALL: [MessagingEventKind; 6] = [
        MessagingEventKind::Sending,
        MessagingEventKind::Failed,
        MessagingEventKind::DeliverySuccess,
        MessagingEventKind::ReadSuccess,
        MessagingEventKind::Sent,
        MessagingEventKind::Deleted,
    ];

    /// The platform's own name for the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessagingEventKind::Sending => "sending",
            MessagingEventKind::Failed => "failed",
            MessagingEventKind::DeliverySuccess => "deliverysuccess",
            MessagingEventKind::ReadSuccess => "readsuccess",
            MessagingEventKind::Sent => "sent",
            MessagingEventKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for MessagingEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A native messaging event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagingEvent {
    Sending { message: Message },
    Failed { message: Message },
    DeliverySuccess { message: Message },
    ReadSuccess { message: Message },
    Sent { message: Message },
    Deleted {
        deleted_thread_ids: Vec<ThreadId>,
        deleted_message_ids: Vec<MessageId>,
    },
}

impl MessagingEvent {
    pub fn kind(&self) -> MessagingEventKind {
        match self {
            MessagingEvent::Sending { .. } => MessagingEventKind::Sending,
            MessagingEvent::Failed { .. } => MessagingEventKind::Failed,
            MessagingEvent::DeliverySuccess { .. } => MessagingEventKind::DeliverySuccess,
            MessagingEvent::ReadSuccess { .. } => MessagingEventKind::ReadSuccess,
            MessagingEvent::Sent { .. } => MessagingEventKind::Sent,
            MessagingEvent::Deleted { .. } => MessagingEventKind::Deleted,
        }
    }
}

/// Callback invoked for each native event of a registered kind.
pub type EventListener = Arc<dyn Fn(MessagingEvent) + Send + Sync>;

/// Native messaging API.
///
/// Enumeration entry points return a cursor synchronously-or-fail: an `Err`
/// means the enumeration could not even be started, while read failures
/// afterwards are reported by the cursor itself.
#[async_trait::async_trait]
pub trait MessagingApi: Send + Sync {
    /// Enumerate all threads, most recent first.
    fn get_threads(&self) -> Result<ThreadCursor>;

    /// Enumerate messages matching `filter`, in ascending timestamp order
    /// when `ascending` is true.
    fn get_messages(&self, filter: MessageFilter, ascending: bool) -> Result<MessageCursor>;

    async fn get_message(&self, id: MessageId) -> Result<Message>;

    /// Download a not-yet-retrieved MMS.
    async fn retrieve_mms(&self, id: MessageId) -> Result<Message>;

    /// Send an SMS to every recipient; one message per recipient.
    async fn send(
        &self,
        recipients: Vec<String>,
        body: String,
        options: SendOptions,
    ) -> Result<Vec<Message>>;

    async fn send_mms(&self, params: MmsParameters, options: SendOptions) -> Result<Message>;

    async fn mark_message_read(
        &self,
        id: MessageId,
        read: bool,
        send_read_report: bool,
    ) -> Result<bool>;

    /// Delete messages; the result carries one flag per id.
    async fn delete(&self, ids: Vec<MessageId>) -> Result<Vec<bool>>;

    async fn get_segment_info_for_text(&self, text: String) -> Result<SegmentInfo>;

    /// Register `listener` for events of `kind`.
    fn add_event_listener(&self, kind: MessagingEventKind, listener: EventListener) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        let names: Vec<_> = MessagingEventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "sending",
                "failed",
                "deliverysuccess",
                "readsuccess",
                "sent",
                "deleted"
            ]
        );
    }

    #[test]
    fn test_event_kind_serde_matches_platform_name() {
        for kind in MessagingEventKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
    }

    #[test]
    fn test_deleted_event_kind() {
        let event = MessagingEvent::Deleted {
            deleted_thread_ids: vec![1, 2, 3],
            deleted_message_ids: vec![],
        };
        assert_eq!(event.kind(), MessagingEventKind::Deleted);
    }
}
