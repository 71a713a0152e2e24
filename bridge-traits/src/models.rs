//! Messaging domain models shared by the platform API and the shim.
//!
//! All types serialize with camelCase field names so payloads match what
//! bridge clients expect on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a single SMS or MMS message.
pub type MessageId = u64;

/// Identifier of a conversation thread.
pub type ThreadId = u64;

/// Delivery state of a message as tracked by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryState {
    Received,
    Sending,
    Sent,
    Error,
    NotDownloaded,
}

/// Delivery report status for an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    NotApplicable,
    Success,
    Pending,
    Error,
}

/// Kind of the most recent message in a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Sms,
    Mms,
}

/// A conversation thread summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: ThreadId,
    pub participants: Vec<String>,
    /// Body of the last message, possibly truncated by the platform.
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub unread_count: u32,
    pub last_message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsMessage {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub delivery: DeliveryState,
    pub delivery_status: DeliveryStatus,
    pub sender: String,
    pub receiver: String,
    pub body: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_timestamp: Option<DateTime<Utc>>,
}

/// An MMS attachment reference. Content stays on the platform side; only
/// its location and type cross the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub location: String,
    pub content_type: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MmsMessage {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub delivery: DeliveryState,
    pub sender: String,
    pub receivers: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub smil: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub read: bool,
    pub read_report_requested: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
}

/// A message of either kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Sms(SmsMessage),
    Mms(MmsMessage),
}

impl Message {
    pub fn id(&self) -> MessageId {
        match self {
            Message::Sms(sms) => sms.id,
            Message::Mms(mms) => mms.id,
        }
    }

    pub fn thread_id(&self) -> ThreadId {
        match self {
            Message::Sms(sms) => sms.thread_id,
            Message::Mms(mms) => mms.thread_id,
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Sms(_) => MessageType::Sms,
            Message::Mms(_) => MessageType::Mms,
        }
    }

    pub fn delivery(&self) -> DeliveryState {
        match self {
            Message::Sms(sms) => sms.delivery,
            Message::Mms(mms) => mms.delivery,
        }
    }
}

/// Criteria for message enumeration.
///
/// The shim never inspects the filter; it is handed to the platform as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub numbers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<ThreadId>,
}

impl MessageFilter {
    pub fn for_thread(thread_id: ThreadId) -> Self {
        Self {
            thread_id: Some(thread_id),
            ..Self::default()
        }
    }
}

/// Options for outgoing messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
    /// SIM / service to send from; `None` uses the platform default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<u32>,
}

/// Parameters of an outgoing MMS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MmsParameters {
    #[serde(default)]
    pub receivers: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub smil: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// How a text would be split into SMS segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentInfo {
    pub segments: u32,
    pub chars_per_segment: u32,
    pub chars_available_in_last_segment: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_sms() -> SmsMessage {
        SmsMessage {
            id: 7,
            thread_id: 3,
            delivery: DeliveryState::Received,
            delivery_status: DeliveryStatus::NotApplicable,
            sender: "+15550001".to_string(),
            receiver: "+15550002".to_string(),
            body: "hello".to_string(),
            read: false,
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            sent_timestamp: None,
        }
    }

    #[test]
    fn test_message_serializes_with_type_tag() {
        let value = serde_json::to_value(Message::Sms(sample_sms())).unwrap();
        assert_eq!(value["type"], "sms");
        assert_eq!(value["threadId"], 3);
        assert_eq!(value["delivery"], "received");
        assert_eq!(value["deliveryStatus"], "not-applicable");
        assert!(value.get("sentTimestamp").is_none());
    }

    #[test]
    fn test_message_accessors() {
        let message = Message::Sms(sample_sms());
        assert_eq!(message.id(), 7);
        assert_eq!(message.thread_id(), 3);
        assert_eq!(message.message_type(), MessageType::Sms);
        assert_eq!(message.delivery(), DeliveryState::Received);
    }

    #[test]
    fn test_filter_defaults_from_sparse_json() {
        let filter: MessageFilter =
            serde_json::from_value(json!({ "threadId": 12, "read": false })).unwrap();
        assert_eq!(filter.thread_id, Some(12));
        assert_eq!(filter.read, Some(false));
        assert!(filter.numbers.is_empty());
        assert_eq!(filter.delivery, None);
    }

    #[test]
    fn test_empty_filter_serializes_to_empty_object() {
        let value = serde_json::to_value(MessageFilter::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_delivery_state_kebab_case() {
        let state: DeliveryState = serde_json::from_value(json!("not-downloaded")).unwrap();
        assert_eq!(state, DeliveryState::NotDownloaded);
    }
}
