//! Wire protocol of the shim service.
//!
//! Method parameters arrive as a JSON array of positional arguments, in the
//! order of the corresponding platform call:
//!
//! | method                  | arguments                               |
//! |-------------------------|-----------------------------------------|
//! | `getMessage`            | `[id]`                                  |
//! | `retrieveMMS`           | `[id]`                                  |
//! | `send`                  | `[recipients, body, options?]`          |
//! | `sendMMS`               | `[params, options?]`                    |
//! | `delete`                | `[id]` or `[[id, ...]]`                 |
//! | `markMessageRead`       | `[id, read, sendReadReport?]`           |
//! | `getSegmentInfoForText` | `[text]`                                |
//!
//! Stream parameters are a single object: `getMessages` takes
//! `{ filter, invert }`, `getThreads` takes nothing.

use bridge_traits::models::{MessageFilter, MessageId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, ShimError};

pub const GET_MESSAGE: &str = "getMessage";
pub const RETRIEVE_MMS: &str = "retrieveMMS";
pub const SEND: &str = "send";
pub const SEND_MMS: &str = "sendMMS";
pub const DELETE: &str = "delete";
pub const MARK_MESSAGE_READ: &str = "markMessageRead";
pub const GET_SEGMENT_INFO_FOR_TEXT: &str = "getSegmentInfoForText";

/// Every request/response method, in registration order.
pub const METHODS: [&str; 7] = [
    GET_MESSAGE,
    RETRIEVE_MMS,
    SEND,
    SEND_MMS,
    DELETE,
    MARK_MESSAGE_READ,
    GET_SEGMENT_INFO_FOR_TEXT,
];

pub const GET_THREADS: &str = "getThreads";
pub const GET_MESSAGES: &str = "getMessages";

/// Every streaming operation, in registration order.
pub const STREAMS: [&str; 2] = [GET_THREADS, GET_MESSAGES];

/// Options of a `getMessages` enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    /// Passed to the platform untouched.
    #[serde(default)]
    pub filter: MessageFilter,
    /// Newest first when true.
    #[serde(default)]
    pub invert: bool,
}

impl MessageQuery {
    pub fn new(filter: MessageFilter) -> Self {
        Self {
            filter,
            invert: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Direction handed to the platform.
    pub fn ascending(&self) -> bool {
        !self.invert
    }

    /// Decodes stream parameters; `null` means defaults.
    pub fn from_params(params: Value) -> Result<Self> {
        if params.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(params)
            .map_err(|e| ShimError::invalid_request(GET_MESSAGES, e.to_string()))
    }
}

/// `delete` accepts a single id or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MessageIds {
    One(MessageId),
    Many(Vec<MessageId>),
}

impl From<MessageIds> for Vec<MessageId> {
    fn from(ids: MessageIds) -> Self {
        match ids {
            MessageIds::One(id) => vec![id],
            MessageIds::Many(ids) => ids,
        }
    }
}

/// Trailing `sendReadReport` argument of `markMessageRead`.
///
/// Only a literal `true` requests a report. Clients also pass `null` or an
/// options object in that position; both mean no report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadReport(pub bool);

impl<'de> Deserialize<'de> for ReadReport {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ReadReport(value.as_bool().unwrap_or(false)))
    }
}

/// Decodes the positional arguments of `method`.
///
/// Trailing optional arguments may be omitted; missing ones are padded with
/// `null` before decoding so `Option`/`Default` fields pick them up.
pub fn decode_args<T: DeserializeOwned>(method: &str, params: Value, arity: usize) -> Result<T> {
    let mut args = match params {
        Value::Array(args) => args,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    if args.len() > arity {
        return Err(ShimError::invalid_request(
            method,
            format!("expected at most {} arguments, got {}", arity, args.len()),
        ));
    }
    args.resize(arity, Value::Null);

    serde_json::from_value(Value::Array(args))
        .map_err(|e| ShimError::invalid_request(method, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::models::SendOptions;
    use serde_json::json;

    #[test]
    fn test_decode_positional_args() {
        let (recipients, body, options): (Vec<String>, String, Option<SendOptions>) =
            decode_args(SEND, json!([["123"], "body", {}]), 3).unwrap();
        assert_eq!(recipients, vec!["123"]);
        assert_eq!(body, "body");
        assert_eq!(options, Some(SendOptions::default()));
    }

    #[test]
    fn test_missing_trailing_args_become_none() {
        let (recipients, body, options): (Vec<String>, String, Option<SendOptions>) =
            decode_args(SEND, json!([["123"], "body"]), 3).unwrap();
        assert_eq!((recipients.len(), body.as_str(), options), (1, "body", None));
    }

    #[test]
    fn test_read_report_is_lenient() {
        let decode = |params| {
            decode_args::<(MessageId, bool, ReadReport)>(MARK_MESSAGE_READ, params, 3).unwrap()
        };
        assert_eq!(decode(json!([1, true, {}])), (1, true, ReadReport(false)));
        assert_eq!(decode(json!([1, true])), (1, true, ReadReport(false)));
        assert_eq!(decode(json!([1, false, true])), (1, false, ReadReport(true)));
    }

    #[test]
    fn test_mms_params_accept_empty_object() {
        let (params, options): (bridge_traits::models::MmsParameters, Option<SendOptions>) =
            decode_args(SEND_MMS, json!([{}, {}]), 2).unwrap();
        assert!(params.receivers.is_empty());
        assert_eq!(options, Some(SendOptions::default()));
    }

    #[test]
    fn test_bare_value_is_single_argument() {
        let (id,): (MessageId,) = decode_args(GET_MESSAGE, json!(9), 1).unwrap();
        assert_eq!(id, 9);
    }

    #[test]
    fn test_too_many_args_rejected() {
        let err = decode_args::<(MessageId,)>(GET_MESSAGE, json!([1, 2]), 1).unwrap_err();
        assert!(matches!(err, ShimError::InvalidRequest { ref method, .. } if method == GET_MESSAGE));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = decode_args::<(MessageId,)>(GET_MESSAGE, json!(["one"]), 1).unwrap_err();
        assert!(err.to_string().contains("getMessage"));
    }

    #[test]
    fn test_delete_ids_one_or_many() {
        let (one,): (MessageIds,) = decode_args(DELETE, json!([4]), 1).unwrap();
        let (many,): (MessageIds,) = decode_args(DELETE, json!([[4, 5]]), 1).unwrap();
        assert_eq!(Vec::from(one), vec![4]);
        assert_eq!(Vec::from(many), vec![4, 5]);
    }

    #[test]
    fn test_message_query_params() {
        let query = MessageQuery::from_params(json!({ "filter": { "threadId": 2 }, "invert": true }))
            .unwrap();
        assert_eq!(query.filter, MessageFilter::for_thread(2));
        assert!(!query.ascending());

        assert_eq!(MessageQuery::from_params(Value::Null).unwrap(), MessageQuery::default());
        assert!(MessageQuery::default().ascending());
    }

    #[test]
    fn test_message_query_rejects_garbage() {
        assert!(MessageQuery::from_params(json!({ "invert": "yes" })).is_err());
    }
}
