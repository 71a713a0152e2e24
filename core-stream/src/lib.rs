//! # Cursor Streaming
//!
//! Incremental delivery of large result sets.
//!
//! ## Overview
//!
//! The messaging platform enumerates threads and messages through pull-based
//! cursors, while clients of the shim consume push-based streams. This crate
//! joins the two:
//!
//! - **Adapter** (`adapter`): [`CursorStreamAdapter`] pumps one cursor into
//!   one stream, preserving order and ending with exactly one of close or
//!   abort
//! - **Channel** (`channel`): [`stream_channel`] builds a bounded,
//!   cancellable stream pair for in-process consumers
//! - **JSON** (`json`): [`JsonSink`] serializes typed items onto a bridge
//!   JSON stream

pub mod adapter;
pub mod channel;
pub mod json;

pub use adapter::{CursorStreamAdapter, StreamOutcome};
pub use channel::{stream_channel, ChannelSink, StreamAborted, StreamEvent, StreamReader};
pub use json::JsonSink;
