//! # Host Bridge Traits
//!
//! Contracts between the mobile message core and the host it runs in.
//!
//! ## Overview
//!
//! The core never reaches into global registries. Everything it needs from
//! the outside world arrives as an implementation of one of these traits,
//! injected at construction time.
//!
//! ## Traits
//!
//! ### Platform
//! - [`MessagingApi`](messaging::MessagingApi) - Native SMS/MMS stack: enumeration cursors,
//!   request/response operations, event listeners
//! - [`Cursor`](cursor::Cursor) - Paginated, pull-based enumeration
//!
//! ### Bridge
//! - [`ServiceTransport`](transport::ServiceTransport) - Named service registration
//! - [`ServiceEndpoint`](transport::ServiceEndpoint) - Methods, streams, broadcasts, channels
//! - [`StreamSink`](stream::StreamSink) - Producer side of a managed output stream
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward diagnostics to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform-specific failures into
//! [`BridgeError::Platform`] and keep the platform's error name intact;
//! diagnostics downstream rely on it.
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync` (cursors and sinks only `Send`, as they
//! are owned by a single enumeration) so implementations can be shared
//! across async tasks.

pub mod cursor;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod stream;
pub mod transport;

pub use error::{BridgeError, Result};

// Re-export commonly used types
pub use cursor::{Cursor, CursorError, CursorStep, MessageCursor, ScriptedCursor, ThreadCursor};
pub use logging::{LogEntry, LogLevel, LoggerSink, MemoryLogger, StderrLogger};
pub use messaging::{EventListener, MessagingApi, MessagingEvent, MessagingEventKind};
pub use models::{
    Attachment, DeliveryState, DeliveryStatus, Message, MessageFilter, MessageId, MessageType,
    MmsMessage, MmsParameters, SegmentInfo, SendOptions, SmsMessage, Thread, ThreadId,
};
pub use stream::{JsonStreamSink, StreamSink};
pub use transport::{
    MethodFuture, MethodHandler, ServiceEndpoint, ServicePlugin, ServiceTransport, StreamHandler,
};
