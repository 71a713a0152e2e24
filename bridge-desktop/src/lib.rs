//! # Desktop Bridge Implementations
//!
//! Bridge implementations for desktop hosts (macOS, Windows, Linux) and for
//! integration tests.
//!
//! ## Overview
//!
//! Desktop builds have no platform service bus to register with, so services
//! are hosted in-process:
//! - `ServiceTransport` via [`LocalServiceTransport`]
//! - `ServiceEndpoint` via [`LocalEndpoint`], which also offers the client
//!   side: method calls, stream reads and broadcast subscriptions
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::LocalServiceTransport;
//! use serde_json::json;
//!
//! let transport = Arc::new(LocalServiceTransport::new());
//! shim.init(transport.as_ref())?;
//!
//! let service = transport.endpoint("moz-mobile-message-shim").unwrap();
//! let info = service.call("getSegmentInfoForText", json!(["hello"])).await?;
//! let threads = service.open_stream("getThreads", json!(null))?.collect_items().await?;
//! ```

mod loopback;

pub use loopback::{BroadcastMessage, LocalEndpoint, LocalServiceTransport};
