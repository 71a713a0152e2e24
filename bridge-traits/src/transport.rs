//! Service Transport Abstraction
//!
//! Request/response and publish/subscribe surface through which the core
//! exposes services to other components. The transport itself (postMessage,
//! IPC, in-process loopback) is supplied by the host.
//!
//! A service is obtained once per well-known name and then populated:
//!
//! ```ignore
//! let endpoint = transport.service("moz-mobile-message-shim")?;
//! endpoint.plugin(ServicePlugin::Stream)?;
//! endpoint.listen("moz-mobile-message-shim-channel")?;
//! endpoint.method("getMessage", handler)?;
//! endpoint.broadcast("message-sent", json!({ "message": msg }))?;
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::Result;
use crate::stream::JsonStreamSink;

/// Future returned by a method handler.
pub type MethodFuture = BoxFuture<'static, Result<Value>>;

/// Request/response handler: receives the JSON parameters, resolves with the
/// JSON result.
pub type MethodHandler = Arc<dyn Fn(Value) -> MethodFuture + Send + Sync>;

/// Streaming handler: receives the stream to fill and the JSON parameters.
/// Resolves once the stream reached a terminal state.
pub type StreamHandler = Arc<dyn Fn(JsonStreamSink, Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Optional transport capabilities a service can install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServicePlugin {
    /// Enables streaming operations (`stream` registrations).
    Stream,
}

impl fmt::Display for ServicePlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServicePlugin::Stream => f.write_str("stream"),
        }
    }
}

/// Registration surface of a single named service.
pub trait ServiceEndpoint: Send + Sync {
    /// Well-known name the service was registered under.
    fn name(&self) -> &str;

    /// Expose a request/response operation.
    fn method(&self, name: &str, handler: MethodHandler) -> Result<()>;

    /// Expose a streaming operation. Requires [`ServicePlugin::Stream`].
    fn stream(&self, name: &str, handler: StreamHandler) -> Result<()>;

    /// Publish an event to every client of the service.
    fn broadcast(&self, name: &str, payload: Value) -> Result<()>;

    fn plugin(&self, plugin: ServicePlugin) -> Result<()>;

    /// Accept client connections arriving on a broadcast channel.
    fn listen(&self, channel: &str) -> Result<()>;
}

/// Factory for named services.
pub trait ServiceTransport: Send + Sync {
    fn service(&self, name: &str) -> Result<Arc<dyn ServiceEndpoint>>;
}
