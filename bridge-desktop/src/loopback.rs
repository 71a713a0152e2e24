//! In-process service transport.
//!
//! Services registered through [`LocalServiceTransport`] live in the same
//! process as their clients. Clients call methods, open streams and
//! subscribe to broadcasts directly on the [`LocalEndpoint`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::transport::{
    MethodHandler, ServiceEndpoint, ServicePlugin, ServiceTransport, StreamHandler,
};
use core_async::sync::broadcast;
use core_async::task;
use core_stream::{stream_channel, StreamReader};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

const DEFAULT_STREAM_BUFFER: usize = 32;
const BROADCAST_BUFFER: usize = 64;

/// A broadcast as seen by local subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastMessage {
    pub name: String,
    pub payload: Value,
}

/// Transport keeping every service in a local registry.
///
/// Asking twice for the same name yields the same endpoint.
pub struct LocalServiceTransport {
    services: RwLock<HashMap<String, Arc<LocalEndpoint>>>,
    stream_buffer: usize,
}

impl LocalServiceTransport {
    pub fn new() -> Self {
        Self::with_stream_buffer(DEFAULT_STREAM_BUFFER)
    }

    /// Streams opened on this transport buffer up to `size` items.
    /// Zero is treated as one.
    pub fn with_stream_buffer(size: usize) -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            stream_buffer: size.max(1),
        }
    }

    /// Client-side handle of a registered service.
    pub fn endpoint(&self, name: &str) -> Option<Arc<LocalEndpoint>> {
        self.services.read().get(name).cloned()
    }

    pub fn service_names(&self) -> Vec<String> {
        self.services.read().keys().cloned().collect()
    }
}

impl Default for LocalServiceTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceTransport for LocalServiceTransport {
    fn service(&self, name: &str) -> Result<Arc<dyn ServiceEndpoint>> {
        let endpoint: Arc<dyn ServiceEndpoint> = self
            .services
            .write()
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(service = name, "Registering local service");
                Arc::new(LocalEndpoint::new(name, self.stream_buffer))
            })
            .clone();
        Ok(endpoint)
    }
}

#[derive(Default)]
struct Registry {
    methods: HashMap<String, MethodHandler>,
    streams: HashMap<String, StreamHandler>,
    plugins: HashSet<ServicePlugin>,
    channels: Vec<String>,
}

/// A service living in this process.
pub struct LocalEndpoint {
    name: String,
    registry: RwLock<Registry>,
    broadcasts: broadcast::Sender<BroadcastMessage>,
    stream_buffer: usize,
}

impl LocalEndpoint {
    fn new(name: &str, stream_buffer: usize) -> Self {
        let (broadcasts, _) = broadcast::channel(BROADCAST_BUFFER);
        Self {
            name: name.to_string(),
            registry: RwLock::new(Registry::default()),
            broadcasts,
            stream_buffer,
        }
    }

    /// Invokes a method and waits for its result.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let handler = self
            .registry
            .read()
            .methods
            .get(method)
            .cloned()
            .ok_or_else(|| {
                BridgeError::NotAvailable(format!("{}::{}", self.name, method))
            })?;
        trace!(service = %self.name, method, "Calling method");
        handler(params).await
    }

    /// Opens a stream. The handler runs as a background task filling the
    /// returned reader; dropping the reader cancels it.
    ///
    /// Must be called from within a runtime.
    pub fn open_stream(&self, name: &str, params: Value) -> Result<StreamReader<Value>> {
        let handler = {
            let registry = self.registry.read();
            if !registry.plugins.contains(&ServicePlugin::Stream) {
                return Err(BridgeError::NotAvailable(format!(
                    "{} has no stream plugin",
                    self.name
                )));
            }
            registry.streams.get(name).cloned().ok_or_else(|| {
                BridgeError::NotAvailable(format!("{}::{}", self.name, name))
            })?
        };

        let (sink, reader) = stream_channel(self.stream_buffer);
        trace!(service = %self.name, stream = name, "Opening stream");
        task::spawn(handler(Box::new(sink), params));
        Ok(reader)
    }

    /// Receives every broadcast published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastMessage> {
        self.broadcasts.subscribe()
    }

    pub fn channels(&self) -> Vec<String> {
        self.registry.read().channels.clone()
    }

    pub fn has_plugin(&self, plugin: ServicePlugin) -> bool {
        self.registry.read().plugins.contains(&plugin)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<_> = self.registry.read().methods.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered stream names, sorted.
    pub fn streams(&self) -> Vec<String> {
        let mut names: Vec<_> = self.registry.read().streams.keys().cloned().collect();
        names.sort();
        names
    }
}

impl ServiceEndpoint for LocalEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn method(&self, name: &str, handler: MethodHandler) -> Result<()> {
        let mut registry = self.registry.write();
        if registry.methods.contains_key(name) {
            return Err(BridgeError::OperationFailed(format!(
                "method '{}' already registered on {}",
                name, self.name
            )));
        }
        registry.methods.insert(name.to_string(), handler);
        Ok(())
    }

    fn stream(&self, name: &str, handler: StreamHandler) -> Result<()> {
        let mut registry = self.registry.write();
        if !registry.plugins.contains(&ServicePlugin::Stream) {
            return Err(BridgeError::NotAvailable(format!(
                "stream '{}' needs the {} plugin",
                name,
                ServicePlugin::Stream
            )));
        }
        if registry.streams.contains_key(name) {
            return Err(BridgeError::OperationFailed(format!(
                "stream '{}' already registered on {}",
                name, self.name
            )));
        }
        registry.streams.insert(name.to_string(), handler);
        Ok(())
    }

    fn broadcast(&self, name: &str, payload: Value) -> Result<()> {
        let message = BroadcastMessage {
            name: name.to_string(),
            payload,
        };
        if self.broadcasts.send(message).is_err() {
            trace!(service = %self.name, event = name, "Broadcast without subscribers");
        }
        Ok(())
    }

    fn plugin(&self, plugin: ServicePlugin) -> Result<()> {
        self.registry.write().plugins.insert(plugin);
        Ok(())
    }

    fn listen(&self, channel: &str) -> Result<()> {
        let mut registry = self.registry.write();
        if !registry.channels.iter().any(|c| c == channel) {
            debug!(service = %self.name, channel, "Listening");
            registry.channels.push(channel.to_string());
        }
        Ok(())
    }
}
