//! # Mobile Message Shim
//!
//! Exposes a [`MessagingApi`] to bridge clients as the service
//! `moz-mobile-message-shim`.
//!
//! ## Surface
//!
//! - **Methods**: thin forwards to the platform (see [`protocol`](crate::protocol)
//!   for argument layouts). `retrieveMMS` resolves with `true` instead of the
//!   downloaded message.
//! - **Streams**: `getThreads` and `getMessages` enumerate through a
//!   [`CursorStreamAdapter`], one adapter per request.
//! - **Broadcasts**: every native messaging event is re-published under its
//!   broadcast name (see [`BroadcastEvent`]) and mirrored on an in-process
//!   [`EventBus`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ShimConfig;
//! use core_service::MobileMessageShim;
//!
//! let shim = MobileMessageShim::new(platform_api, ShimConfig::default())?;
//! shim.init(transport.as_ref())?;
//!
//! let mut deletions = shim.subscribe();
//! while let Ok(event) = deletions.recv().await {
//!     tracing::info!(name = event.name(), "Broadcast");
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use bridge_traits::messaging::{EventListener, MessagingApi, MessagingEvent, MessagingEventKind};
use bridge_traits::models::{
    Message, MessageId, MmsParameters, SegmentInfo, SendOptions, Thread,
};
use bridge_traits::stream::{JsonStreamSink, StreamSink};
use bridge_traits::transport::{
    MethodHandler, ServiceEndpoint, ServicePlugin, ServiceTransport, StreamHandler,
};
use core_runtime::config::ShimConfig;
use core_runtime::events::{BroadcastEvent, EventBus, EventSeverity, EventStream};
use core_stream::{CursorStreamAdapter, JsonSink, StreamOutcome};
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ShimError};
use crate::protocol::{self, MessageIds, MessageQuery, ReadReport};

/// The shim service. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct MobileMessageShim {
    inner: Arc<ShimInner>,
}

struct ShimInner {
    api: Arc<dyn MessagingApi>,
    config: ShimConfig,
    events: EventBus,
    registered: AtomicBool,
}

impl MobileMessageShim {
    /// Creates an unregistered shim.
    ///
    /// Fails with [`ShimError::Runtime`] if `config` does not validate.
    pub fn new(api: Arc<dyn MessagingApi>, config: ShimConfig) -> Result<Self> {
        config.validate()?;
        let events = EventBus::new(config.event_buffer_size);
        Ok(Self {
            inner: Arc::new(ShimInner {
                api,
                config,
                events,
                registered: AtomicBool::new(false),
            }),
        })
    }

    pub fn config(&self) -> &ShimConfig {
        &self.inner.config
    }

    /// Subscribe to broadcasts published from now on.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.inner.events.subscribe())
    }

    /// Registers the service with `transport` and starts relaying platform
    /// events.
    ///
    /// A shim registers once; a second call fails with
    /// [`ShimError::InitializationFailed`].
    #[instrument(skip(self, transport), fields(service = %self.inner.config.service_name))]
    pub fn init(&self, transport: &dyn ServiceTransport) -> Result<Arc<dyn ServiceEndpoint>> {
        if self
            .inner
            .registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ShimError::InitializationFailed(format!(
                "service '{}' is already registered",
                self.inner.config.service_name
            )));
        }

        match self.register(transport) {
            Ok(endpoint) => {
                info!("Mobile message shim registered");
                Ok(endpoint)
            }
            Err(e) => {
                self.inner.registered.store(false, Ordering::Release);
                Err(ShimError::InitializationFailed(e.to_string()))
            }
        }
    }

    fn register(&self, transport: &dyn ServiceTransport) -> Result<Arc<dyn ServiceEndpoint>> {
        let config = &self.inner.config;
        let endpoint = transport.service(&config.service_name)?;

        endpoint.plugin(ServicePlugin::Stream)?;
        for channel in config.channels() {
            endpoint.listen(&channel)?;
        }

        for method in protocol::METHODS {
            let shim = self.clone();
            let handler: MethodHandler = Arc::new(move |params: Value| {
                let shim = shim.clone();
                async move {
                    shim.dispatch(method, params)
                        .await
                        .map_err(ShimError::into_bridge)
                }
                .boxed()
            });
            endpoint.method(method, handler)?;
        }

        let shim = self.clone();
        let threads: StreamHandler = Arc::new(move |sink: JsonStreamSink, _params: Value| {
            let shim = shim.clone();
            async move {
                shim.get_threads(JsonSink::<Thread>::new(sink)).await;
            }
            .boxed()
        });
        endpoint.stream(protocol::GET_THREADS, threads)?;

        let shim = self.clone();
        let messages: StreamHandler = Arc::new(move |sink: JsonStreamSink, params: Value| {
            let shim = shim.clone();
            async move {
                shim.serve_messages(sink, params).await;
            }
            .boxed()
        });
        endpoint.stream(protocol::GET_MESSAGES, messages)?;

        for kind in MessagingEventKind::ALL {
            self.inner
                .api
                .add_event_listener(kind, self.relay(Arc::downgrade(&endpoint)))?;
        }

        Ok(endpoint)
    }

    /// Listener re-publishing native events. Holds the endpoint weakly so the
    /// platform's listener table does not keep the service alive.
    fn relay(&self, endpoint: Weak<dyn ServiceEndpoint>) -> EventListener {
        let events = self.inner.config.enable_event_bus.then(|| self.inner.events.clone());
        Arc::new(move |event: MessagingEvent| {
            let Some(endpoint) = endpoint.upgrade() else {
                debug!(kind = %event.kind(), "Service gone, dropping event");
                return;
            };
            publish(endpoint.as_ref(), events.as_ref(), event);
        })
    }

    /// Runs a request/response method by its wire name.
    #[instrument(skip(self, params))]
    pub async fn dispatch(&self, method: &str, params: Value) -> Result<Value> {
        let result = match method {
            protocol::GET_MESSAGE => {
                let (id,) = protocol::decode_args::<(MessageId,)>(method, params, 1)?;
                serde_json::to_value(self.get_message(id).await?)?
            }
            protocol::RETRIEVE_MMS => {
                let (id,) = protocol::decode_args::<(MessageId,)>(method, params, 1)?;
                Value::Bool(self.retrieve_mms(id).await?)
            }
            protocol::SEND => {
                let (recipients, body, options) = protocol::decode_args::<(
                    Vec<String>,
                    String,
                    Option<SendOptions>,
                )>(method, params, 3)?;
                let sent = self
                    .send(recipients, body, options.unwrap_or_default())
                    .await?;
                serde_json::to_value(sent)?
            }
            protocol::SEND_MMS => {
                let (mms, options) = protocol::decode_args::<(MmsParameters, Option<SendOptions>)>(
                    method, params, 2,
                )?;
                serde_json::to_value(self.send_mms(mms, options.unwrap_or_default()).await?)?
            }
            protocol::DELETE => {
                let (ids,) = protocol::decode_args::<(MessageIds,)>(method, params, 1)?;
                serde_json::to_value(self.delete(ids.into()).await?)?
            }
            protocol::MARK_MESSAGE_READ => {
                let (id, read, ReadReport(send_read_report)) =
                    protocol::decode_args::<(MessageId, bool, ReadReport)>(method, params, 3)?;
                Value::Bool(self.mark_message_read(id, read, send_read_report).await?)
            }
            protocol::GET_SEGMENT_INFO_FOR_TEXT => {
                let (text,) = protocol::decode_args::<(String,)>(method, params, 1)?;
                serde_json::to_value(self.get_segment_info_for_text(text).await?)?
            }
            unknown => {
                return Err(ShimError::invalid_request(unknown, "unknown method"));
            }
        };
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn get_message(&self, id: MessageId) -> Result<Message> {
        Ok(self.inner.api.get_message(id).await?)
    }

    /// Downloads a pending MMS. Resolves with `true`; the message itself
    /// reaches clients through the platform's own events.
    #[instrument(skip(self))]
    pub async fn retrieve_mms(&self, id: MessageId) -> Result<bool> {
        self.inner.api.retrieve_mms(id).await?;
        Ok(true)
    }

    #[instrument(skip_all, fields(recipients = recipients.len()))]
    pub async fn send(
        &self,
        recipients: Vec<String>,
        body: String,
        options: SendOptions,
    ) -> Result<Vec<Message>> {
        Ok(self.inner.api.send(recipients, body, options).await?)
    }

    #[instrument(skip_all, fields(receivers = params.receivers.len(), attachments = params.attachments.len()))]
    pub async fn send_mms(&self, params: MmsParameters, options: SendOptions) -> Result<Message> {
        Ok(self.inner.api.send_mms(params, options).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, ids: Vec<MessageId>) -> Result<Vec<bool>> {
        Ok(self.inner.api.delete(ids).await?)
    }

    #[instrument(skip(self))]
    pub async fn mark_message_read(
        &self,
        id: MessageId,
        read: bool,
        send_read_report: bool,
    ) -> Result<bool> {
        Ok(self
            .inner
            .api
            .mark_message_read(id, read, send_read_report)
            .await?)
    }

    #[instrument(skip_all, fields(len = text.chars().count()))]
    pub async fn get_segment_info_for_text(&self, text: String) -> Result<SegmentInfo> {
        Ok(self.inner.api.get_segment_info_for_text(text).await?)
    }

    /// Streams every thread into `stream`.
    #[instrument(skip_all)]
    pub async fn get_threads<S>(&self, stream: S) -> StreamOutcome
    where
        S: StreamSink<Thread>,
    {
        let api = Arc::clone(&self.inner.api);
        CursorStreamAdapter::new("threads")
            .start(move || api.get_threads(), stream)
            .await
    }

    /// Streams the messages matching `query` into `stream`.
    #[instrument(skip_all, fields(invert = query.invert))]
    pub async fn get_messages<S>(&self, stream: S, query: MessageQuery) -> StreamOutcome
    where
        S: StreamSink<Message>,
    {
        let api = Arc::clone(&self.inner.api);
        let ascending = query.ascending();
        let filter = query.filter;
        CursorStreamAdapter::new("messages")
            .start(move || api.get_messages(filter, ascending), stream)
            .await
    }

    async fn serve_messages(&self, mut sink: JsonStreamSink, params: Value) -> StreamOutcome {
        match MessageQuery::from_params(params) {
            Ok(query) => self.get_messages(JsonSink::<Message>::new(sink), query).await,
            Err(e) => {
                warn!("Rejecting getMessages request: {}", e);
                if let Err(e) = sink.abort().await {
                    debug!("Failed to abort messages stream: {}", e);
                }
                StreamOutcome::Aborted
            }
        }
    }

    /// Publishes `event` as if the platform had just emitted it.
    pub fn publish(&self, endpoint: &dyn ServiceEndpoint, event: MessagingEvent) {
        let events = self.inner.config.enable_event_bus.then_some(&self.inner.events);
        publish(endpoint, events, event);
    }
}

fn publish(endpoint: &dyn ServiceEndpoint, events: Option<&EventBus>, event: MessagingEvent) {
    let broadcast = BroadcastEvent::from(event);
    let name = broadcast.name();

    match broadcast.severity() {
        EventSeverity::Debug => debug!(name, "{}", broadcast.description()),
        EventSeverity::Info => info!(name, "{}", broadcast.description()),
        EventSeverity::Warning => warn!(name, "{}", broadcast.description()),
    }

    match broadcast.payload() {
        Ok(payload) => {
            if let Err(e) = endpoint.broadcast(name, payload) {
                warn!(name, "Failed to broadcast event: {}", e);
            }
        }
        Err(e) => warn!(name, "Failed to encode event payload: {}", e),
    }

    if let Some(events) = events {
        events.emit(broadcast).ok();
    }
}

impl std::fmt::Debug for MobileMessageShim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MobileMessageShim")
            .field("config", &self.inner.config)
            .field("registered", &self.inner.registered.load(Ordering::Acquire))
            .finish()
    }
}
