//! Typed writes onto JSON streams.
//!
//! Bridge transports hand streaming handlers a [`JsonStreamSink`]. Wrapping
//! it in a [`JsonSink`] lets producers write domain values directly; each
//! item is serialized on the way through.

use std::marker::PhantomData;

use bridge_traits::error::Result;
use bridge_traits::stream::{JsonStreamSink, StreamSink};
use core_async::sync::CancellationToken;
use serde::Serialize;

pub struct JsonSink<T> {
    inner: JsonStreamSink,
    _item: PhantomData<fn(T)>,
}

impl<T> JsonSink<T> {
    pub fn new(inner: JsonStreamSink) -> Self {
        Self {
            inner,
            _item: PhantomData,
        }
    }

    pub fn into_inner(self) -> JsonStreamSink {
        self.inner
    }
}

#[async_trait::async_trait]
impl<T> StreamSink<T> for JsonSink<T>
where
    T: Serialize + Send + 'static,
{
    /// Fails with [`BridgeError::Serialization`](bridge_traits::BridgeError::Serialization)
    /// if the item cannot be represented as JSON.
    async fn write(&mut self, item: T) -> Result<()> {
        let value = serde_json::to_value(&item)?;
        self.inner.write(value).await
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }

    async fn abort(&mut self) -> Result<()> {
        self.inner.abort().await
    }

    fn cancellation(&self) -> CancellationToken {
        self.inner.cancellation()
    }
}
