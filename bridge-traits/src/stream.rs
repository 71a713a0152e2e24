//! Push-oriented stream abstraction.
//!
//! A [`StreamSink`] is the producer side of a managed output stream handed to
//! a streaming operation by the bridge. The producer appends items with
//! [`write`](StreamSink::write) and finishes with exactly one of
//! [`close`](StreamSink::close) (success) or [`abort`](StreamSink::abort)
//! (failure). The consumer may request cancellation at any time through the
//! token returned by [`cancellation`](StreamSink::cancellation).
//!
//! Sinks do not guard against a second terminal call; producers own that
//! invariant.

use core_async::sync::CancellationToken;

use crate::error::Result;

#[async_trait::async_trait]
pub trait StreamSink<T: Send + 'static>: Send {
    /// Append an item. May wait for the consumer to make room.
    ///
    /// Fails with [`BridgeError::StreamClosed`](crate::BridgeError::StreamClosed)
    /// once the consumer has gone away.
    async fn write(&mut self, item: T) -> Result<()>;

    /// Signal successful completion.
    async fn close(&mut self) -> Result<()>;

    /// Signal abnormal termination. No error detail crosses the stream.
    async fn abort(&mut self) -> Result<()>;

    /// Token the consumer cancels to stop the producer.
    fn cancellation(&self) -> CancellationToken;
}

#[async_trait::async_trait]
impl<T, S> StreamSink<T> for Box<S>
where
    T: Send + 'static,
    S: StreamSink<T> + ?Sized,
{
    async fn write(&mut self, item: T) -> Result<()> {
        (**self).write(item).await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }

    async fn abort(&mut self) -> Result<()> {
        (**self).abort().await
    }

    fn cancellation(&self) -> CancellationToken {
        (**self).cancellation()
    }
}

/// Boxed JSON stream as handed to bridge stream handlers.
pub type JsonStreamSink = Box<dyn StreamSink<serde_json::Value>>;
