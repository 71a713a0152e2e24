//! Channel-backed streams.
//!
//! [`stream_channel`] creates a connected pair: a [`ChannelSink`] for the
//! producer and a [`StreamReader`] for the consumer. Items travel through a
//! bounded channel, so a producer that runs ahead of its consumer waits in
//! [`write`](StreamSink::write) until there is room again.
//!
//! Dropping the reader cancels the stream; the producer then sees
//! [`BridgeError::StreamClosed`] on its next write.

use std::pin::Pin;
use std::task::{Context, Poll};

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::stream::StreamSink;
use core_async::sync::{mpsc, CancellationToken};
use futures::Stream;
use thiserror::Error;

/// The producer ended the stream with `abort`, or vanished without a
/// terminal signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Stream aborted by producer")]
pub struct StreamAborted;

enum Frame<T> {
    Item(T),
    Close,
    Abort,
}

/// Creates a stream whose channel holds at most `capacity` pending items.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn stream_channel<T>(capacity: usize) -> (ChannelSink<T>, StreamReader<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    let token = CancellationToken::new();
    (
        ChannelSink {
            tx,
            token: token.clone(),
        },
        StreamReader {
            rx,
            token,
            finished: None,
        },
    )
}

/// Producer half of a channel-backed stream.
pub struct ChannelSink<T> {
    tx: mpsc::Sender<Frame<T>>,
    token: CancellationToken,
}

impl<T> ChannelSink<T> {
    async fn send(&self, frame: Frame<T>) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| BridgeError::StreamClosed)
    }
}

#[async_trait::async_trait]
impl<T: Send + 'static> StreamSink<T> for ChannelSink<T> {
    async fn write(&mut self, item: T) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(BridgeError::StreamClosed);
        }
        self.send(Frame::Item(item)).await
    }

    async fn close(&mut self) -> Result<()> {
        self.send(Frame::Close).await
    }

    async fn abort(&mut self) -> Result<()> {
        self.send(Frame::Abort).await
    }

    fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// One observation on the consumer side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent<T> {
    Item(T),
    Closed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finished {
    Closed,
    Aborted,
}

/// Consumer half of a channel-backed stream.
///
/// Also usable as a [`futures::Stream`] of `Result<T, StreamAborted>`: a
/// close ends the stream, an abort yields one `Err` first.
pub struct StreamReader<T> {
    rx: mpsc::Receiver<Frame<T>>,
    token: CancellationToken,
    finished: Option<Finished>,
}

impl<T> StreamReader<T> {
    /// Waits for the next item or terminal signal.
    ///
    /// Once the stream ended, the terminal event is returned again on every
    /// call.
    pub async fn recv(&mut self) -> StreamEvent<T> {
        if let Some(finished) = self.finished {
            return finished.into();
        }
        let frame = self.rx.recv().await;
        self.accept(frame)
    }

    /// Reads until the stream ends and returns every item in order.
    pub async fn collect_items(mut self) -> std::result::Result<Vec<T>, StreamAborted> {
        let mut items = Vec::new();
        loop {
            match self.recv().await {
                StreamEvent::Item(item) => items.push(item),
                StreamEvent::Closed => return Ok(items),
                StreamEvent::Aborted => return Err(StreamAborted),
            }
        }
    }

    /// Asks the producer to stop. Items already buffered remain readable.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }

    /// `true` once a terminal signal was received.
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    fn accept(&mut self, frame: Option<Frame<T>>) -> StreamEvent<T> {
        match frame {
            Some(Frame::Item(item)) => StreamEvent::Item(item),
            Some(Frame::Close) => self.finish(Finished::Closed),
            Some(Frame::Abort) | None => self.finish(Finished::Aborted),
        }
    }

    fn finish(&mut self, finished: Finished) -> StreamEvent<T> {
        self.finished = Some(finished);
        self.rx.close();
        finished.into()
    }
}

impl<T> From<Finished> for StreamEvent<T> {
    fn from(finished: Finished) -> Self {
        match finished {
            Finished::Closed => StreamEvent::Closed,
            Finished::Aborted => StreamEvent::Aborted,
        }
    }
}

impl<T> Drop for StreamReader<T> {
    fn drop(&mut self) {
        if self.finished.is_none() {
            self.token.cancel();
        }
    }
}

impl<T> Stream for StreamReader<T> {
    type Item = std::result::Result<T, StreamAborted>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished.is_some() {
            return Poll::Ready(None);
        }
        let frame = match self.rx.poll_recv(cx) {
            Poll::Ready(frame) => frame,
            Poll::Pending => return Poll::Pending,
        };
        Poll::Ready(match self.accept(frame) {
            StreamEvent::Item(item) => Some(Ok(item)),
            StreamEvent::Closed => None,
            StreamEvent::Aborted => Some(Err(StreamAborted)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_items_then_close() {
        let (mut sink, mut reader) = stream_channel(4);
        sink.write(1).await.unwrap();
        sink.write(2).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(reader.recv().await, StreamEvent::Item(1));
        assert_eq!(reader.recv().await, StreamEvent::Item(2));
        assert_eq!(reader.recv().await, StreamEvent::Closed);
        assert_eq!(reader.recv().await, StreamEvent::Closed);
        assert!(reader.is_finished());
    }

    #[tokio::test]
    async fn test_abort_surfaces_as_error() {
        let (mut sink, reader) = stream_channel::<u8>(4);
        sink.write(7).await.unwrap();
        sink.abort().await.unwrap();

        assert_eq!(reader.collect_items().await, Err(StreamAborted));
    }

    #[tokio::test]
    async fn test_dropped_producer_counts_as_abort() {
        let (sink, mut reader) = stream_channel::<u8>(4);
        drop(sink);
        assert_eq!(reader.recv().await, StreamEvent::Aborted);
    }

    #[tokio::test]
    async fn test_cancel_rejects_further_writes() {
        let (mut sink, reader) = stream_channel(4);
        sink.write("kept").await.unwrap();
        reader.cancel();

        assert!(sink.cancellation().is_cancelled());
        assert!(matches!(
            sink.write("dropped").await,
            Err(BridgeError::StreamClosed)
        ));
    }

    #[tokio::test]
    async fn test_dropping_reader_cancels() {
        let (mut sink, reader) = stream_channel::<u8>(1);
        let token = sink.cancellation();
        drop(reader);

        assert!(token.is_cancelled());
        assert!(matches!(sink.close().await, Err(BridgeError::StreamClosed)));
    }

    #[tokio::test]
    async fn test_as_futures_stream() {
        let (mut sink, reader) = stream_channel(4);
        sink.write(1).await.unwrap();
        sink.abort().await.unwrap();

        let events: Vec<_> = reader.collect().await;
        assert_eq!(events, vec![Ok(1), Err(StreamAborted)]);
    }

    #[tokio::test]
    async fn test_write_waits_for_room() {
        let (mut sink, mut reader) = stream_channel(1);
        sink.write(1).await.unwrap();

        let pending =
            core_async::time::timeout(core_async::Duration::from_millis(20), sink.write(2)).await;
        assert!(pending.is_err(), "second write should wait for the reader");

        assert_eq!(reader.recv().await, StreamEvent::Item(1));
        sink.write(3).await.unwrap();
        assert_eq!(reader.recv().await, StreamEvent::Item(3));
    }
}
