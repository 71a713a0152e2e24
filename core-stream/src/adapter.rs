//! # Cursor Stream Adapter
//!
//! Bridges a pull-based [`Cursor`] to a push-based [`StreamSink`].
//!
//! ```text
//!   open() ──► Cursor ──advance()──► CursorStreamAdapter ──write()──► StreamSink
//!                 ▲                          │                            │
//!                 └──── next advance ◄───────┘          cancellation ◄────┘
//! ```
//!
//! The adapter owns the enumeration loop for exactly one request. It
//! advances the cursor, writes every produced item in order and ends the
//! stream with a single terminal signal:
//!
//! | event                      | terminal  | outcome                        |
//! |----------------------------|-----------|--------------------------------|
//! | cursor exhausted           | `close`   | [`StreamOutcome::Closed`]      |
//! | consumer cancelled         | `close`   | [`StreamOutcome::Cancelled`]   |
//! | cursor could not be opened | `abort`   | [`StreamOutcome::Aborted`]     |
//! | cursor read failed         | `abort`   | [`StreamOutcome::Aborted`]     |
//!
//! Cancellation is observed before every advance and raced against the
//! advance itself. An advance still pending when the consumer cancels is
//! dropped and whatever it would have produced is discarded.
//!
//! ## Usage
//!
//! ```ignore
//! use core_stream::{stream_channel, CursorStreamAdapter};
//!
//! let (sink, reader) = stream_channel(32);
//! let adapter = CursorStreamAdapter::new("threads");
//! let handle = adapter.spawn(move || api.get_threads(), sink);
//!
//! let threads = reader.collect_items().await?;
//! ```

use std::fmt;

use bridge_traits::cursor::{Cursor, CursorStep};
use bridge_traits::error::BridgeError;
use bridge_traits::stream::StreamSink;
use core_async::task::{self, JoinHandle};
use tracing::{debug, error, instrument, trace, warn};

/// How an adapter run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamOutcome {
    /// The cursor was exhausted and the stream closed.
    Closed,
    /// The consumer cancelled; the stream was closed early.
    Cancelled,
    /// Opening or reading the cursor failed; the stream was aborted.
    Aborted,
}

impl StreamOutcome {
    /// `true` unless the stream was aborted.
    pub fn is_success(&self) -> bool {
        !matches!(self, StreamOutcome::Aborted)
    }
}

impl fmt::Display for StreamOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamOutcome::Closed => f.write_str("closed"),
            StreamOutcome::Cancelled => f.write_str("cancelled"),
            StreamOutcome::Aborted => f.write_str("aborted"),
        }
    }
}

/// Result of handing one item to the sink.
enum Delivery {
    Written,
    Cancelled,
    Failed(BridgeError),
}

/// Drives one cursor enumeration into one stream.
///
/// `collection` names what is being enumerated (`threads`, `messages`) and
/// only appears in diagnostics. Adapters hold no other state, so a fresh one
/// per request costs nothing.
#[derive(Debug, Clone)]
pub struct CursorStreamAdapter {
    collection: String,
}

impl CursorStreamAdapter {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Open the cursor with `open` and pump it into `stream` until a
    /// terminal signal has been sent.
    ///
    /// `open` runs exactly once. If it fails the stream is aborted without
    /// any write.
    #[instrument(skip_all, fields(collection = %self.collection))]
    pub async fn start<C, F, S>(&self, open: F, mut stream: S) -> StreamOutcome
    where
        C: Cursor,
        C::Item: 'static,
        F: FnOnce() -> bridge_traits::Result<C>,
        S: StreamSink<C::Item>,
    {
        let cursor = match open() {
            Ok(cursor) => cursor,
            Err(e) => {
                error!(
                    "Error occurred while retrieving {}: {}",
                    self.collection, e
                );
                self.abort::<C::Item, S>(&mut stream).await;
                return StreamOutcome::Aborted;
            }
        };

        self.pump(cursor, &mut stream).await
    }

    /// Run [`start`](Self::start) as a background task.
    pub fn spawn<C, F, S>(self, open: F, stream: S) -> JoinHandle<StreamOutcome>
    where
        C: Cursor + 'static,
        C::Item: 'static,
        F: FnOnce() -> bridge_traits::Result<C> + Send + 'static,
        S: StreamSink<C::Item> + 'static,
    {
        task::spawn(async move { self.start(open, stream).await })
    }

    async fn pump<C, S>(&self, mut cursor: C, stream: &mut S) -> StreamOutcome
    where
        C: Cursor,
        C::Item: 'static,
        S: StreamSink<C::Item>,
    {
        let token = stream.cancellation();
        let mut written = 0usize;

        loop {
            if token.is_cancelled() {
                return self.cancelled::<C::Item, S>(stream, written).await;
            }

            let step = core_async::select! {
                biased;
                _ = token.cancelled() => {
                    return self.cancelled::<C::Item, S>(stream, written).await;
                }
                step = cursor.advance() => step,
            };

            let item = match step {
                Ok(CursorStep::Next(Some(item)))
                | Ok(CursorStep::Flagged {
                    result: Some(item),
                    done: false,
                }) => item,
                Ok(CursorStep::Flagged {
                    result: None,
                    done: false,
                }) => {
                    trace!("Cursor step carried no result, advancing again");
                    continue;
                }
                Ok(CursorStep::Next(None)) | Ok(CursorStep::Flagged { done: true, .. }) => {
                    debug!(written, "Enumeration complete");
                    self.close::<C::Item, S>(stream).await;
                    return StreamOutcome::Closed;
                }
                Err(e) => {
                    error!("Reading the database. Error: {}", e.name);
                    self.abort::<C::Item, S>(stream).await;
                    return StreamOutcome::Aborted;
                }
            };

            let delivery = core_async::select! {
                biased;
                _ = token.cancelled() => Delivery::Cancelled,
                result = stream.write(item) => match result {
                    Ok(()) => Delivery::Written,
                    Err(BridgeError::StreamClosed) => Delivery::Cancelled,
                    Err(e) => Delivery::Failed(e),
                },
            };

            match delivery {
                Delivery::Written => written += 1,
                Delivery::Cancelled => return self.cancelled::<C::Item, S>(stream, written).await,
                Delivery::Failed(e) => {
                    error!("Error occurred while writing {}: {}", self.collection, e);
                    self.abort::<C::Item, S>(stream).await;
                    return StreamOutcome::Aborted;
                }
            }
        }
    }

    async fn cancelled<T, S>(&self, stream: &mut S, written: usize) -> StreamOutcome
    where
        T: Send + 'static,
        S: StreamSink<T>,
    {
        debug!(written, "Stream cancelled by consumer");
        self.close::<T, S>(stream).await;
        StreamOutcome::Cancelled
    }

    async fn close<T, S>(&self, stream: &mut S)
    where
        T: Send + 'static,
        S: StreamSink<T>,
    {
        if let Err(e) = stream.close().await {
            // A consumer that already left cannot observe the close.
            debug!("Failed to close {} stream: {}", self.collection, e);
        }
    }

    async fn abort<T, S>(&self, stream: &mut S)
    where
        T: Send + 'static,
        S: StreamSink<T>,
    {
        if let Err(e) = stream.abort().await {
            warn!("Failed to abort {} stream: {}", self.collection, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::cursor::{CursorError, ScriptedCursor};
    use core_async::sync::CancellationToken;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[derive(Debug, Clone, PartialEq)]
    enum Call<T> {
        Write(T),
        Close,
        Abort,
    }

    #[derive(Clone, Copy)]
    enum WriteFailure {
        Closed,
        Broken,
    }

    /// Sink that records every call it receives.
    #[derive(Clone)]
    struct RecordingSink<T> {
        calls: Arc<Mutex<Vec<Call<T>>>>,
        token: CancellationToken,
        cancel_after: Option<usize>,
        fail_writes: Option<WriteFailure>,
    }

    impl<T: Clone> RecordingSink<T> {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                token: CancellationToken::new(),
                cancel_after: None,
                fail_writes: None,
            }
        }

        /// Cancel right after the `n`th successful write.
        fn cancelling_after(n: usize) -> Self {
            Self {
                cancel_after: Some(n),
                ..Self::new()
            }
        }

        fn failing(failure: WriteFailure) -> Self {
            Self {
                fail_writes: Some(failure),
                ..Self::new()
            }
        }

        fn calls(&self) -> Vec<Call<T>> {
            self.calls.lock().unwrap().clone()
        }

        fn writes(&self) -> Vec<T> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Write(item) => Some(item),
                    _ => None,
                })
                .collect()
        }

        fn count(&self, call: &Call<T>) -> usize
        where
            T: PartialEq,
        {
            self.calls().iter().filter(|c| *c == call).count()
        }
    }

    #[async_trait::async_trait]
    impl<T: Clone + Send + 'static> StreamSink<T> for RecordingSink<T> {
        async fn write(&mut self, item: T) -> bridge_traits::Result<()> {
            match self.fail_writes {
                Some(WriteFailure::Closed) => return Err(BridgeError::StreamClosed),
                Some(WriteFailure::Broken) => {
                    return Err(BridgeError::OperationFailed("pipe broken".into()))
                }
                None => {}
            }
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call::Write(item));
            let written = calls.iter().filter(|c| matches!(c, Call::Write(_))).count();
            if self.cancel_after == Some(written) {
                self.token.cancel();
            }
            Ok(())
        }

        async fn close(&mut self) -> bridge_traits::Result<()> {
            self.calls.lock().unwrap().push(Call::Close);
            Ok(())
        }

        async fn abort(&mut self) -> bridge_traits::Result<()> {
            self.calls.lock().unwrap().push(Call::Abort);
            Ok(())
        }

        fn cancellation(&self) -> CancellationToken {
            self.token.clone()
        }
    }

    /// Cursor whose advances never resolve.
    struct StalledCursor;

    #[async_trait::async_trait]
    impl Cursor for StalledCursor {
        type Item = u32;

        async fn advance(&mut self) -> std::result::Result<CursorStep<u32>, CursorError> {
            futures::future::pending().await
        }
    }

    /// Layer collecting the formatted message of every event.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<String>>>);

    impl CapturedLogs {
        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct MessageVisitor(Option<String>);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = Some(format!("{:?}", value));
            }
        }
    }

    impl<S: Subscriber> Layer<S> for CapturedLogs {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageVisitor(None);
            event.record(&mut visitor);
            if let Some(message) = visitor.0 {
                self.0.lock().unwrap().push(message);
            }
        }
    }

    fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::registry().with(logs.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    fn flagged(result: Option<u32>, done: bool) -> Result<CursorStep<u32>, CursorError> {
        Ok(CursorStep::Flagged { result, done })
    }

    #[tokio::test]
    async fn test_three_batches_then_end() {
        let sink = RecordingSink::new();
        let outcome = CursorStreamAdapter::new("threads")
            .start(|| Ok(ScriptedCursor::from_items(vec![1, 2, 3])), sink.clone())
            .await;

        assert_eq!(outcome, StreamOutcome::Closed);
        assert_eq!(
            sink.calls(),
            vec![Call::Write(1), Call::Write(2), Call::Write(3), Call::Close]
        );
    }

    #[tokio::test]
    async fn test_flagged_items_in_order() {
        let sink = RecordingSink::new();
        let outcome = CursorStreamAdapter::new("messages")
            .start(
                || Ok(ScriptedCursor::flagged_from_items(vec![10, 20, 30, 40])),
                sink.clone(),
            )
            .await;

        assert_eq!(outcome, StreamOutcome::Closed);
        assert_eq!(sink.writes(), vec![10, 20, 30, 40]);
        assert_eq!(sink.count(&Call::Close), 1);
        assert_eq!(sink.count(&Call::Abort), 0);
    }

    #[tokio::test]
    async fn test_done_flag_result_never_written() {
        let sink = RecordingSink::new();
        let script = vec![flagged(Some(1), false), flagged(Some(99), true)];
        CursorStreamAdapter::new("messages")
            .start(|| Ok(ScriptedCursor::new(script)), sink.clone())
            .await;

        assert_eq!(sink.calls(), vec![Call::Write(1), Call::Close]);
    }

    #[tokio::test]
    async fn test_empty_flagged_step_is_skipped() {
        let sink = RecordingSink::new();
        let script = vec![
            flagged(None, false),
            flagged(Some(5), false),
            flagged(None, false),
            flagged(None, true),
        ];
        let outcome = CursorStreamAdapter::new("messages")
            .start(|| Ok(ScriptedCursor::new(script)), sink.clone())
            .await;

        assert_eq!(outcome, StreamOutcome::Closed);
        assert_eq!(sink.calls(), vec![Call::Write(5), Call::Close]);
    }

    #[tokio::test]
    async fn test_empty_enumeration_closes() {
        let sink = RecordingSink::<u32>::new();
        let outcome = CursorStreamAdapter::new("threads")
            .start(|| Ok(ScriptedCursor::from_items(Vec::new())), sink.clone())
            .await;

        assert_eq!(outcome, StreamOutcome::Closed);
        assert_eq!(sink.calls(), vec![Call::Close]);
    }

    #[tokio::test]
    async fn test_read_error_aborts_and_logs() {
        let (logs, _guard) = capture_logs();
        let sink = RecordingSink::new();
        let script = vec![
            Ok(CursorStep::Next(Some(1))),
            Err(CursorError::new("fake error")),
            Ok(CursorStep::Next(Some(2))),
        ];

        let outcome = CursorStreamAdapter::new("threads")
            .start(|| Ok(ScriptedCursor::new(script)), sink.clone())
            .await;

        assert_eq!(outcome, StreamOutcome::Aborted);
        assert_eq!(sink.calls(), vec![Call::Write(1), Call::Abort]);
        assert!(logs
            .messages()
            .contains(&"Reading the database. Error: fake error".to_string()));
    }

    #[tokio::test]
    async fn test_error_at_item_k() {
        let sink = RecordingSink::new();
        let mut script: Vec<_> = (1..=4).map(|i| flagged(Some(i), false)).collect();
        script.push(Err(CursorError::new("UnknownError")));

        CursorStreamAdapter::new("messages")
            .start(|| Ok(ScriptedCursor::new(script)), sink.clone())
            .await;

        assert_eq!(sink.writes(), vec![1, 2, 3, 4]);
        assert_eq!(sink.count(&Call::Abort), 1);
        assert_eq!(sink.count(&Call::Close), 0);
    }

    #[tokio::test]
    async fn test_construction_failure_aborts_without_writes() {
        let (logs, _guard) = capture_logs();
        let sink = RecordingSink::<u32>::new();

        let outcome = CursorStreamAdapter::new("threads")
            .start(
                || -> bridge_traits::Result<ScriptedCursor<u32>> {
                    Err(BridgeError::platform("SecurityError", "permission denied"))
                },
                sink.clone(),
            )
            .await;

        assert_eq!(outcome, StreamOutcome::Aborted);
        assert_eq!(sink.calls(), vec![Call::Abort]);
        let messages = logs.messages();
        assert!(
            messages.iter().any(|m| m.starts_with("Error occurred while retrieving threads:")
                && m.contains("permission denied")),
            "{:?}",
            messages
        );
    }

    #[tokio::test]
    async fn test_cancellation_after_writes() {
        let sink = RecordingSink::cancelling_after(2);
        let outcome = CursorStreamAdapter::new("threads")
            .start(
                || Ok(ScriptedCursor::from_items(vec![1, 2, 3, 4, 5])),
                sink.clone(),
            )
            .await;

        assert_eq!(outcome, StreamOutcome::Cancelled);
        assert_eq!(
            sink.calls(),
            vec![Call::Write(1), Call::Write(2), Call::Close]
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_start_never_advances() {
        let sink = RecordingSink::<u32>::new();
        sink.token.cancel();

        let outcome = CursorStreamAdapter::new("threads")
            .start(|| Ok(ScriptedCursor::from_items(vec![1, 2])), sink.clone())
            .await;

        assert_eq!(outcome, StreamOutcome::Cancelled);
        assert_eq!(sink.calls(), vec![Call::Close]);
    }

    #[tokio::test]
    async fn test_cancellation_abandons_pending_advance() {
        let sink = RecordingSink::<u32>::new();
        let token = sink.token.clone();
        let handle = CursorStreamAdapter::new("threads").spawn(|| Ok(StalledCursor), sink.clone());

        core_async::task::yield_now().await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), StreamOutcome::Cancelled);
        assert_eq!(sink.calls(), vec![Call::Close]);
    }

    #[tokio::test]
    async fn test_consumer_gone_counts_as_cancellation() {
        let sink = RecordingSink::failing(WriteFailure::Closed);
        let outcome = CursorStreamAdapter::new("threads")
            .start(|| Ok(ScriptedCursor::from_items(vec![1, 2])), sink.clone())
            .await;

        assert_eq!(outcome, StreamOutcome::Cancelled);
        assert_eq!(sink.calls(), vec![Call::Close]);
    }

    #[tokio::test]
    async fn test_failed_write_aborts() {
        let (logs, _guard) = capture_logs();
        let sink = RecordingSink::failing(WriteFailure::Broken);
        let outcome = CursorStreamAdapter::new("messages")
            .start(|| Ok(ScriptedCursor::from_items(vec![1])), sink.clone())
            .await;

        assert_eq!(outcome, StreamOutcome::Aborted);
        assert_eq!(sink.calls(), vec![Call::Abort]);
        assert!(logs
            .messages()
            .iter()
            .any(|m| m.starts_with("Error occurred while writing messages:")));
    }

    #[tokio::test]
    async fn test_spawned_adapter_completes() {
        let sink = RecordingSink::new();
        let handle = CursorStreamAdapter::new("threads")
            .spawn(|| Ok(ScriptedCursor::from_items(vec!["a", "b"])), sink.clone());

        assert_eq!(handle.await.unwrap(), StreamOutcome::Closed);
        assert_eq!(sink.writes(), vec!["a", "b"]);
    }

    #[test]
    fn test_outcome_success() {
        assert!(StreamOutcome::Closed.is_success());
        assert!(StreamOutcome::Cancelled.is_success());
        assert!(!StreamOutcome::Aborted.is_success());
        assert_eq!(StreamOutcome::Cancelled.to_string(), "cancelled");
    }
}
