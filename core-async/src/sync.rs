//! Synchronization primitives.
//!
//! Async-aware locks and channels from `tokio::sync`, plus the
//! [`CancellationToken`] used for consumer-driven stream cancellation.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{mpsc, CancellationToken};
//!
//! # core_async::runtime::block_on(async {
//! let (tx, mut rx) = mpsc::channel::<u32>(4);
//! tx.send(7).await.unwrap();
//! assert_eq!(rx.recv().await, Some(7));
//!
//! let token = CancellationToken::new();
//! assert!(!token.is_cancelled());
//! token.cancel();
//! assert!(token.is_cancelled());
//! # });
//! ```

pub use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock};
pub use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFuture};
