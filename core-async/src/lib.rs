//! Runtime façade for the mobile message core.
//!
//! All `core-*` and `bridge-*` crates depend on this crate instead of naming
//! Tokio directly, so the executor stays a single, swappable decision.
//!
//! # Modules
//!
//! - `task`: Task spawning
//! - `time`: Sleep, timeout, durations
//! - `sync`: Channels, locks and cooperative cancellation
//! - `runtime`: Blocking entry point for synchronous callers
//!
//! The `select!` macro is re-exported at the crate root.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::CancellationToken;
//! use core_async::task;
//!
//! # core_async::runtime::block_on(async {
//! let token = CancellationToken::new();
//! let child = token.clone();
//! let handle = task::spawn(async move {
//!     child.cancelled().await;
//!     "stopped"
//! });
//!
//! token.cancel();
//! assert_eq!(handle.await.unwrap(), "stopped");
//! # });
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
/// Waits on several branches at once, running the first to complete.
pub use tokio::select;
pub use time::{sleep, Duration, Instant};
