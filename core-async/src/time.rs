//! Time-related re-exports.

pub use std::time::{Duration, Instant};
pub use tokio::time::{sleep, timeout, Sleep, Timeout};
pub use tokio::time::error::Elapsed;
