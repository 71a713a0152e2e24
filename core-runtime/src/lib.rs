//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the mobile message core:
//! - Logging and tracing infrastructure
//! - Shim configuration
//! - Broadcast event types and the in-process event bus
//!
//! ## Overview
//!
//! Other crates depend on this one for their logging conventions, their
//! configuration surface and the mapping from native messaging events to
//! the broadcasts clients subscribe to.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
