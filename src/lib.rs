//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `core-stream`, `bridge-desktop`). Host
//! applications can depend on `mobile-message-workspace` and enable the
//! documented features without wiring each crate individually.

#[cfg(feature = "shim")]
pub use core_service as service;

#[cfg(feature = "streams")]
pub use core_stream as streams;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop as desktop;
