//! # Shim Configuration
//!
//! Settings for the mobile message shim, built with a fail-fast builder.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::ShimConfig;
//!
//! let config = ShimConfig::builder()
//!     .instance_id("sms-app-1")
//!     .stream_buffer_size(64)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.service_name, "moz-mobile-message-shim");
//! assert_eq!(
//!     config.instance_channel(),
//!     "moz-mobile-message-shim-channel-sms-app-1"
//! );
//! ```
//!
//! ## Error Handling
//!
//! Invalid values are rejected at `build()` with a message naming the
//! offending setting:
//!
//! ```rust
//! use core_runtime::config::ShimConfig;
//!
//! let err = ShimConfig::builder().stream_buffer_size(0).build().unwrap_err();
//! assert!(err.to_string().contains("stream_buffer_size"));
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

/// Well-known name clients use to reach the shim.
pub const DEFAULT_SERVICE_NAME: &str = "moz-mobile-message-shim";

/// Default number of items buffered between a stream producer and its
/// consumer before writes start waiting.
pub const DEFAULT_STREAM_BUFFER_SIZE: usize = 32;

const MAX_BUFFER_SIZE: usize = 10_000;

/// Configuration of a shim instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimConfig {
    /// Name the service is registered under.
    pub service_name: String,

    /// Identifies this shim instance; used to derive its private channel.
    pub instance_id: String,

    /// Capacity of channel-backed streams created on behalf of clients.
    pub stream_buffer_size: usize,

    /// Capacity of the in-process broadcast event bus.
    pub event_buffer_size: usize,

    /// Mirror broadcasts onto the in-process event bus.
    pub enable_event_bus: bool,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            instance_id: uuid::Uuid::new_v4().to_string(),
            stream_buffer_size: DEFAULT_STREAM_BUFFER_SIZE,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            enable_event_bus: true,
        }
    }
}

impl ShimConfig {
    pub fn builder() -> ShimConfigBuilder {
        ShimConfigBuilder::default()
    }

    /// Channel shared by every client of the service.
    pub fn service_channel(&self) -> String {
        format!("{}-channel", self.service_name)
    }

    /// Channel private to this shim instance.
    pub fn instance_channel(&self) -> String {
        format!("{}-channel-{}", self.service_name, self.instance_id)
    }

    /// Channels the service listens on, shared channel first.
    pub fn channels(&self) -> [String; 2] {
        [self.service_channel(), self.instance_channel()]
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(Error::InvalidSetting {
                field: "service_name",
                message: "service name cannot be empty".to_string(),
            });
        }

        if self.instance_id.trim().is_empty() {
            return Err(Error::InvalidSetting {
                field: "instance_id",
                message: "instance id cannot be empty; omit it to get a random one".to_string(),
            });
        }

        validate_buffer("stream_buffer_size", self.stream_buffer_size)?;
        validate_buffer("event_buffer_size", self.event_buffer_size)?;

        Ok(())
    }
}

fn validate_buffer(field: &'static str, size: usize) -> Result<()> {
    if size == 0 || size > MAX_BUFFER_SIZE {
        return Err(Error::InvalidSetting {
            field,
            message: format!("must be between 1 and {}, got {}", MAX_BUFFER_SIZE, size),
        });
    }
    Ok(())
}

/// Builder for [`ShimConfig`]. Unset values fall back to the defaults.
#[derive(Debug, Default)]
pub struct ShimConfigBuilder {
    service_name: Option<String>,
    instance_id: Option<String>,
    stream_buffer_size: Option<usize>,
    event_buffer_size: Option<usize>,
    enable_event_bus: Option<bool>,
}

impl ShimConfigBuilder {
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    pub fn instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = Some(id.into());
        self
    }

    pub fn stream_buffer_size(mut self, size: usize) -> Self {
        self.stream_buffer_size = Some(size);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn enable_event_bus(mut self, enabled: bool) -> Self {
        self.enable_event_bus = Some(enabled);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<ShimConfig> {
        let defaults = ShimConfig::default();
        let config = ShimConfig {
            service_name: self.service_name.unwrap_or(defaults.service_name),
            instance_id: self.instance_id.unwrap_or(defaults.instance_id),
            stream_buffer_size: self
                .stream_buffer_size
                .unwrap_or(defaults.stream_buffer_size),
            event_buffer_size: self.event_buffer_size.unwrap_or(defaults.event_buffer_size),
            enable_event_bus: self.enable_event_bus.unwrap_or(defaults.enable_event_bus),
        };

        config.validate()?;
        Ok(config)
    }
}
