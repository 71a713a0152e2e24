//! Mobile message shim service.
//!
//! This crate wires a host-provided [`MessagingApi`](bridge_traits::MessagingApi)
//! into a service transport: request/response methods, cursor-backed
//! streams and event broadcasts. Desktop apps typically enable the
//! `desktop-shims` feature (which depends on `bridge-desktop`) and host the
//! service in-process through [`bootstrap_desktop`].

pub mod error;
pub mod protocol;
pub mod shim;

pub use error::{Result, ShimError};
pub use protocol::MessageQuery;
pub use shim::MobileMessageShim;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::LocalServiceTransport;

/// Builds a shim and registers it on a fresh in-process transport.
///
/// ```ignore
/// use core_runtime::config::ShimConfig;
///
/// let (shim, transport) = core_service::bootstrap_desktop(api, ShimConfig::default())?;
/// let service = transport.endpoint(&shim.config().service_name).unwrap();
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(
    api: std::sync::Arc<dyn bridge_traits::MessagingApi>,
    config: core_runtime::config::ShimConfig,
) -> Result<(MobileMessageShim, std::sync::Arc<LocalServiceTransport>)> {
    let transport = std::sync::Arc::new(LocalServiceTransport::with_stream_buffer(
        config.stream_buffer_size,
    ));
    let shim = MobileMessageShim::new(api, config)?;
    shim.init(transport.as_ref())?;
    Ok((shim, transport))
}
