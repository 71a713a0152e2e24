use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShimError {
    #[error("Shim initialization failed: {0}")]
    InitializationFailed(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Invalid arguments for `{method}`: {message}")]
    InvalidRequest { method: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShimError {
    pub fn invalid_request(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Converts into the error handed back over the bridge.
    ///
    /// Platform errors cross unchanged; everything else becomes
    /// [`BridgeError::OperationFailed`].
    pub fn into_bridge(self) -> BridgeError {
        match self {
            ShimError::Bridge(err) => err,
            ShimError::Json(err) => BridgeError::Serialization(err),
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShimError>;
