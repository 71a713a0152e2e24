use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// Raised by the messaging platform itself; `name` mirrors the
    /// platform's error name (e.g. `NotFoundError`).
    #[error("{}", platform_display(.name, .message))]
    Platform { name: String, message: String },

    /// The consumer side of a stream has gone away.
    #[error("Stream closed by consumer")]
    StreamClosed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Builds a platform error with the given name and message.
    pub fn platform(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Platform {
            name: name.into(),
            message: message.into(),
        }
    }
}

fn platform_display(name: &str, message: &str) -> String {
    if message.is_empty() {
        name.to_string()
    } else {
        format!("{}: {}", name, message)
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
