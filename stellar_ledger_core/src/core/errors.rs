use thiserror::Error;

use crate::device::DeviceError;

pub const APP_NOT_OPEN_HINT: &str =
    "Please make sure you have opened the Stellar app on your Ledger device.";

/// Failures of [`ConnectionManager::connect`](super::ConnectionManager::connect).
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Acquiring the transport or building the app client failed.
    #[error("Connection failed: {0}")]
    Failed(String),

    #[error("A connection attempt is already in progress")]
    Busy,

    #[error("Already connected; disconnect first")]
    AlreadyConnected,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// Missing or malformed user input.
    #[error("{0}")]
    Parameter(String),

    /// The envelope could not be decoded into a signable transaction.
    #[error("Failed to process transaction: {0}")]
    Transaction(String),

    /// The device call itself failed.
    #[error("{message}")]
    Device {
        message: String,
        #[source]
        source: DeviceError,
    },

    #[error("{0} is not supported by the device client")]
    Unimplemented(&'static str),

    #[error("Connect your Ledger device first")]
    NotConnected,

    #[error("Another request is still running")]
    Busy,
}

impl From<DeviceError> for DispatchError {
    fn from(source: DeviceError) -> Self {
        let mut message = source.to_string();
        if source.is_unknown_command() {
            message.push_str("\n\n");
            message.push_str(APP_NOT_OPEN_HINT);
        }
        DispatchError::Device { message, source }
    }
}
