use thiserror::Error;

/// Errors raised by a transport provider or an open transport handle.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The platform refused access to the device (permissions, no device present, ...).
    #[error("{0}")]
    Unavailable(String),

    /// The user dismissed the device chooser without picking a device.
    #[error("No device selected")]
    Cancelled,

    /// The handle was already released.
    #[error("Transport is closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
