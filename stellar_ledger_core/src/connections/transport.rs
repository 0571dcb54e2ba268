use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::errors::TransportError;

/// The byte-level channel used to reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Usb,
    Hid,
}

impl TransportKind {
    /// The kind a user should try after this one failed.
    pub fn alternative(self) -> Self {
        match self {
            TransportKind::Usb => TransportKind::Hid,
            TransportKind::Hid => TransportKind::Usb,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransportKind::Usb => "WebUSB",
            TransportKind::Hid => "WebHID",
        }
    }
}

impl Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Usb => write!(f, "usb"),
            TransportKind::Hid => write!(f, "hid"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usb" | "webusb" => Ok(TransportKind::Usb),
            "hid" | "webhid" => Ok(TransportKind::Hid),
            other => Err(TransportError::Other(format!(
                "Unknown transport kind '{}'",
                other
            ))),
        }
    }
}

/// An open channel to a physical device.
///
/// The handle is owned by the `ConnectionManager`; application clients only
/// hold a [`SharedTransport`] to it so that closing the transport is visible
/// to every layer above.
#[async_trait]
pub trait Transport: Send {
    fn kind(&self) -> TransportKind;

    /// Human readable description of the device behind this transport.
    fn device_name(&self) -> String;

    fn is_open(&self) -> bool;

    /// Release the underlying resource. Calling it twice is allowed.
    async fn close(&mut self) -> Result<(), TransportError>;
}

pub type SharedTransport = Arc<Mutex<Box<dyn Transport>>>;

/// Acquires transports of one kind. Acquisition may involve the user picking a
/// device, so it can be cancelled as well as rejected by the platform.
#[async_trait]
pub trait TransportProvider: Send + Sync {
    fn kind(&self) -> TransportKind;

    async fn create(&self) -> Result<Box<dyn Transport>, TransportError>;
}
