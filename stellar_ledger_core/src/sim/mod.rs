//! A software stand-in for a Ledger device running the Stellar app.
//!
//! Keys are derived deterministically from a seed string, so the same seed
//! and path always produce the same account. Nothing here is meant to hold
//! real funds.

mod app;
mod transport;

pub use app::{SimAppClient, SimAppFactory};
pub use transport::{SimTransport, SimTransportProvider};

use std::sync::Arc;

use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::connections::{TransportKind, TransportProvider};
use crate::core::ConnectionManager;
use crate::device::{DerivationPath, DeviceError, SW_INCORRECT_DATA};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub seed: String,
    pub app_version: String,
    /// When false every command answers `UNKNOWN_APDU`, as a device sitting
    /// on its dashboard would.
    pub app_open: bool,
    pub hash_signing_enabled: bool,
    /// Pretend the user dismisses the device chooser.
    pub cancel_chooser: bool,
    /// Transport kinds the platform refuses to open.
    pub blocked_transports: Vec<TransportKind>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: "stellar-ledger-console".into(),
            app_version: "5.0.3".into(),
            app_open: true,
            hash_signing_enabled: false,
            cancel_chooser: false,
            blocked_transports: Vec::new(),
        }
    }
}

pub struct SimulatedDevice {
    config: SimulatorConfig,
}

impl SimulatedDevice {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn name(&self) -> &'static str {
        "Simulated Nano S Plus"
    }

    pub(crate) fn signing_key(&self, path: &DerivationPath) -> Result<SigningKey, DeviceError> {
        // The Stellar app only derives fully hardened paths.
        if path.components().iter().any(|c| c & 0x8000_0000 == 0) {
            return Err(DeviceError::Status {
                code: SW_INCORRECT_DATA,
            });
        }
        let mut hasher = Sha256::new();
        hasher.update(self.config.seed.as_bytes());
        for component in path.components() {
            hasher.update(component.to_be_bytes());
        }
        let secret: [u8; 32] = hasher.finalize().into();
        Ok(SigningKey::from_bytes(&secret))
    }
}

/// A session wired to a simulated device over both transport kinds.
pub fn connection_manager(config: SimulatorConfig) -> ConnectionManager {
    let device = Arc::new(SimulatedDevice::new(config));
    let providers: Vec<Arc<dyn TransportProvider>> = vec![
        Arc::new(SimTransportProvider::new(TransportKind::Usb, device.clone())),
        Arc::new(SimTransportProvider::new(TransportKind::Hid, device.clone())),
    ];
    ConnectionManager::new(providers, Arc::new(SimAppFactory::new(device)))
}
