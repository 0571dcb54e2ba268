use async_trait::async_trait;
use thiserror::Error;

use super::path::DerivationPath;
use super::result::MethodResult;
use crate::connections::SharedTransport;

/// Status word returned when the device does not know the command, which in
/// practice means the Stellar app is not the one currently open.
pub const SW_UNKNOWN_APDU: u16 = 0x6d02;
/// The user refused the operation on the device.
pub const SW_DENIED_BY_USER: u16 = 0x6985;
/// Hash signing has to be enabled in the app settings first.
pub const SW_HASH_SIGNING_DISABLED: u16 = 0x6c66;
pub const SW_INCORRECT_DATA: u16 = 0x6a80;

pub fn status_name(code: u16) -> &'static str {
    match code {
        SW_UNKNOWN_APDU => "UNKNOWN_APDU",
        SW_DENIED_BY_USER => "CONDITIONS_OF_USE_NOT_SATISFIED",
        SW_HASH_SIGNING_DISABLED => "HASH_SIGNING_MODE_NOT_ENABLED",
        SW_INCORRECT_DATA => "INCORRECT_DATA",
        0x6e00 => "CLA_NOT_SUPPORTED",
        0x6b00 => "INCORRECT_P1_P2",
        _ => "UNKNOWN_ERROR",
    }
}

#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device answered with a non-success status word.
    #[error("Ledger device: {} (0x{:04x})", status_name(*.code), .code)]
    Status { code: u16 },

    /// The transport under the client has been released.
    #[error("Transport is closed")]
    Disconnected,

    #[error("{0}")]
    Protocol(String),
}

impl DeviceError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DeviceError::Status { code } => Some(*code),
            _ => None,
        }
    }

    pub fn is_unknown_command(&self) -> bool {
        self.status_code() == Some(SW_UNKNOWN_APDU)
    }
}

/// The Stellar application's command set, bound to an open transport.
#[async_trait]
pub trait AppClient: Send {
    async fn get_app_configuration(&mut self) -> Result<MethodResult, DeviceError>;

    async fn get_public_key(
        &mut self,
        path: &DerivationPath,
        display: bool,
    ) -> Result<MethodResult, DeviceError>;

    /// `payload` is the full signature base of a transaction.
    async fn sign_transaction(
        &mut self,
        path: &DerivationPath,
        payload: &[u8],
    ) -> Result<MethodResult, DeviceError>;

    async fn sign_soroban_authorization(
        &mut self,
        path: &DerivationPath,
        hash_id_preimage: &[u8],
    ) -> Result<MethodResult, DeviceError>;

    async fn sign_hash(
        &mut self,
        path: &DerivationPath,
        hash: &[u8],
    ) -> Result<MethodResult, DeviceError>;
}

/// Builds an [`AppClient`] on top of a freshly acquired transport.
#[async_trait]
pub trait AppClientFactory: Send + Sync {
    async fn create(&self, transport: SharedTransport) -> Result<Box<dyn AppClient>, DeviceError>;
}
