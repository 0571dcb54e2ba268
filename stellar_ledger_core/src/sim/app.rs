use std::sync::Arc;

use async_trait::async_trait;
use ed25519_dalek::Signer;
use log::{debug, info};
use sha2::{Digest, Sha256};

use super::SimulatedDevice;
use crate::connections::SharedTransport;
use crate::device::{
    AppClient, AppClientFactory, DerivationPath, DeviceError, MethodResult, Record,
    SW_HASH_SIGNING_DISABLED, SW_INCORRECT_DATA, SW_UNKNOWN_APDU,
};

/// Largest transaction payload the simulated app accepts.
const MAX_DATA_SIZE: usize = 10_240;

pub struct SimAppFactory {
    device: Arc<SimulatedDevice>,
}

impl SimAppFactory {
    pub fn new(device: Arc<SimulatedDevice>) -> Self {
        Self { device }
    }
}

#[async_trait]
impl AppClientFactory for SimAppFactory {
    async fn create(&self, transport: SharedTransport) -> Result<Box<dyn AppClient>, DeviceError> {
        if !transport.lock().await.is_open() {
            return Err(DeviceError::Disconnected);
        }
        Ok(Box::new(SimAppClient {
            device: self.device.clone(),
            transport,
        }))
    }
}

pub struct SimAppClient {
    device: Arc<SimulatedDevice>,
    transport: SharedTransport,
}

impl SimAppClient {
    async fn ensure_ready(&self) -> Result<(), DeviceError> {
        if !self.transport.lock().await.is_open() {
            return Err(DeviceError::Disconnected);
        }
        if !self.device.config().app_open {
            return Err(DeviceError::Status {
                code: SW_UNKNOWN_APDU,
            });
        }
        Ok(())
    }

    async fn sign(&self, path: &DerivationPath, message: &[u8]) -> Result<MethodResult, DeviceError> {
        self.ensure_ready().await?;
        let key = self.device.signing_key(path)?;
        Ok(MethodResult::Signature(key.sign(message).to_bytes().to_vec()))
    }
}

#[async_trait]
impl AppClient for SimAppClient {
    async fn get_app_configuration(&mut self) -> Result<MethodResult, DeviceError> {
        self.ensure_ready().await?;
        let config = self.device.config();
        Ok(MethodResult::Record(
            Record::new()
                .with("version", config.app_version.as_str())
                .with("hashSigningEnabled", config.hash_signing_enabled)
                .with("maxDataSize", MAX_DATA_SIZE as i64),
        ))
    }

    async fn get_public_key(
        &mut self,
        path: &DerivationPath,
        display: bool,
    ) -> Result<MethodResult, DeviceError> {
        self.ensure_ready().await?;
        let key = self.device.signing_key(path)?;
        if display {
            info!("Simulated device shows the address for {}", path);
        }
        Ok(MethodResult::PublicKey(key.verifying_key().to_bytes().to_vec()))
    }

    async fn sign_transaction(
        &mut self,
        path: &DerivationPath,
        payload: &[u8],
    ) -> Result<MethodResult, DeviceError> {
        if payload.len() > MAX_DATA_SIZE {
            return Err(DeviceError::Status {
                code: SW_INCORRECT_DATA,
            });
        }
        debug!("Simulated device signs a {} byte transaction", payload.len());
        self.sign(path, &Sha256::digest(payload)).await
    }

    async fn sign_soroban_authorization(
        &mut self,
        path: &DerivationPath,
        hash_id_preimage: &[u8],
    ) -> Result<MethodResult, DeviceError> {
        self.sign(path, &Sha256::digest(hash_id_preimage)).await
    }

    async fn sign_hash(
        &mut self,
        path: &DerivationPath,
        hash: &[u8],
    ) -> Result<MethodResult, DeviceError> {
        self.ensure_ready().await?;
        if !self.device.config().hash_signing_enabled {
            return Err(DeviceError::Status {
                code: SW_HASH_SIGNING_DISABLED,
            });
        }
        if hash.len() != 32 {
            return Err(DeviceError::Status {
                code: SW_INCORRECT_DATA,
            });
        }
        self.sign(path, hash).await
    }
}
