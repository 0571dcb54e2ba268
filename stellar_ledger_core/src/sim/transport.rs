use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use super::SimulatedDevice;
use crate::connections::{Transport, TransportError, TransportKind, TransportProvider};

pub struct SimTransportProvider {
    kind: TransportKind,
    device: Arc<SimulatedDevice>,
}

impl SimTransportProvider {
    pub fn new(kind: TransportKind, device: Arc<SimulatedDevice>) -> Self {
        Self { kind, device }
    }
}

#[async_trait]
impl TransportProvider for SimTransportProvider {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn create(&self) -> Result<Box<dyn Transport>, TransportError> {
        let config = self.device.config();
        if config.cancel_chooser {
            return Err(TransportError::Cancelled);
        }
        if config.blocked_transports.contains(&self.kind) {
            return Err(TransportError::Unavailable(format!(
                "Access denied to use {} device",
                self.kind.label()
            )));
        }
        info!("Opened {} over simulated {}", self.device.name(), self.kind.label());
        Ok(Box::new(SimTransport {
            kind: self.kind,
            device_name: self.device.name().to_string(),
            open: true,
        }))
    }
}

pub struct SimTransport {
    kind: TransportKind,
    device_name: String,
    open: bool,
}

#[async_trait]
impl Transport for SimTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn device_name(&self) -> String {
        self.device_name.clone()
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.open {
            info!("Closing simulated {} transport", self.kind.label());
        }
        self.open = false;
        Ok(())
    }
}
