//! A deterministic **in‑process stand‑in** for a transport provider, a
//! transport and the Stellar app client.
//!
//! *  **From the test’s perspective**
//!    * Configure a [`FakeSetup`] (which kinds fail, whether close fails, ...)
//!      and build a `ConnectionManager` from it.
//!    * Queue the next device answer with `probe.respond_with(..)`.
//!    * Inspect what reached the device via `probe.calls()` and the
//!      open/close counters.
//!    * Hold an acquisition or a device call open with the `Notify` gates.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stellar_ledger_core::connections::{
    SharedTransport, Transport, TransportError, TransportKind, TransportProvider,
};
use stellar_ledger_core::device::{
    AppClient, AppClientFactory, DerivationPath, DeviceError, MethodResult, Record,
};
use stellar_ledger_core::ConnectionManager;
use tokio::sync::Notify;

#[derive(Default)]
pub struct Probe {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    calls: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<Result<MethodResult, DeviceError>>>,
    last_payload: Mutex<Option<Vec<u8>>>,
}

impl Probe {
    /// Answer the next device call with `response` instead of the default.
    pub fn respond_with(&self, response: Result<MethodResult, DeviceError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_payload(&self) -> Option<Vec<u8>> {
        self.last_payload.lock().unwrap().clone()
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn record(&self, call: &str, payload: Option<&[u8]>) {
        self.calls.lock().unwrap().push(call.to_string());
        if let Some(bytes) = payload {
            *self.last_payload.lock().unwrap() = Some(bytes.to_vec());
        }
    }

    fn answer(&self, default: MethodResult) -> Result<MethodResult, DeviceError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(default))
    }
}

#[derive(Clone, Debug)]
pub enum Acquire {
    Succeed,
    Fail(String),
    Cancel,
}

#[derive(Clone)]
pub struct FakeSetup {
    pub probe: Arc<Probe>,
    pub usb: Acquire,
    pub hid: Acquire,
    pub close_fails: bool,
    pub factory_error: Option<String>,
    /// Transport creation waits for a permit on this gate.
    pub acquire_gate: Option<Arc<Notify>>,
    /// App client construction waits for a permit on this gate.
    pub factory_gate: Option<Arc<Notify>>,
    /// Every device call waits for a permit on this gate.
    pub call_gate: Option<Arc<Notify>>,
}

impl Default for FakeSetup {
    fn default() -> Self {
        Self {
            probe: Arc::new(Probe::default()),
            usb: Acquire::Succeed,
            hid: Acquire::Succeed,
            close_fails: false,
            factory_error: None,
            acquire_gate: None,
            factory_gate: None,
            call_gate: None,
        }
    }
}

impl FakeSetup {
    pub fn manager(&self) -> ConnectionManager {
        let providers: Vec<Arc<dyn TransportProvider>> = vec![
            Arc::new(FakeProvider {
                kind: TransportKind::Usb,
                acquire: self.usb.clone(),
                setup: self.clone(),
            }),
            Arc::new(FakeProvider {
                kind: TransportKind::Hid,
                acquire: self.hid.clone(),
                setup: self.clone(),
            }),
        ];
        ConnectionManager::new(
            providers,
            Arc::new(FakeFactory {
                setup: self.clone(),
            }),
        )
    }
}

struct FakeProvider {
    kind: TransportKind,
    acquire: Acquire,
    setup: FakeSetup,
}

#[async_trait]
impl TransportProvider for FakeProvider {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn create(&self) -> Result<Box<dyn Transport>, TransportError> {
        if let Some(gate) = &self.setup.acquire_gate {
            gate.notified().await;
        }
        match &self.acquire {
            Acquire::Succeed => {
                self.setup.probe.opened.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(FakeTransport {
                    kind: self.kind,
                    open: true,
                    close_fails: self.setup.close_fails,
                    probe: self.setup.probe.clone(),
                }))
            }
            Acquire::Fail(message) => Err(TransportError::Unavailable(message.clone())),
            Acquire::Cancel => Err(TransportError::Cancelled),
        }
    }
}

struct FakeTransport {
    kind: TransportKind,
    open: bool,
    close_fails: bool,
    probe: Arc<Probe>,
}

#[async_trait]
impl Transport for FakeTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn device_name(&self) -> String {
        "fake device".into()
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.open = false;
        self.probe.closed.fetch_add(1, Ordering::SeqCst);
        if self.close_fails {
            return Err(TransportError::Other("device stopped responding".into()));
        }
        Ok(())
    }
}

struct FakeFactory {
    setup: FakeSetup,
}

#[async_trait]
impl AppClientFactory for FakeFactory {
    async fn create(&self, _transport: SharedTransport) -> Result<Box<dyn AppClient>, DeviceError> {
        if let Some(gate) = &self.setup.factory_gate {
            gate.notified().await;
        }
        if let Some(message) = &self.setup.factory_error {
            return Err(DeviceError::Protocol(message.clone()));
        }
        Ok(Box::new(FakeClient {
            setup: self.setup.clone(),
        }))
    }
}

struct FakeClient {
    setup: FakeSetup,
}

impl FakeClient {
    async fn call(
        &self,
        name: &str,
        payload: Option<&[u8]>,
        default: MethodResult,
    ) -> Result<MethodResult, DeviceError> {
        self.setup.probe.record(name, payload);
        if let Some(gate) = &self.setup.call_gate {
            gate.notified().await;
        }
        self.setup.probe.answer(default)
    }
}

#[async_trait]
impl AppClient for FakeClient {
    async fn get_app_configuration(&mut self) -> Result<MethodResult, DeviceError> {
        let default = MethodResult::Record(
            Record::new()
                .with("version", "5.0.3")
                .with("hashSigningEnabled", true),
        );
        self.call("getAppConfiguration", None, default).await
    }

    async fn get_public_key(
        &mut self,
        _path: &DerivationPath,
        _display: bool,
    ) -> Result<MethodResult, DeviceError> {
        self.call("getPublicKey", None, MethodResult::PublicKey(vec![0; 32]))
            .await
    }

    async fn sign_transaction(
        &mut self,
        _path: &DerivationPath,
        payload: &[u8],
    ) -> Result<MethodResult, DeviceError> {
        self.call(
            "signTransaction",
            Some(payload),
            MethodResult::Signature(vec![1, 2, 255]),
        )
        .await
    }

    async fn sign_soroban_authorization(
        &mut self,
        _path: &DerivationPath,
        hash_id_preimage: &[u8],
    ) -> Result<MethodResult, DeviceError> {
        self.call(
            "signSorobanAuthorization",
            Some(hash_id_preimage),
            MethodResult::Signature(vec![1, 2, 255]),
        )
        .await
    }

    async fn sign_hash(
        &mut self,
        _path: &DerivationPath,
        hash: &[u8],
    ) -> Result<MethodResult, DeviceError> {
        self.call("signHash", Some(hash), MethodResult::Signature(vec![1, 2, 255]))
            .await
    }
}
