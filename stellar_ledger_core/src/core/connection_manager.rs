use crate::connections::{SharedTransport, TransportKind, TransportProvider};
use crate::core::errors::ConnectionError;
use crate::device::{AppClient, AppClientFactory};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::{Arc, Mutex, MutexGuard};

/// App client handle shared between the manager and in-flight requests.
///
/// Requests hold the async lock for the duration of one device call, so a
/// second request or a `disconnect` waits on (or is turned away by) it.
pub type SharedClient = Arc<tokio::sync::Mutex<Box<dyn AppClient>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Error => "Connection Error",
        }
    }
}

impl Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Read-only view of the session for UIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub status: ConnectionStatus,
    pub transport_kind: TransportKind,
    pub last_error: Option<String>,
    pub has_transport: bool,
    pub has_client: bool,
}

impl ConnectionSnapshot {
    /// Suggests the other transport kind after a failed attempt.
    pub fn retry_hint(&self) -> Option<String> {
        (self.status == ConnectionStatus::Error).then(|| {
            format!(
                "Please try switching to {} and connect again.",
                self.transport_kind.alternative().label()
            )
        })
    }
}

#[derive(Default)]
struct SessionState {
    status: ConnectionStatus,
    transport_kind: TransportKind,
    transport: Option<SharedTransport>,
    client: Option<SharedClient>,
    last_error: Option<String>,
    // Bumped by every disconnect so an attempt still in flight can tell it
    // was abandoned.
    generation: u64,
}

/// Owns the device session: one transport and the app client layered on it.
///
/// Cloning is cheap and every clone observes the same session, so the UI can
/// hand the manager to request handlers without any global state. The
/// session lock is a plain mutex that is never held across an `.await`.
#[derive(Clone)]
pub struct ConnectionManager {
    providers: Arc<HashMap<TransportKind, Arc<dyn TransportProvider>>>,
    client_factory: Arc<dyn AppClientFactory>,
    inner: Arc<Mutex<SessionState>>,
}

impl ConnectionManager {
    pub fn new(
        providers: Vec<Arc<dyn TransportProvider>>,
        client_factory: Arc<dyn AppClientFactory>,
    ) -> Self {
        let providers = providers.into_iter().map(|p| (p.kind(), p)).collect();
        Self {
            providers: Arc::new(providers),
            client_factory,
            inner: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Acquire a transport of `kind` and bind an app client to it.
    ///
    /// Valid from `Disconnected` or `Error`. The status flips to `Connecting`
    /// before the first suspension point. On failure any acquired transport
    /// is closed again and the session ends in `Error`.
    pub async fn connect(&self, kind: TransportKind) -> Result<SharedClient, ConnectionError> {
        let generation = {
            let mut state = self.state();
            match state.status {
                ConnectionStatus::Connecting => return Err(ConnectionError::Busy),
                ConnectionStatus::Connected => return Err(ConnectionError::AlreadyConnected),
                ConnectionStatus::Disconnected | ConnectionStatus::Error => {}
            }
            state.status = ConnectionStatus::Connecting;
            state.transport_kind = kind;
            state.last_error = None;
            state.generation
        };
        info!("Connecting over {}", kind.label());

        let Some(provider) = self.providers.get(&kind).cloned() else {
            return Err(self.fail(generation, format!("{} is not available", kind.label())));
        };

        let transport = match provider.create().await {
            Ok(transport) => transport,
            Err(e) => return Err(self.fail(generation, e.to_string())),
        };
        debug!("Acquired transport to '{}'", transport.device_name());
        let transport: SharedTransport = Arc::new(tokio::sync::Mutex::new(transport));

        if !self.attach_transport(generation, &transport) {
            release(&transport).await;
            return Err(cancelled());
        }

        // From here on a `disconnect` that takes over also takes the transport
        // out of the session and closes it, so the attempt must not close it again.
        let client = match self.client_factory.create(transport.clone()).await {
            Ok(client) => client,
            Err(e) => {
                if self.detach_transport(generation, &transport) {
                    release(&transport).await;
                }
                return Err(self.fail(generation, e.to_string()));
            }
        };
        let client: SharedClient = Arc::new(tokio::sync::Mutex::new(client));

        let mut state = self.state();
        if state.generation != generation {
            debug!("Connect over {} abandoned after disconnect", kind.label());
            return Err(cancelled());
        }
        state.status = ConnectionStatus::Connected;
        state.client = Some(client.clone());
        info!("Connected over {}", kind.label());
        Ok(client)
    }

    fn attach_transport(&self, generation: u64, transport: &SharedTransport) -> bool {
        let mut state = self.state();
        if state.generation != generation {
            return false;
        }
        state.transport = Some(transport.clone());
        true
    }

    /// Take `transport` back out of the session if this attempt still owns it.
    fn detach_transport(&self, generation: u64, transport: &SharedTransport) -> bool {
        let mut state = self.state();
        let owned = state.generation == generation
            && state
                .transport
                .as_ref()
                .is_some_and(|held| Arc::ptr_eq(held, transport));
        if owned {
            state.transport = None;
        }
        owned
    }

    /// Record a failed attempt unless a `disconnect` already took over.
    fn fail(&self, generation: u64, message: String) -> ConnectionError {
        let mut state = self.state();
        if state.generation == generation {
            warn!("Connection over {} failed: {}", state.transport_kind.label(), message);
            state.status = ConnectionStatus::Error;
            state.last_error = Some(message.clone());
            state.transport = None;
            state.client = None;
        }
        ConnectionError::Failed(message)
    }

    /// Tear the session down. Never fails.
    ///
    /// A request that is already running on the client is allowed to finish
    /// before the transport is closed. A `connect` still in flight is
    /// abandoned and releases whatever it acquired.
    pub async fn disconnect(&self) {
        let (transport, client) = {
            let mut state = self.state();
            state.generation += 1;
            state.status = ConnectionStatus::Disconnected;
            state.transport_kind = TransportKind::default();
            state.last_error = None;
            (state.transport.take(), state.client.take())
        };

        if let Some(client) = client {
            // Wait for a pending request to complete.
            drop(client.lock().await);
        }
        if let Some(transport) = transport {
            release(&transport).await;
        }
        info!("Disconnected");
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state().status
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.state().transport_kind
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        let state = self.state();
        ConnectionSnapshot {
            status: state.status,
            transport_kind: state.transport_kind,
            last_error: state.last_error.clone(),
            has_transport: state.transport.is_some(),
            has_client: state.client.is_some(),
        }
    }

    /// The app client, present exactly while connected.
    pub fn client(&self) -> Option<SharedClient> {
        self.state().client.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }
}

// Close errors are logged only; a misbehaving device must not block teardown.
async fn release(transport: &SharedTransport) {
    let mut transport = transport.lock().await;
    if let Err(e) = transport.close().await {
        error!("Disconnect error: {}", e);
    }
}

fn cancelled() -> ConnectionError {
    ConnectionError::Failed("connection attempt was cancelled by disconnect".into())
}
