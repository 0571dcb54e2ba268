use std::sync::Arc;

use anyhow::anyhow;
use stellar_ledger_core::sim;
use stellar_ledger_core::storage::ConsoleSettings;
use stellar_ledger_core::{
    ConnectionError, ConnectionManager, DispatchError, MethodName, Parameters, RequestDispatcher,
    StellarCodec, TransportKind,
};

/// Glue between the terminal and the session: owns the connection manager
/// and dispatcher and fills in defaults from the settings.
pub struct Console {
    settings: ConsoleSettings,
    manager: ConnectionManager,
    dispatcher: RequestDispatcher,
}

impl Console {
    pub fn new(settings: ConsoleSettings) -> Self {
        let manager = sim::connection_manager(settings.simulator.clone());
        Self {
            settings,
            manager,
            dispatcher: RequestDispatcher::new(Arc::new(StellarCodec)),
        }
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.settings
    }

    pub async fn connect(&self, kind: Option<TransportKind>) -> Result<(), ConnectionError> {
        let kind = kind.unwrap_or(self.settings.transport);
        self.manager.connect(kind).await.map(|_| ())
    }

    pub async fn disconnect(&self) {
        self.manager.disconnect().await;
    }

    /// One line describing the session, plus the retry hint after a failure.
    pub fn status_text(&self) -> String {
        let snapshot = self.manager.snapshot();
        let mut text = format!(
            "{} ({})",
            snapshot.status,
            snapshot.transport_kind.label()
        );
        if let Some(error) = &snapshot.last_error {
            text.push_str(&format!("\nConnection failed: {}", error));
        }
        if let Some(hint) = snapshot.retry_hint() {
            text.push('\n');
            text.push_str(&hint);
        }
        text
    }

    /// Parse `key=value` words and fill in the saved defaults the method takes.
    pub fn parameters(&self, method: &str, words: &[String]) -> Result<Parameters, DispatchError> {
        let mut params = Parameters::from_pairs(words)?;
        if let Ok(method) = method.parse::<MethodName>() {
            if method.accepts("accountIndex") {
                params.insert_default("accountIndex", self.settings.account_index.to_string());
            }
            if method.accepts("network") {
                params.insert_default("network", self.settings.network.to_string());
            }
        }
        Ok(params)
    }

    pub async fn call(&self, method: &str, words: &[String]) -> Result<String, DispatchError> {
        let params = self.parameters(method, words)?;
        self.dispatcher.invoke(&self.manager, method, &params).await
    }

    /// Connect, run a single method, print its result and disconnect again.
    pub async fn run_once(&self, method: &str, words: &[String]) -> anyhow::Result<()> {
        if let Err(e) = self.connect(None).await {
            return Err(anyhow!("{}\n{}", e, self.status_text()));
        }
        let outcome = self.call(method, words).await;
        self.disconnect().await;
        println!("{}", outcome?);
        Ok(())
    }
}
