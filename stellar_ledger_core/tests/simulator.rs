#![cfg(feature = "simulator")]

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::LevelFilter;
use stellar_ledger_core::device::AppClient;
use stellar_ledger_core::sim::{self, SimulatorConfig};
use stellar_ledger_core::{
    ConnectionStatus, DispatchError, Parameters, RequestDispatcher, StellarCodec, TransportKind,
};

fn init_logs() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

fn dispatcher() -> RequestDispatcher {
    RequestDispatcher::new(Arc::new(StellarCodec))
}

#[tokio::test]
async fn full_session_against_the_simulated_device() {
    init_logs();
    let manager = sim::connection_manager(SimulatorConfig {
        hash_signing_enabled: true,
        ..SimulatorConfig::default()
    });

    manager.connect(TransportKind::Hid).await.unwrap();
    assert_eq!(manager.status(), ConnectionStatus::Connected);

    let config = dispatcher()
        .invoke(&manager, "getAppConfiguration", &Parameters::new())
        .await
        .unwrap();
    assert!(config.contains("\"version\": \"5.0.3\""));
    assert!(config.contains("\"hashSigningEnabled\": true"));

    let address = dispatcher()
        .invoke(&manager, "getPublicKey", &Parameters::new())
        .await
        .unwrap();
    assert!(address.starts_with('G'));
    assert_eq!(address.len(), 56);

    let signature = dispatcher()
        .invoke(
            &manager,
            "signHash",
            &Parameters::new().with("hash", "11".repeat(32)),
        )
        .await
        .unwrap();
    assert_eq!(BASE64.decode(signature).unwrap().len(), 64);

    manager.disconnect().await;
    assert_eq!(manager.status(), ConnectionStatus::Disconnected);
}

async fn address_of(seed: &str, index: &str) -> anyhow::Result<String> {
    let manager = sim::connection_manager(SimulatorConfig {
        seed: seed.to_string(),
        ..SimulatorConfig::default()
    });
    manager.connect(TransportKind::Usb).await?;
    let address = dispatcher()
        .invoke(
            &manager,
            "getPublicKey",
            &Parameters::new().with("accountIndex", index),
        )
        .await?;
    manager.disconnect().await;
    Ok(address)
}

#[tokio::test]
async fn accounts_differ_per_index_and_repeat_per_seed() -> anyhow::Result<()> {
    init_logs();
    let zero = address_of("alpha", "0").await?;
    let one = address_of("alpha", "1").await?;
    let zero_again = address_of("alpha", "0").await?;
    let other_seed = address_of("beta", "0").await?;

    assert_ne!(zero, one);
    assert_eq!(zero, zero_again);
    assert_ne!(zero, other_seed);
    Ok(())
}

#[tokio::test]
async fn closed_app_answers_with_the_open_app_hint() {
    init_logs();
    let manager = sim::connection_manager(SimulatorConfig {
        app_open: false,
        ..SimulatorConfig::default()
    });
    manager.connect(TransportKind::Usb).await.unwrap();

    let err = dispatcher()
        .invoke(&manager, "getAppConfiguration", &Parameters::new())
        .await
        .unwrap_err();

    assert!(err
        .to_string()
        .contains("Please make sure you have opened the Stellar app"));
}

#[tokio::test]
async fn hash_signing_must_be_enabled() {
    init_logs();
    let manager = sim::connection_manager(SimulatorConfig::default());
    manager.connect(TransportKind::Usb).await.unwrap();

    let err = dispatcher()
        .invoke(
            &manager,
            "signHash",
            &Parameters::new().with("hash", "22".repeat(32)),
        )
        .await
        .unwrap_err();

    match err {
        DispatchError::Device { source, .. } => assert_eq!(source.status_code(), Some(0x6c66)),
        other => panic!("expected a device error, got {:?}", other),
    }
}

#[tokio::test]
async fn blocked_transport_fails_and_other_kind_works() {
    init_logs();
    let manager = sim::connection_manager(SimulatorConfig {
        blocked_transports: vec![TransportKind::Usb],
        ..SimulatorConfig::default()
    });

    let err = manager.connect(TransportKind::Usb).await.err().expect("connect over a blocked transport should fail");
    assert!(err.to_string().contains("Access denied"));
    assert_eq!(manager.status(), ConnectionStatus::Error);
    assert_eq!(
        manager.snapshot().retry_hint().as_deref(),
        Some("Please try switching to WebHID and connect again.")
    );

    manager.connect(TransportKind::Hid).await.unwrap();
    assert_eq!(manager.status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn client_kept_past_disconnect_sees_a_closed_transport() {
    init_logs();
    let manager = sim::connection_manager(SimulatorConfig::default());
    let client = manager.connect(TransportKind::Usb).await.unwrap();
    manager.disconnect().await;

    let mut client = client.lock().await;
    let err = client.get_app_configuration().await.unwrap_err();
    assert_eq!(err.to_string(), "Transport is closed");
}
