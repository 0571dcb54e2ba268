use log::LevelFilter;

/// Initialize logging using env_logger.
///
/// `default_level` applies when `RUST_LOG` is unset; otherwise the
/// environment wins, e.g. `RUST_LOG=stellar_ledger_core=debug`.
pub fn init_logging(default_level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .try_init();
}
