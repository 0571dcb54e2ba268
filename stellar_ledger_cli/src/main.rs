mod ui;

use clap::Parser;
use log::LevelFilter;
use stellar_ledger_core::utils::logging::init_logging;

use crate::ui::cli;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    init_logging(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    if let Err(e) = cli::run_cli(args).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
