use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;
use stellar_ledger_core::storage::{ConsoleSettings, SettingsStore};
use stellar_ledger_core::{MethodName, Network, TransportKind};

use crate::ui::console::Console;
use crate::ui::repl;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "stellar-ledger-console",
    version,
    about = "Exercise the Stellar Ledger app API",
    subcommand_required = true
)]
pub struct Args {
    /// Transport to connect with: usb or hid (overrides the saved default)
    #[arg(long, global = true)]
    pub transport: Option<TransportKind>,

    /// Network for signTransaction: testnet or pubnet
    #[arg(long, global = true)]
    pub network: Option<Network>,

    /// Account index used for 44'/148'/N' when a call gives none
    #[arg(long, global = true)]
    pub account: Option<u32>,

    /// Simulated device: behave as if the Stellar app is not open
    #[arg(long, global = true)]
    pub app_closed: bool,

    /// Simulated device: allow signHash
    #[arg(long, global = true)]
    pub hash_signing: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the available methods and their parameters
    Methods,
    /// Connect, run one method, print the result and disconnect
    Call {
        /// Method name, e.g. getPublicKey
        method: String,
        /// Parameters as key=value; a bare key sets a flag
        #[arg(value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Interactive console
    Repl,
    /// Show or persist the defaults
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print the effective settings
    Show,
    /// Save the effective settings (including flags given now) as defaults
    Save,
}

pub async fn run_cli(args: Args) -> anyhow::Result<()> {
    let store = SettingsStore::new()?;
    let mut settings = store
        .load()
        .with_context(|| format!("reading {}", store.path().display()))?;
    apply_overrides(&mut settings, &args);

    match args.command {
        Command::Methods => print_methods(),
        Command::Call { method, params } => {
            let console = Console::new(settings);
            console.run_once(&method, &params).await?;
        }
        Command::Repl => repl::run(Console::new(settings)).await?,
        Command::Settings { action } => match action {
            SettingsAction::Show => println!("{}", serde_json::to_string_pretty(&settings)?),
            SettingsAction::Save => {
                store.save(&settings)?;
                info!("Settings written");
                println!("Saved to {}", store.path().display());
            }
        },
    }
    Ok(())
}

fn apply_overrides(settings: &mut ConsoleSettings, args: &Args) {
    if let Some(transport) = args.transport {
        settings.transport = transport;
    }
    if let Some(network) = args.network {
        settings.network = network;
    }
    if let Some(account) = args.account {
        settings.account_index = account;
    }
    if args.app_closed {
        settings.simulator.app_open = false;
    }
    if args.hash_signing {
        settings.simulator.hash_signing_enabled = true;
    }
}

pub fn print_methods() {
    for method in MethodName::ALL {
        println!("{:<26}{}", method.as_str(), method.description());
        for param in method.parameters() {
            let default = param
                .default
                .map(|d| format!(" [default: {}]", d))
                .unwrap_or_default();
            let name = if param.required {
                format!("{}*", param.name)
            } else {
                param.name.to_string()
            };
            println!("    {:<22}{}{}", name, param.description, default);
        }
    }
}
