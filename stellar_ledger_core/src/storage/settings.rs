use std::{fs, io, path::PathBuf};

use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::Network;
use crate::connections::TransportKind;
#[cfg(feature = "simulator")]
use crate::sim::SimulatorConfig;

const FILE_NAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unable to locate config dir")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Console defaults that survive between runs.
///
/// Stored as JSON, e.g.
/// `{ "transport":"usb", "network":"testnet", "account_index":0 }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub transport: TransportKind,
    pub network: Network,
    pub account_index: u32,
    #[cfg(feature = "simulator")]
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    /// `~/.config/stellar_ledger_console` on Linux, `%APPDATA%\stellar_ledger_console` on Windows, etc.
    pub fn new() -> Result<Self, SettingsError> {
        let proj = ProjectDirs::from("", "", "stellar_ledger_console")
            .ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::at(proj.config_dir()))
    }

    /// A store rooted at an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(FILE_NAME)
    }

    /// Missing file means defaults; a file that does not parse is an error.
    pub fn load(&self) -> Result<ConsoleSettings, SettingsError> {
        let path = self.path();
        match fs::File::open(&path) {
            Ok(file) => {
                debug!("Loading settings from {:?}", path);
                Ok(serde_json::from_reader(io::BufReader::new(file))?)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ConsoleSettings::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Create or overwrite the settings file.
    pub fn save(&self, settings: &ConsoleSettings) -> Result<(), SettingsError> {
        fs::create_dir_all(&self.dir)?;
        let file = fs::File::create(self.path())?;
        serde_json::to_writer_pretty(file, settings)?;
        Ok(())
    }
}
