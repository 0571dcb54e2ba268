pub mod settings;

pub use settings::{ConsoleSettings, SettingsError, SettingsStore};
