use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::CodecError;

pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const PUBNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Pubnet,
}

impl Network {
    pub fn passphrase(self) -> &'static str {
        match self {
            Network::Testnet => TESTNET_PASSPHRASE,
            Network::Pubnet => PUBNET_PASSPHRASE,
        }
    }

    /// SHA-256 of the passphrase; the first 32 bytes of every signature payload.
    pub fn network_id(self) -> [u8; 32] {
        network_id(self.passphrase())
    }
}

pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "testnet"),
            Network::Pubnet => write!(f, "pubnet"),
        }
    }
}

impl FromStr for Network {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "pubnet" | "public" => Ok(Network::Pubnet),
            other => Err(CodecError::UnknownNetwork(other.to_string())),
        }
    }
}
