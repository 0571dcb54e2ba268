//! Chain-specific encoding: transaction envelopes and account addresses.

pub mod network;
pub mod stellar;

use thiserror::Error;

pub use network::{Network, PUBNET_PASSPHRASE, TESTNET_PASSPHRASE};
pub use stellar::{EnvelopeKind, ParsedTransaction, StellarCodec};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{0}")]
    Envelope(String),

    #[error("Public key must be 32 bytes, got {0} bytes")]
    InvalidPublicKey(usize),

    #[error("Unknown network '{0}' (expected testnet or pubnet)")]
    UnknownNetwork(String),
}

pub trait ChainCodec: Send + Sync {
    /// Decode a base64 XDR transaction envelope for the given network.
    fn parse_envelope(
        &self,
        xdr: &str,
        network_passphrase: &str,
    ) -> Result<ParsedTransaction, CodecError>;

    /// Render a raw ed25519 public key as an account address (`G...`).
    fn encode_address(&self, public_key: &[u8]) -> Result<String, CodecError>;
}
