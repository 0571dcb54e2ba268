use log::debug;
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    FeeBumpTransactionInnerTx, Hash, Limits, MuxedAccount, Preconditions, ReadXdr, Transaction,
    TransactionEnvelope, TransactionExt, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, TransactionV0, WriteXdr,
};

use super::network::network_id;
use super::{ChainCodec, CodecError};

/// Nesting allowed while decoding user supplied XDR. Matches the depth limit
/// Stellar Core applies to transaction sets.
pub const XDR_DEPTH_LIMIT: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    TxV0,
    Tx,
    FeeBump,
}

/// A decoded transaction envelope together with the bytes the device signs.
#[derive(Debug, Clone)]
pub struct ParsedTransaction {
    kind: EnvelopeKind,
    operation_count: usize,
    payload: Vec<u8>,
}

impl ParsedTransaction {
    pub fn new(kind: EnvelopeKind, operation_count: usize, payload: Vec<u8>) -> Self {
        Self {
            kind,
            operation_count,
            payload,
        }
    }

    pub fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    pub fn operation_count(&self) -> usize {
        self.operation_count
    }

    /// Network id, envelope type tag and transaction body, XDR-encoded.
    pub fn signature_payload(&self) -> &[u8] {
        &self.payload
    }

    /// The transaction hash as shown by explorers.
    pub fn hash(&self) -> [u8; 32] {
        Sha256::digest(&self.payload).into()
    }
}

/// [`ChainCodec`] backed by the Stellar XDR definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StellarCodec;

impl StellarCodec {
    pub fn new() -> Self {
        Self
    }
}

// Pre-protocol-13 envelopes are signed as if they were v1 transactions.
fn upgrade_v0(tx: TransactionV0) -> Transaction {
    Transaction {
        source_account: MuxedAccount::Ed25519(tx.source_account_ed25519),
        fee: tx.fee,
        seq_num: tx.seq_num,
        cond: match tx.time_bounds {
            Some(bounds) => Preconditions::Time(bounds),
            None => Preconditions::None,
        },
        memo: tx.memo,
        operations: tx.operations,
        ext: TransactionExt::V0,
    }
}

impl ChainCodec for StellarCodec {
    fn parse_envelope(
        &self,
        xdr: &str,
        network_passphrase: &str,
    ) -> Result<ParsedTransaction, CodecError> {
        let xdr = xdr.trim();
        // Base64 text is always longer than the bytes it carries.
        let limits = Limits {
            depth: XDR_DEPTH_LIMIT,
            len: xdr.len(),
        };
        let envelope = TransactionEnvelope::from_xdr_base64(xdr, limits)
            .map_err(|e| CodecError::Envelope(e.to_string()))?;

        let (kind, operation_count, tagged) = match envelope {
            TransactionEnvelope::TxV0(env) => {
                let tx = upgrade_v0(env.tx);
                (
                    EnvelopeKind::TxV0,
                    tx.operations.len(),
                    TransactionSignaturePayloadTaggedTransaction::Tx(tx),
                )
            }
            TransactionEnvelope::Tx(env) => (
                EnvelopeKind::Tx,
                env.tx.operations.len(),
                TransactionSignaturePayloadTaggedTransaction::Tx(env.tx),
            ),
            TransactionEnvelope::TxFeeBump(env) => {
                let inner_ops = match &env.tx.inner_tx {
                    FeeBumpTransactionInnerTx::Tx(inner) => inner.tx.operations.len(),
                };
                (
                    EnvelopeKind::FeeBump,
                    inner_ops,
                    TransactionSignaturePayloadTaggedTransaction::TxFeeBump(env.tx),
                )
            }
        };

        let payload = TransactionSignaturePayload {
            network_id: Hash(network_id(network_passphrase)),
            tagged_transaction: tagged,
        }
        .to_xdr(Limits {
            depth: XDR_DEPTH_LIMIT,
            len: usize::MAX,
        })
        .map_err(|e| CodecError::Envelope(e.to_string()))?;

        debug!(
            "Parsed {:?} envelope with {} operation(s), payload {} bytes",
            kind,
            operation_count,
            payload.len()
        );

        Ok(ParsedTransaction {
            kind,
            operation_count,
            payload,
        })
    }

    fn encode_address(&self, public_key: &[u8]) -> Result<String, CodecError> {
        let key: [u8; 32] = public_key
            .try_into()
            .map_err(|_| CodecError::InvalidPublicKey(public_key.len()))?;
        Ok(stellar_strkey::ed25519::PublicKey(key).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Network;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use stellar_xdr::curr::{
        HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Memo, Operation, OperationBody,
        ScAddress, ScSymbol, ScVal, SequenceNumber, TransactionV0Envelope, TransactionV0Ext,
        TransactionV1Envelope, Uint256, VecM,
    };

    fn v1_envelope() -> TransactionEnvelope {
        TransactionEnvelope::Tx(TransactionV1Envelope {
            tx: Transaction {
                source_account: MuxedAccount::Ed25519(Uint256([7; 32])),
                fee: 100,
                seq_num: SequenceNumber(42),
                cond: Preconditions::None,
                memo: Memo::None,
                operations: VecM::default(),
                ext: TransactionExt::V0,
            },
            signatures: VecM::default(),
        })
    }

    #[test]
    fn payload_starts_with_network_id_and_tx_tag() {
        let xdr = v1_envelope().to_xdr_base64(Limits::none()).unwrap();
        let parsed = StellarCodec
            .parse_envelope(&xdr, Network::Testnet.passphrase())
            .unwrap();

        let payload = parsed.signature_payload();
        assert_eq!(&payload[..32], &Network::Testnet.network_id());
        // ENVELOPE_TYPE_TX
        assert_eq!(&payload[32..36], &[0, 0, 0, 2]);
        assert_eq!(parsed.kind(), EnvelopeKind::Tx);
    }

    #[test]
    fn v0_envelope_signs_like_its_v1_form() {
        let v0 = TransactionEnvelope::TxV0(TransactionV0Envelope {
            tx: TransactionV0 {
                source_account_ed25519: Uint256([7; 32]),
                fee: 100,
                seq_num: SequenceNumber(42),
                time_bounds: None,
                memo: Memo::None,
                operations: VecM::default(),
                ext: TransactionV0Ext::V0,
            },
            signatures: VecM::default(),
        });
        let passphrase = Network::Pubnet.passphrase();

        let from_v0 = StellarCodec
            .parse_envelope(&v0.to_xdr_base64(Limits::none()).unwrap(), passphrase)
            .unwrap();
        let from_v1 = StellarCodec
            .parse_envelope(
                &v1_envelope().to_xdr_base64(Limits::none()).unwrap(),
                passphrase,
            )
            .unwrap();

        assert_eq!(from_v0.kind(), EnvelopeKind::TxV0);
        assert_eq!(from_v0.signature_payload(), from_v1.signature_payload());
    }

    #[test]
    fn network_changes_payload() {
        let xdr = v1_envelope().to_xdr_base64(Limits::none()).unwrap();
        let test = StellarCodec
            .parse_envelope(&xdr, Network::Testnet.passphrase())
            .unwrap();
        let public = StellarCodec
            .parse_envelope(&xdr, Network::Pubnet.passphrase())
            .unwrap();
        assert_ne!(test.hash(), public.hash());
    }

    #[test]
    fn garbage_envelope_is_rejected() {
        assert!(StellarCodec
            .parse_envelope("not-an-envelope", Network::Testnet.passphrase())
            .is_err());
    }

    #[test]
    fn zero_key_encodes_to_the_well_known_address() {
        assert_eq!(
            StellarCodec.encode_address(&[0u8; 32]).unwrap(),
            "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF"
        );
    }

    #[test]
    fn short_key_is_an_encoding_error() {
        let err = StellarCodec.encode_address(&[1, 2, 3]).unwrap_err();
        assert!(err.to_string().contains("3 bytes"));
    }

    const ARG_MARKER: u32 = 0xdead_beef;

    /// A contract call whose single argument is wrapped in `nesting` one-element
    /// `ScVal::Vec`s. The wrapping is spliced in as raw bytes so building the
    /// input never recurses.
    fn contract_call_xdr(nesting: usize) -> String {
        let call = Operation {
            source_account: None,
            body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: HostFunction::InvokeContract(InvokeContractArgs {
                    contract_address: ScAddress::Contract(Hash([9; 32])),
                    function_name: ScSymbol("transfer".try_into().unwrap()),
                    args: vec![ScVal::U32(ARG_MARKER)].try_into().unwrap(),
                }),
                auth: VecM::default(),
            }),
        };
        let mut envelope = v1_envelope();
        if let TransactionEnvelope::Tx(env) = &mut envelope {
            env.tx.operations = vec![call].try_into().unwrap();
        }
        let mut bytes = envelope.to_xdr(Limits::none()).unwrap();

        // SCV_U32 discriminant followed by the marker value.
        let mut arg = vec![0, 0, 0, 3];
        arg.extend_from_slice(&ARG_MARKER.to_be_bytes());
        let at = bytes
            .windows(arg.len())
            .position(|w| w == arg.as_slice())
            .unwrap();
        // SCV_VEC, Some(..), one element.
        let wrapper: [u8; 12] = [0, 0, 0, 16, 0, 0, 0, 1, 0, 0, 0, 1];
        let prefix: Vec<u8> = wrapper.iter().copied().cycle().take(12 * nesting).collect();
        bytes.splice(at..at, prefix);
        BASE64.encode(bytes)
    }

    #[test]
    fn shallow_contract_call_arguments_parse() {
        let parsed = StellarCodec
            .parse_envelope(&contract_call_xdr(10), Network::Testnet.passphrase())
            .unwrap();
        assert_eq!(parsed.operation_count(), 1);
    }

    #[test]
    fn deeply_nested_envelope_is_rejected_not_overflowed() {
        for nesting in [2_000, 200_000] {
            let err = StellarCodec
                .parse_envelope(&contract_call_xdr(nesting), Network::Testnet.passphrase())
                .unwrap_err();
            assert!(matches!(err, CodecError::Envelope(_)), "got {:?}", err);
        }
    }
}
