use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{debug, info};

use crate::codec::{ChainCodec, Network};
use crate::core::connection_manager::ConnectionManager;
use crate::core::errors::DispatchError;
use crate::core::format::format_result;
use crate::core::methods::{MethodName, ParamKind, Parameters};
use crate::device::{AppClient, DerivationPath, DeviceError, MethodResult};

/// A validated request, consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRequest {
    pub method: MethodName,
    pub parameters: Parameters,
}

impl MethodRequest {
    pub fn new(method_name: &str, parameters: Parameters) -> Result<Self, DispatchError> {
        Ok(Self {
            method: method_name.parse()?,
            parameters,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    Text,
    Base64,
}

/// A request with every input decoded, ready to go to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedCall {
    GetAppConfiguration,
    GetPublicKey {
        path: DerivationPath,
        display: bool,
    },
    SignTransaction {
        path: DerivationPath,
        network: Network,
        payload: Vec<u8>,
    },
    SignSorobanAuthorization {
        path: DerivationPath,
        preimage: Vec<u8>,
    },
    SignHash {
        path: DerivationPath,
        hash: Vec<u8>,
    },
    SignMessage {
        path: DerivationPath,
        message: Vec<u8>,
    },
}

/// Maps method names plus parameters onto app client calls and formats the answer.
#[derive(Clone)]
pub struct RequestDispatcher {
    codec: Arc<dyn ChainCodec>,
}

impl RequestDispatcher {
    pub fn new(codec: Arc<dyn ChainCodec>) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &dyn ChainCodec {
        self.codec.as_ref()
    }

    /// Run one method against the session's app client and return display text.
    ///
    /// Inputs are decoded before the client is looked at, so unknown methods
    /// and malformed parameters never reach the device. Only one request may
    /// run at a time; a concurrent call fails with [`DispatchError::Busy`].
    pub async fn invoke(
        &self,
        session: &ConnectionManager,
        method_name: &str,
        parameters: &Parameters,
    ) -> Result<String, DispatchError> {
        let request = MethodRequest::new(method_name, parameters.clone())?;
        let call = self.prepare(&request)?;

        let handle = session.client().ok_or(DispatchError::NotConnected)?;
        let mut client = handle.try_lock().map_err(|_| DispatchError::Busy)?;

        info!("Invoking {}", request.method);
        let result = self.execute(&mut **client, &call).await?;
        Ok(format_result(request.method, &result, self.codec.as_ref()))
    }

    /// Validate and decode the parameters of `request`.
    pub fn prepare(&self, request: &MethodRequest) -> Result<PreparedCall, DispatchError> {
        let params = &request.parameters;
        if let Some(unknown) = params.names().find(|name| !request.method.accepts(name)) {
            return Err(DispatchError::Parameter(format!(
                "{} does not take a '{}' parameter",
                request.method, unknown
            )));
        }
        for spec in request.method.parameters() {
            if spec.required && spec.default.is_none() && params.text(spec.name).is_none() {
                return Err(DispatchError::Parameter(format!(
                    "{} is required",
                    spec.label
                )));
            }
            if let (ParamKind::Choice(options), Some(value)) = (spec.kind, params.text(spec.name)) {
                if !options.contains(&value) {
                    return Err(DispatchError::Parameter(format!(
                        "{} must be one of {}, got '{}'",
                        spec.label,
                        options.join(", "),
                        value
                    )));
                }
            }
        }

        let call = match request.method {
            MethodName::GetAppConfiguration => PreparedCall::GetAppConfiguration,
            MethodName::GetPublicKey => PreparedCall::GetPublicKey {
                path: derivation_path(params)?,
                display: params.flag("displayOnDevice")?.unwrap_or(false),
            },
            MethodName::SignTransaction => {
                let path = derivation_path(params)?;
                let network = params
                    .text("network")
                    .unwrap_or("testnet")
                    .parse::<Network>()
                    .map_err(|e| DispatchError::Parameter(e.to_string()))?;
                let envelope = required_text(params, "transactionEnvelope")?;
                let parsed = self
                    .codec
                    .parse_envelope(envelope, network.passphrase())
                    .map_err(|e| DispatchError::Transaction(e.to_string()))?;
                debug!(
                    "Envelope has {} operation(s), hash {}",
                    parsed.operation_count(),
                    hex::encode(parsed.hash())
                );
                PreparedCall::SignTransaction {
                    path,
                    network,
                    payload: parsed.signature_payload().to_vec(),
                }
            }
            MethodName::SignSorobanAuthorization => PreparedCall::SignSorobanAuthorization {
                path: derivation_path(params)?,
                preimage: decode_base64("hashIdPreimage", required_text(params, "hashIdPreimage")?)?,
            },
            MethodName::SignHash => {
                let path = derivation_path(params)?;
                let text = required_text(params, "hash")?;
                let hash = hex::decode(text.strip_prefix("0x").unwrap_or(text)).map_err(|e| {
                    DispatchError::Parameter(format!("Hash is not valid hex: {}", e))
                })?;
                if hash.len() != 32 {
                    return Err(DispatchError::Parameter(format!(
                        "Hash must be 32 bytes, got {} bytes",
                        hash.len()
                    )));
                }
                PreparedCall::SignHash { path, hash }
            }
            MethodName::SignMessage => {
                let path = derivation_path(params)?;
                let format = match params.text("inputFormat").unwrap_or("text") {
                    "base64" => MessageFormat::Base64,
                    _ => MessageFormat::Text,
                };
                let raw = required_text(params, "message")?;
                let message = match format {
                    MessageFormat::Text => raw.as_bytes().to_vec(),
                    MessageFormat::Base64 => decode_base64("message", raw)?,
                };
                PreparedCall::SignMessage { path, message }
            }
        };
        Ok(call)
    }

    /// Perform a prepared call on `client`.
    pub async fn execute(
        &self,
        client: &mut dyn AppClient,
        call: &PreparedCall,
    ) -> Result<MethodResult, DispatchError> {
        let result = match call {
            PreparedCall::GetAppConfiguration => client.get_app_configuration().await?,
            PreparedCall::GetPublicKey { path, display } => {
                debug!("getPublicKey {} display={}", path, display);
                client.get_public_key(path, *display).await?
            }
            PreparedCall::SignTransaction {
                path,
                network,
                payload,
            } => {
                debug!("signTransaction {} on {}", path, network);
                client
                    .sign_transaction(path, payload)
                    .await
                    .map_err(transaction_failure)?
            }
            PreparedCall::SignSorobanAuthorization { path, preimage } => {
                client.sign_soroban_authorization(path, preimage).await?
            }
            PreparedCall::SignHash { path, hash } => client.sign_hash(path, hash).await?,
            // The app client has no message signing command to call.
            PreparedCall::SignMessage { .. } => {
                return Err(DispatchError::Unimplemented("signMessage"))
            }
        };
        Ok(result)
    }
}

fn required_text<'a>(params: &'a Parameters, name: &str) -> Result<&'a str, DispatchError> {
    params
        .text(name)
        .ok_or_else(|| DispatchError::Parameter(format!("{} is required", name)))
}

// Device failures while signing a transaction carry the same context as
// envelope decoding failures.
fn transaction_failure(source: DeviceError) -> DispatchError {
    match DispatchError::from(source) {
        DispatchError::Device { message, source } => DispatchError::Device {
            message: format!("Failed to process transaction: {}", message),
            source,
        },
        other => other,
    }
}

/// An explicit `derivationPath` wins; otherwise the path is built from `accountIndex`.
fn derivation_path(params: &Parameters) -> Result<DerivationPath, DispatchError> {
    if let Some(path) = params.text("derivationPath") {
        return path
            .parse::<DerivationPath>()
            .map_err(|e| DispatchError::Parameter(e.to_string()));
    }
    let index_text = params.text("accountIndex").unwrap_or("0");
    let index: u32 = index_text.parse().map_err(|_| {
        DispatchError::Parameter(format!(
            "Account index must be a non-negative integer, got '{}'",
            index_text
        ))
    })?;
    DerivationPath::for_account(index).map_err(|e| DispatchError::Parameter(e.to_string()))
}

fn decode_base64(name: &str, text: &str) -> Result<Vec<u8>, DispatchError> {
    BASE64
        .decode(text)
        .map_err(|e| DispatchError::Parameter(format!("{} is not valid base64: {}", name, e)))
}
