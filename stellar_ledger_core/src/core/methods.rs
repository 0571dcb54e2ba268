use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::DispatchError;

/// The device methods the console knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodName {
    GetAppConfiguration,
    GetPublicKey,
    SignTransaction,
    SignSorobanAuthorization,
    SignHash,
    SignMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Non-negative integer entered as text.
    Number,
    Flag,
    Choice(&'static [&'static str]),
    Text,
}

/// Describes one input of a method, as a form would render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<&'static str>,
    pub description: &'static str,
}

const ACCOUNT_INDEX: ParameterSpec = ParameterSpec {
    name: "accountIndex",
    label: "Account Index",
    kind: ParamKind::Number,
    required: true,
    default: Some("0"),
    description: "Account index for derivation path 44'/148'/x' (default: 0)",
};

const DERIVATION_PATH: ParameterSpec = ParameterSpec {
    name: "derivationPath",
    label: "Derivation Path",
    kind: ParamKind::Text,
    required: false,
    default: None,
    description: "Full key path such as 44'/148'/0'; overrides accountIndex",
};

const GET_PUBLIC_KEY_PARAMS: &[ParameterSpec] = &[
    ACCOUNT_INDEX,
    DERIVATION_PATH,
    ParameterSpec {
        name: "displayOnDevice",
        label: "Display on Device",
        kind: ParamKind::Flag,
        required: false,
        default: Some("false"),
        description: "Show the address on the Ledger device screen for verification",
    },
];

const SIGN_TRANSACTION_PARAMS: &[ParameterSpec] = &[
    ACCOUNT_INDEX,
    DERIVATION_PATH,
    ParameterSpec {
        name: "network",
        label: "Network",
        kind: ParamKind::Choice(&["testnet", "pubnet"]),
        required: true,
        default: Some("testnet"),
        description: "Select the Stellar network for the transaction",
    },
    ParameterSpec {
        name: "transactionEnvelope",
        label: "Transaction Envelope XDR",
        kind: ParamKind::Text,
        required: true,
        default: None,
        description: "Transaction envelope XDR as base64 string",
    },
];

const SIGN_SOROBAN_AUTHORIZATION_PARAMS: &[ParameterSpec] = &[
    ACCOUNT_INDEX,
    DERIVATION_PATH,
    ParameterSpec {
        name: "hashIdPreimage",
        label: "HashIDPreimage XDR",
        kind: ParamKind::Text,
        required: true,
        default: None,
        description: "HashIDPreimage as base64 string",
    },
];

const SIGN_HASH_PARAMS: &[ParameterSpec] = &[
    ACCOUNT_INDEX,
    DERIVATION_PATH,
    ParameterSpec {
        name: "hash",
        label: "Hash (Hex)",
        kind: ParamKind::Text,
        required: true,
        default: None,
        description: "Hash to sign as hex string (32 bytes)",
    },
];

const SIGN_MESSAGE_PARAMS: &[ParameterSpec] = &[
    ACCOUNT_INDEX,
    DERIVATION_PATH,
    ParameterSpec {
        name: "inputFormat",
        label: "Input Format",
        kind: ParamKind::Choice(&["text", "base64"]),
        required: true,
        default: Some("text"),
        description: "Format of the input message",
    },
    ParameterSpec {
        name: "message",
        label: "Message",
        kind: ParamKind::Text,
        required: true,
        default: None,
        description: "Message to sign (text or base64 depending on input format)",
    },
];

impl MethodName {
    pub const ALL: [MethodName; 6] = [
        MethodName::GetAppConfiguration,
        MethodName::GetPublicKey,
        MethodName::SignTransaction,
        MethodName::SignSorobanAuthorization,
        MethodName::SignHash,
        MethodName::SignMessage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MethodName::GetAppConfiguration => "getAppConfiguration",
            MethodName::GetPublicKey => "getPublicKey",
            MethodName::SignTransaction => "signTransaction",
            MethodName::SignSorobanAuthorization => "signSorobanAuthorization",
            MethodName::SignHash => "signHash",
            MethodName::SignMessage => "signMessage",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            MethodName::GetAppConfiguration => "Get App Configuration",
            MethodName::GetPublicKey => "Get Public Key",
            MethodName::SignTransaction => "Sign Transaction",
            MethodName::SignSorobanAuthorization => "Sign Soroban Authorization",
            MethodName::SignHash => "Sign Hash",
            MethodName::SignMessage => "Sign Message",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MethodName::GetAppConfiguration => {
                "Retrieve the Stellar app configuration from your Ledger device."
            }
            MethodName::GetPublicKey => {
                "Retrieve a Stellar public key for the specified derivation path."
            }
            MethodName::SignTransaction => "Sign a Stellar transaction using your Ledger device.",
            MethodName::SignSorobanAuthorization => "Sign a HashIDPreimage.",
            MethodName::SignHash => "Sign an arbitrary hash using your Ledger device.",
            MethodName::SignMessage => "Sign a message using your Ledger device.",
        }
    }

    pub fn parameters(self) -> &'static [ParameterSpec] {
        match self {
            MethodName::GetAppConfiguration => &[],
            MethodName::GetPublicKey => GET_PUBLIC_KEY_PARAMS,
            MethodName::SignTransaction => SIGN_TRANSACTION_PARAMS,
            MethodName::SignSorobanAuthorization => SIGN_SOROBAN_AUTHORIZATION_PARAMS,
            MethodName::SignHash => SIGN_HASH_PARAMS,
            MethodName::SignMessage => SIGN_MESSAGE_PARAMS,
        }
    }

    pub fn accepts(self, parameter: &str) -> bool {
        self.parameters().iter().any(|spec| spec.name == parameter)
    }

    /// Methods whose result is a signature.
    pub fn is_signing(self) -> bool {
        matches!(
            self,
            MethodName::SignTransaction
                | MethodName::SignSorobanAuthorization
                | MethodName::SignHash
                | MethodName::SignMessage
        )
    }
}

impl Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodName {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodName::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownMethod(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Flag(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// User supplied inputs of one request, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, ParamValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Insert only when the caller did not provide the parameter.
    pub fn insert_default(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.0.entry(name.to_string()).or_insert_with(|| value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Text value with surrounding whitespace removed; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(ParamValue::Text(s)) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    /// Boolean value; text forms `true`/`false`/`1`/`0`/`yes`/`no` are accepted.
    pub fn flag(&self, name: &str) -> Result<Option<bool>, DispatchError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(ParamValue::Flag(b)) => Ok(Some(*b)),
            Some(ParamValue::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "" => Ok(None),
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                other => Err(DispatchError::Parameter(format!(
                    "{} must be true or false, got '{}'",
                    name, other
                ))),
            },
        }
    }

    /// Parse `key=value` words as typed on a command line. A bare `key`
    /// is a flag set to true.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = Parameters::new();
        for pair in pairs {
            let pair = pair.as_ref();
            match pair.split_once('=') {
                Some((key, _)) if key.trim().is_empty() => {
                    return Err(DispatchError::Parameter(format!(
                        "Malformed parameter '{}'",
                        pair
                    )))
                }
                Some((key, value)) => params.insert(key.trim(), value),
                None => params.insert(pair.trim(), true),
            }
        }
        Ok(params)
    }
}
