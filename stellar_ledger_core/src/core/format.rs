//! Turns device results into text for display.
//!
//! The rules depend on the method that produced the result:
//! public keys become account addresses, signatures become base64, other
//! buffers become lowercase hex and records are pretty-printed JSON with
//! any embedded buffers rendered as hex.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::warn;
use serde_json::{Map, Value};

use crate::codec::ChainCodec;
use crate::core::methods::MethodName;
use crate::device::{MethodResult, Record, RecordValue};

pub fn format_result(method: MethodName, result: &MethodResult, codec: &dyn ChainCodec) -> String {
    if method == MethodName::GetPublicKey {
        if let Some(key) = public_key_bytes(result) {
            return match codec.encode_address(&key) {
                Ok(address) => address,
                Err(e) => {
                    warn!("Failed to encode Stellar address: {}", e);
                    format!("Error encoding Stellar address: {}", e)
                }
            };
        }
    }

    if method.is_signing() {
        if let Some(signature) = signature_bytes(result) {
            return BASE64.encode(signature);
        }
    }

    match result {
        MethodResult::RawBytes(bytes)
        | MethodResult::Signature(bytes)
        | MethodResult::PublicKey(bytes) => hex::encode(bytes),
        MethodResult::Record(record) => {
            let json = record_to_json(record);
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        }
        MethodResult::Primitive(value) => value.to_string(),
    }
}

fn public_key_bytes(result: &MethodResult) -> Option<Vec<u8>> {
    match result {
        MethodResult::PublicKey(bytes) | MethodResult::RawBytes(bytes) => Some(bytes.clone()),
        MethodResult::Record(record) => record.get("rawPublicKey").and_then(RecordValue::as_bytes),
        _ => None,
    }
}

fn signature_bytes(result: &MethodResult) -> Option<Vec<u8>> {
    match result {
        MethodResult::Signature(bytes) | MethodResult::RawBytes(bytes) => Some(bytes.clone()),
        MethodResult::Record(record) => record.get("signature").and_then(RecordValue::as_bytes),
        _ => None,
    }
}

fn record_to_json(record: &Record) -> Value {
    let map: Map<String, Value> = record
        .fields()
        .map(|(key, value)| (key.to_string(), value_to_json(value)))
        .collect();
    Value::Object(map)
}

fn value_to_json(value: &RecordValue) -> Value {
    match value {
        RecordValue::Null => Value::Null,
        RecordValue::Bool(b) => Value::Bool(*b),
        RecordValue::Integer(n) => Value::from(*n),
        RecordValue::Text(s) => Value::String(s.clone()),
        RecordValue::Bytes(bytes) => Value::String(hex::encode(bytes)),
        RecordValue::List(items) => Value::Array(items.iter().map(value_to_json).collect()),
        RecordValue::Record(inner) => record_to_json(inner),
    }
}
