use std::fmt::{self, Display};

/// What an application client hands back for a single call.
///
/// Adapters tag the payload explicitly so formatting never has to guess
/// whether a value is a key, a signature or an opaque buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResult {
    /// A structured answer such as the app configuration.
    Record(Record),
    /// Bytes with no further meaning attached.
    RawBytes(Vec<u8>),
    /// A signature produced by one of the signing commands.
    Signature(Vec<u8>),
    /// A raw ed25519 public key, rendered as an account address.
    PublicKey(Vec<u8>),
    Primitive(Primitive),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null,
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Null => write!(f, "null"),
            Primitive::Bool(b) => write!(f, "{}", b),
            Primitive::Integer(n) => write!(f, "{}", n),
            Primitive::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One value inside a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Null,
    Bool(bool),
    Integer(i64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<RecordValue>),
    Record(Record),
}

impl RecordValue {
    /// Bytes carried by this value: a buffer, or a `{ data: [..] }` wrapper
    /// as produced by JSON-serialised byte arrays.
    pub fn as_bytes(&self) -> Option<Vec<u8>> {
        match self {
            RecordValue::Bytes(b) => Some(b.clone()),
            RecordValue::List(items) => items
                .iter()
                .map(|item| match item {
                    RecordValue::Integer(n) => u8::try_from(*n).ok(),
                    _ => None,
                })
                .collect(),
            RecordValue::Record(inner) => inner.get("data").and_then(RecordValue::as_bytes),
            _ => None,
        }
    }
}

impl From<bool> for RecordValue {
    fn from(v: bool) -> Self {
        RecordValue::Bool(v)
    }
}

impl From<i64> for RecordValue {
    fn from(v: i64) -> Self {
        RecordValue::Integer(v)
    }
}

impl From<u32> for RecordValue {
    fn from(v: u32) -> Self {
        RecordValue::Integer(i64::from(v))
    }
}

impl From<&str> for RecordValue {
    fn from(v: &str) -> Self {
        RecordValue::Text(v.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(v: String) -> Self {
        RecordValue::Text(v)
    }
}

impl From<Vec<u8>> for RecordValue {
    fn from(v: Vec<u8>) -> Self {
        RecordValue::Bytes(v)
    }
}

impl From<Record> for RecordValue {
    fn from(v: Record) -> Self {
        RecordValue::Record(v)
    }
}

/// Ordered field list; insertion order is kept when rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, RecordValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A later value for the same key replaces the earlier one.
    pub fn with(mut self, key: &str, value: impl Into<RecordValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<RecordValue>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&RecordValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &RecordValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
