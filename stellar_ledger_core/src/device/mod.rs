pub mod client;
pub mod path;
pub mod result;

pub use client::*;
pub use path::{DerivationPath, PathError};
pub use result::{MethodResult, Primitive, Record, RecordValue};
