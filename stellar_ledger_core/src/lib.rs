pub mod codec;
pub mod connections;
pub mod core;
pub mod device;
#[cfg(feature = "simulator")]
pub mod sim;
pub mod storage;
pub mod utils;

// re‑export ergonomic entry points
pub use codec::{ChainCodec, Network, StellarCodec};
pub use connections::TransportKind;
pub use crate::core::connection_manager::{ConnectionManager, ConnectionSnapshot, ConnectionStatus};
pub use crate::core::dispatcher::RequestDispatcher;
pub use crate::core::errors::{ConnectionError, DispatchError};
pub use crate::core::methods::{MethodName, Parameters};
