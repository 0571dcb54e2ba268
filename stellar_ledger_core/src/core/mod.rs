pub mod connection_manager;
pub mod dispatcher;
pub mod errors;
pub mod format;
pub mod methods;

// Re-export the modules here for easy import elsewhere.
pub use connection_manager::*;
pub use dispatcher::*;
pub use errors::*;
pub use format::format_result;
pub use methods::*;
