pub mod errors;
pub mod transport;

// Re-export the modules here for easy import elsewhere.
pub use errors::*;
pub use transport::*;
