pub mod transport;
pub mod persistence;
pub mod time;

// Re-exports
pub use transport::*;
pub use persistence::*;
pub use time::*;
