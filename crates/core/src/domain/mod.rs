pub mod todo;
pub mod stats;
pub mod query;
pub mod page;
pub mod events;

// Re-exports for convenience
pub use todo::*;
pub use stats::*;
pub use query::*;
pub use page::*;
pub use events::*;
