pub mod model;
pub mod report;
pub mod update;
pub mod view;

// Re-exports for convenience
pub use model::*;
pub use report::*;
pub use update::*;
pub use view::*;
