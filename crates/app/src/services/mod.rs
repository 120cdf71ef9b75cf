pub mod controller;
pub mod debounce;

pub use controller::TodoController;
pub use debounce::SearchDebouncer;
