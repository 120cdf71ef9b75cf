pub mod commands;
pub mod gateway;
pub mod grouping;
pub mod insights;
pub mod pagination;
pub mod projection;
pub mod store;

pub use commands::*;
pub use gateway::{FetchGateway, GatewayResult, RetryBudget};
pub use grouping::{group_by_day, DayGroup, NumberedTodo};
pub use pagination::{LinkKind, PageButton};
pub use projection::{FollowUp, TodoProjection};
pub use store::CollectionStore;
