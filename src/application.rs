//! Application layer - collection run orchestration
//!
//! Coordinates the domain catalog with the search provider and the store
//! repository for a single collection run.

pub mod collection_plan;
pub mod collector;
pub mod use_cases;

// Re-export commonly used items
pub use collection_plan::{CategoryPlan, Pacing, PageWindow, SearchPlan, StopReason};
pub use collector::{CollectionReport, StoreCollector};
pub use use_cases::CollectStoresUseCase;
