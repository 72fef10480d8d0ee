//! Repository interfaces for the dessert-shop catalog
//!
//! The catalog is read once before a collection run and written once after it.

use async_trait::async_trait;
use anyhow::Result;

use crate::domain::store::{Store, StoreRecord};

#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Previously persisted records. A missing or unreadable catalog yields an empty list.
    async fn load_all(&self) -> Result<Vec<StoreRecord>>;

    /// Replace the persisted catalog with `stores` (already ordered by id).
    async fn save_all(&self, stores: &[Store]) -> Result<()>;
}
