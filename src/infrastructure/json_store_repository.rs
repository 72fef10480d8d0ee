//! JSON file implementation of [`StoreRepository`]
//!
//! The catalog is one pretty-printed JSON array of store records. Loading is
//! lenient: a missing file, a `null` document or a document that is not a JSON
//! array all start an empty catalog (the unreadable one is copied aside first).
//! Inside the array every entry is decoded on its own, so one odd record never
//! costs the rest of the catalog.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::repositories::StoreRepository;
use crate::domain::store::{Store, StoreRecord};

const CORRUPTED_SUFFIX: &str = ".corrupted";
const TEMP_SUFFIX: &str = ".tmp";

pub struct JsonStoreRepository {
    path: PathBuf,
}

impl JsonStoreRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("stores.json"));
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Where an unreadable catalog is copied before it gets overwritten
    pub fn corrupted_backup_path(&self) -> PathBuf {
        self.sibling(CORRUPTED_SUFFIX)
    }

    async fn back_up_unreadable(&self) {
        let backup = self.corrupted_backup_path();
        match fs::copy(&self.path, &backup).await {
            Ok(_) => warn!("💾 Unreadable catalog copied to {:?}", backup),
            Err(e) => warn!("Failed to back up unreadable catalog to {:?}: {}", backup, e),
        }
    }
}

#[async_trait]
impl StoreRepository for JsonStoreRepository {
    async fn load_all(&self) -> Result<Vec<StoreRecord>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("📄 No catalog at {:?}, starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read catalog {:?}", self.path));
            }
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(Value::Null) => return Ok(Vec::new()),
            Ok(_) => {
                warn!("⚠️ Catalog {:?} is not a JSON array, starting empty", self.path);
                self.back_up_unreadable().await;
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!("⚠️ Catalog {:?} is not valid JSON ({}), starting empty", self.path, e);
                self.back_up_unreadable().await;
                return Ok(Vec::new());
            }
        };

        let total = items.len();
        let records: Vec<StoreRecord> = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("⚠️ Skipping catalog entry #{}: {}", index, e);
                    None
                }
            })
            .collect();

        if records.len() < total {
            self.back_up_unreadable().await;
        }
        Ok(records)
    }

    async fn save_all(&self, stores: &[Store]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let body = serde_json::to_string_pretty(stores).context("Failed to serialize catalog")?;
        let temp = self.sibling(TEMP_SUFFIX);
        fs::write(&temp, body)
            .await
            .with_context(|| format!("Failed to write {:?}", temp))?;
        fs::rename(&temp, &self.path)
            .await
            .with_context(|| format!("Failed to replace catalog {:?}", self.path))?;

        info!("💾 Saved {} stores to {:?}", stores.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let repo = JsonStoreRepository::new(dir.path().join("stores.json"));
        assert!(repo.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn null_document_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stores.json");
        std::fs::write(&path, "null").unwrap();
        let repo = JsonStoreRepository::new(&path);
        assert!(repo.load_all().await.unwrap().is_empty());
        assert!(!repo.corrupted_backup_path().exists());
    }

    #[tokio::test]
    async fn garbage_is_backed_up_and_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stores.json");
        std::fs::write(&path, "{not json").unwrap();
        let repo = JsonStoreRepository::new(&path);

        assert!(repo.load_all().await.unwrap().is_empty());
        let backup = repo.corrupted_backup_path();
        assert_eq!(backup, dir.path().join("stores.json.corrupted"));
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "{not json");
    }

    #[tokio::test]
    async fn odd_entries_do_not_cost_the_rest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stores.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 1, "name": "a", "address": "서울 a", "instagramHandle": null},
                {"id": "2", "name": "b", "address": "서울 b"},
                "not a store",
                {"id": 3, "name": "c", "address": "서울 c"}
            ]"#,
        )
        .unwrap();
        let repo = JsonStoreRepository::new(&path);

        let records = repo.load_all().await.unwrap();
        let ids: Vec<Option<u64>> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(1), None, Some(3)]);
        assert_eq!(records[1].name, "b");
        assert!(repo.corrupted_backup_path().exists());
    }

    #[tokio::test]
    async fn non_array_document_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stores.json");
        std::fs::write(&path, r#"{"stores": []}"#).unwrap();
        let repo = JsonStoreRepository::new(&path);

        assert!(repo.load_all().await.unwrap().is_empty());
        assert!(repo.corrupted_backup_path().exists());
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("public").join("stores.json");
        let repo = JsonStoreRepository::new(&path);

        repo.save_all(&[]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        assert!(!dir.path().join("public").join("stores.json.tmp").exists());
    }
}
