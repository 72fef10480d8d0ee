//! 수집 계획 (검색 공간 + 한도)
//!
//! Describes the search space a run walks through (districts × categories ×
//! keywords × result pages) and the limits that end it early.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::catalog::CategoryQuota;
use crate::domain::search::SortMode;

/// One category label with its search keywords and storage ceiling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPlan {
    pub name: String,
    pub keywords: Vec<String>,
    /// Maximum number of stores that may carry this category
    pub limit: usize,
}

impl CategoryPlan {
    pub fn new(name: &str, keywords: &[&str], limit: usize) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            limit,
        }
    }

    /// Configured keywords with blanks skipped
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
    }
}

/// Result offsets requested for each query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    /// 1-based offset of the first page
    pub first_start: u32,
    /// Last offset that may be requested (inclusive)
    pub last_start: u32,
    pub stride: u32,
    /// Results per page
    pub display: u32,
}

impl PageWindow {
    pub fn starts(&self) -> impl Iterator<Item = u32> {
        let stride = usize::try_from(self.stride.max(1)).unwrap_or(1);
        (self.first_start..=self.last_start).step_by(stride)
    }
}

/// Everything the collector needs to know about what to search and when to stop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPlan {
    /// City prefix placed in front of every query (`서울`)
    pub city: String,
    pub districts: Vec<String>,
    /// Traversal order is the order of this list
    pub categories: Vec<CategoryPlan>,
    /// Maximum number of new stores one run may create
    pub daily_target: usize,
    /// The run stops once the catalog holds this many stores
    pub total_hard_cap: usize,
    pub pages: PageWindow,
    #[serde(default)]
    pub sort: SortMode,
}

impl SearchPlan {
    pub fn quota(&self) -> CategoryQuota {
        CategoryQuota::new(self.categories.iter().map(|c| (c.name.clone(), c.limit)))
    }

    /// `"{city} {district} {keyword}"` with empty parts dropped
    pub fn compose_query(&self, district: &str, keyword: &str) -> String {
        [self.city.as_str(), district, keyword]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Fixed pauses between provider requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    /// After every successfully processed page
    pub page_delay_ms: u64,
    /// After a failed request, before moving on
    pub error_delay_ms: u64,
}

impl Pacing {
    pub const NONE: Self = Self {
        page_delay_ms: 0,
        error_delay_ms: 0,
    };

    pub const fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub const fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }
}

/// Why a run ended before walking the whole search space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    DailyTargetReached,
    TotalCapReached,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DailyTargetReached => f.write_str("daily target reached"),
            Self::TotalCapReached => f.write_str("total hard cap reached"),
        }
    }
}
