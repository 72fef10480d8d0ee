//! Local search provider port
//!
//! The collector only depends on [`LocalSearchProvider`]; the Naver client in
//! `infrastructure` and the scripted providers used in tests both implement it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::geo::ScaledCoordinate;

/// One page request against the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    /// 1-based offset of the first result
    pub start: u32,
    /// Page size
    pub display: u32,
    pub sort: SortMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMode {
    /// 정확도순
    #[default]
    #[serde(rename = "sim")]
    Similarity,
    /// 리뷰 많은순
    #[serde(rename = "comment")]
    Comment,
}

impl SortMode {
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Similarity => "sim",
            Self::Comment => "comment",
        }
    }
}

/// A single raw result as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPlace {
    /// May contain `<b>` highlighting
    #[serde(default)]
    pub title: String,
    #[serde(rename = "roadAddress", default)]
    pub road_address: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub mapx: Option<ScaledCoordinate>,
    #[serde(default)]
    pub mapy: Option<ScaledCoordinate>,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(String),

    #[error("search provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode search response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait LocalSearchProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawPlace>, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_naver_item_shape() {
        let place: RawPlace = serde_json::from_value(json!({
            "title": "<b>붕어빵</b> 명가",
            "link": "",
            "category": "간식>붕어빵",
            "roadAddress": "서울특별시 광진구 능동로 1",
            "address": "서울특별시 광진구 화양동 1",
            "mapx": "1270712345",
            "mapy": "375432100"
        }))
        .unwrap();

        assert_eq!(place.road_address.as_deref(), Some("서울특별시 광진구 능동로 1"));
        assert_eq!(place.mapx, Some(ScaledCoordinate::Text("1270712345".to_string())));
    }

    #[test]
    fn tolerates_missing_fields() {
        let place: RawPlace = serde_json::from_value(json!({ "title": "x", "mapx": 1270000000 })).unwrap();
        assert_eq!(place.road_address, None);
        assert_eq!(place.mapy, None);
        assert_eq!(place.mapx, Some(ScaledCoordinate::Number(1_270_000_000.0)));
    }
}
