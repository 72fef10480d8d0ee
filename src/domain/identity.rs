//! 매장 식별 키와 텍스트 정규화
//!
//! 같은 실제 매장이 여러 키워드/카테고리 검색에서 반복해서 나타나므로,
//! 이름 + 주소 (+ 반올림 좌표) 로 만든 정규화 키로 중복을 판단합니다.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::geo::GeoPoint;

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("static markup regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static whitespace regex"));

/// Number of decimals kept for coordinates inside the identity key
pub const KEY_COORDINATE_DECIMALS: i32 = 5;

/// Remove inline markup (e.g. `<b>붕어빵</b>`) from a provider title.
pub fn strip_markup(raw: &str) -> String {
    MARKUP_TAG.replace_all(raw, "").trim().to_string()
}

/// Trim, collapse whitespace runs to a single space and lowercase.
pub fn normalize_text(raw: &str) -> String {
    WHITESPACE_RUN
        .replace_all(raw.trim(), " ")
        .to_lowercase()
}

/// Administrative district token (`강남구`) of an address like `서울 강남구 역삼동 ...`.
///
/// Returns an empty string unless the first token starts with `city_marker`.
pub fn district_from(address: &str, city_marker: &str) -> String {
    let mut parts = address.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(city), Some(district)) if city.starts_with(city_marker) => district.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Derived dedup key for a store. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(name: &str, address: &str, position: Option<GeoPoint>) -> Self {
        let name = normalize_text(name);
        let address = normalize_text(address);
        match position {
            Some(point) => Self(format!(
                "{}|{}|{}|{}",
                name,
                address,
                round_to(point.lat, KEY_COORDINATE_DECIMALS),
                round_to(point.lng, KEY_COORDINATE_DECIMALS)
            )),
            None => Self(format!("{name}|{address}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
