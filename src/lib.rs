//! Dessert Map Collector - incremental Seoul dessert-shop catalog builder
//!
//! Walks (district × category keyword × result page) through the Naver Local
//! Search API, keeps only results inside Seoul, folds them into the persisted
//! catalog by identity key and stops at the daily new-store target or the
//! global hard cap.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;
