//! Crime Dashboard - LA crime incident analysis
//!
//! Loads the incident CSV, cleans it once, and recomputes filtered
//! aggregates and charts on demand.

pub mod charts;
pub mod config;
pub mod data;
pub mod nobel;
pub mod report;
pub mod stats;
