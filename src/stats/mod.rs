//! Stats module - grouped counts and code tables

mod aggregator;
mod codes;

pub use aggregator::{
    AggregateError, Aggregator, CountRow, CountTable, CrossTab, Density, Metrics, Period,
    AGE_BINS,
};
pub use codes::{ethnicity_label, UNKNOWN};
