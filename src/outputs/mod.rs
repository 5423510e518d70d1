//! Run report outputs for the scheduler.
//!
//! # Submodules
//!
//! - [`json`]: writes the [`RunReport`](crate::report::RunReport) as a JSON document
//! - [`markdown`]: renders a per-feed summary table and appends it to a file
//!   such as a CI job summary
//!
//! Articles themselves are written by [`crate::storage`]; nothing here
//! touches `processed_articles/`.

pub mod json;
pub mod markdown;
