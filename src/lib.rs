//! Period-over-period comparative analysis of monthly complaint records.
//!
//! The engine ingests a `;`-delimited table of dated, categorized complaint
//! rows and compares a "current" against a "reference" `(year, month)`
//! period: overall volume change, per-segment and per-channel nature/reason
//! breakdowns, top-5 most improved and most worsened natures, and a full
//! chronological trend series per segment.
//!
//! - [`loader`] normalizes raw rows into typed records,
//! - [`analysis`] filters, aggregates, ranks and assembles the report,
//! - [`output`] writes CSV/JSON artifacts and console previews.

pub mod analysis;
pub mod error;
pub mod loader;
pub mod output;
pub mod types;
pub mod util;
