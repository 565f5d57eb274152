//! Site Analysis
//!
//! - `binning`: distance to a reference point + fixed-width bands
//! - `masking`: constraint union overlap flags
//! - `summary`: per-band / per-ring counts

pub mod binning;
pub mod masking;
pub mod summary;

pub use binning::{bin, format_meters, BandedCell, BinningConfig, DistanceBand};
pub use masking::{mask, ConstraintUnion};
pub use summary::{ring_index, summarize, BandSummary, RingSummary, SiteSummary};
