//! Core stretch engine: binning, block iteration, no-data classification,
//! histogram accumulation, stretch planning and the apply pass. These are
//! the building blocks the high-level `api` module drives.
pub mod apply;
pub mod binning;
pub mod blocks;
pub mod histogram;
pub mod ndv;
pub mod params;
pub mod plan;
