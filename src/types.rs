//! Shared types used across rastretch.
//! Includes the native `PixelType` reported by a raster source and the
//! output-range constants of the 8-bit target.
use serde::{Deserialize, Serialize};

/// Number of distinct output levels. The engine always writes 8-bit bands.
pub const OUTPUT_RANGE: usize = 256;

/// Largest output code.
pub const OUTPUT_MAX: u8 = (OUTPUT_RANGE - 1) as u8;

/// Native sample type of a source band, as far as binning selection cares.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum PixelType {
    UInt8,
    UInt16,
    Int16,
    /// Any other type (32/64-bit integers, floats, complex). Binned over the
    /// observed value range.
    Other,
}

impl PixelType {
    /// True for the integral types that get an exact one-bin-per-value binning.
    pub fn is_exact(&self) -> bool {
        !matches!(self, PixelType::Other)
    }
}

impl std::fmt::Display for PixelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelType::UInt8 => write!(f, "UInt8"),
            PixelType::UInt16 => write!(f, "UInt16"),
            PixelType::Int16 => write!(f, "Int16"),
            PixelType::Other => write!(f, "Other"),
        }
    }
}
