use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Affine mapping between real sample values and histogram bin indices.
///
/// `to_bin(v) = round((v - offset) / scale)` clamped to `[0, bin_count - 1]`,
/// `from_bin(i) = i * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    pub bin_count: usize,
    pub offset: f64,
    pub scale: f64,
}

impl Binning {
    /// Build a binning, falling back to `scale = 1` when the given scale is not
    /// a positive finite number.
    pub fn new(bin_count: usize, offset: f64, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Self {
            bin_count: bin_count.max(1),
            offset,
            scale,
        }
    }

    /// One bin per integer value starting at `offset`.
    pub fn identity(bin_count: usize, offset: f64) -> Self {
        Self::new(bin_count, offset, 1.0)
    }

    /// `bin_count` bins whose first and last centers sit on `min` and `max`.
    /// A zero-width range still yields a usable binning with `scale = 1`.
    pub fn spanning(min: f64, max: f64, bin_count: usize) -> Self {
        let bin_count = bin_count.max(1);
        // Divide before subtracting so ranges near f64::MAX do not overflow.
        let steps = (bin_count - 1).max(1) as f64;
        let scale = max / steps - min / steps;
        let offset = if min.is_finite() { min } else { 0.0 };
        Self::new(bin_count, offset, scale)
    }

    #[inline]
    pub fn last_bin(&self) -> usize {
        self.bin_count - 1
    }

    /// Bin index of `v`. Infinities land on the edge bins; NaN is an error since
    /// no-data classification must have removed it.
    #[inline]
    pub fn to_bin(&self, v: f64) -> Result<usize> {
        if v == f64::NEG_INFINITY {
            return Ok(0);
        }
        if v == f64::INFINITY {
            return Ok(self.last_bin());
        }
        let delta = v - self.offset;
        let bin = if delta.is_finite() {
            (delta / self.scale).round()
        } else {
            (v / self.scale - self.offset / self.scale).round()
        };
        if bin.is_nan() {
            return Err(Error::NanInBinning);
        }
        if bin < 0.0 {
            Ok(0)
        } else if bin > self.last_bin() as f64 {
            Ok(self.last_bin())
        } else {
            Ok(bin as usize)
        }
    }

    #[inline]
    pub fn from_bin(&self, i: usize) -> f64 {
        i as f64 * self.scale + self.offset
    }
}
