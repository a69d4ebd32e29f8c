//! No-data classification.
//!
//! A rule set is an ordered list of slabs. Each slab holds either one
//! interval shared by every band or one interval per band; a pixel matches a
//! slab when every band's sample lies inside its interval. A pixel is no-data
//! when it matches any slab, with the verdict flipped when the set is
//! inverted (valid-range mode). NaN in any band is always no-data.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn single(v: f64) -> Self {
        Self { min: v, max: v }
    }

    /// Matches every non-NaN sample.
    pub fn everything() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}..{}", self.min, self.max)
        }
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parse = |t: &str| -> std::result::Result<f64, String> {
            let v = t
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", t.trim()))?;
            if v.is_nan() {
                return Err("NaN cannot be used as a bound".to_string());
            }
            Ok(v)
        };
        match s.split_once("..") {
            Some((lo, hi)) => {
                let interval = Interval::new(parse(lo)?, parse(hi)?);
                if interval.min > interval.max {
                    return Err(format!("lower bound {} exceeds upper bound {}", interval.min, interval.max));
                }
                Ok(interval)
            }
            None => Ok(Interval::single(parse(s)?)),
        }
    }
}

/// One rule of the set: a single shared interval or one interval per band.
///
/// Text form: entries separated by whitespace or commas, each entry a value
/// (`0`) or a range (`-inf..0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NdvSlab {
    pub intervals: Vec<Interval>,
}

impl NdvSlab {
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    pub fn shared(interval: Interval) -> Self {
        Self {
            intervals: vec![interval],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Interval applying to `band`; a single interval applies to all bands.
    #[inline]
    fn interval_for(&self, band: usize) -> &Interval {
        if self.intervals.len() == 1 {
            &self.intervals[0]
        } else {
            &self.intervals[band]
        }
    }

    #[inline]
    fn matches<F: Fn(usize) -> f64>(&self, band_count: usize, sample: &F) -> bool {
        (0..band_count).all(|band| self.interval_for(band).contains(sample(band)))
    }
}

impl fmt::Display for NdvSlab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.intervals.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

impl FromStr for NdvSlab {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidSlab {
            text: s.to_string(),
            reason,
        };
        let intervals = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(|t| t.parse::<Interval>().map_err(&invalid))
            .collect::<Result<Vec<_>>>()?;
        if intervals.is_empty() {
            return Err(invalid("no values given".to_string()));
        }
        Ok(Self { intervals })
    }
}

impl TryFrom<String> for NdvSlab {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<NdvSlab> for String {
    fn from(slab: NdvSlab) -> Self {
        slab.to_string()
    }
}

/// The complete no-data rule set for a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NdvDef {
    pub slabs: Vec<NdvSlab>,
    pub invert: bool,
}

impl NdvDef {
    /// Pixels matching any slab are no-data.
    pub fn no_data(slabs: Vec<NdvSlab>) -> Self {
        Self {
            slabs,
            invert: false,
        }
    }

    /// Pixels matching any slab are data; everything else is no-data.
    pub fn valid_range(slabs: Vec<NdvSlab>) -> Self {
        Self {
            slabs,
            invert: true,
        }
    }

    /// Rule set from each band's intrinsic no-data value. Bands without one get
    /// a wildcard interval, so the slab only constrains bands that declare a value.
    pub fn from_band_values(values: &[Option<f64>]) -> Self {
        if values.iter().all(Option::is_none) {
            return Self::default();
        }
        let intervals = values
            .iter()
            .map(|v| v.map(Interval::single).unwrap_or_else(Interval::everything))
            .collect();
        Self::no_data(vec![NdvSlab::new(intervals)])
    }

    pub fn is_empty(&self) -> bool {
        self.slabs.is_empty()
    }

    /// Reject slabs whose interval count is neither 1 nor `band_count`.
    pub fn validate(&self, band_count: usize) -> Result<()> {
        for (slab_idx, slab) in self.slabs.iter().enumerate() {
            let n = slab.intervals.len();
            if n != 1 && n != band_count {
                return Err(Error::MalformedNoData {
                    slab: slab_idx,
                    intervals: n,
                    bands: band_count,
                });
            }
        }
        Ok(())
    }

    /// Classify one pixel given an accessor for each band's sample.
    #[inline]
    pub fn classify<F: Fn(usize) -> f64>(&self, band_count: usize, sample: F) -> bool {
        if (0..band_count).any(|band| sample(band).is_nan()) {
            return true;
        }
        let matched = self
            .slabs
            .iter()
            .any(|slab| slab.matches(band_count, &sample));
        matched != self.invert
    }

    /// Classify one pixel given one sample per band.
    pub fn is_nodata(&self, samples: &[f64]) -> bool {
        self.classify(samples.len(), |band| samples[band])
    }

    /// Classify the first `len` pixels of a block, one buffer per band.
    pub fn fill_mask(&self, bands: &[Vec<f64>], len: usize, mask: &mut [bool]) {
        let band_count = bands.len();
        for (i, slot) in mask[..len].iter_mut().enumerate() {
            *slot = self.classify(band_count, |band| bands[band][i]);
        }
    }
}

impl fmt::Display for NdvDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.slabs.iter().map(|s| format!("[{s}]")).collect();
        let kind = if self.invert { "valid" } else { "nodata" };
        write!(f, "{kind} {}", parts.join(" | "))
    }
}
