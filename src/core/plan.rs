//! Stretch planning: turn a band histogram and the selected policy into the
//! per-band mapping the apply pass uses.
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::binning::Binning;
use crate::core::histogram::Histogram;
use crate::error::{Error, Result};
use crate::types::{OUTPUT_MAX, OUTPUT_RANGE};

/// How sample values are mapped onto the 256 output levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StretchPolicy {
    /// Linear stretch giving the output the requested mean and standard deviation.
    Deviation { mean: f64, stddev: f64 },
    /// Linear stretch of the value window between two cumulative fractions.
    Percentile { from: f64, to: f64 },
    /// Histogram matching toward a Gaussian of the given variance (0 = flat).
    Equalize { variance: f64 },
    /// Plain cast and clamp to the output range.
    Cast,
}

impl StretchPolicy {
    pub fn validate(&self) -> Result<()> {
        match *self {
            StretchPolicy::Deviation { mean, stddev } => {
                if !(mean >= 0.0) {
                    return Err(Error::InvalidArgument {
                        arg: "target mean",
                        value: mean.to_string(),
                    });
                }
                if !(stddev >= 0.0) {
                    return Err(Error::InvalidArgument {
                        arg: "target stddev",
                        value: stddev.to_string(),
                    });
                }
            }
            StretchPolicy::Percentile { from, to } => {
                if !(0.0 <= from && from < to && to <= 1.0) {
                    return Err(Error::InvalidArgument {
                        arg: "percentile range",
                        value: format!("{from} {to}"),
                    });
                }
            }
            StretchPolicy::Equalize { variance } => {
                if !(variance >= 0.0) {
                    return Err(Error::InvalidArgument {
                        arg: "variance",
                        value: variance.to_string(),
                    });
                }
            }
            StretchPolicy::Cast => {}
        }
        Ok(())
    }
}

impl std::fmt::Display for StretchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StretchPolicy::Deviation { mean, stddev } => {
                write!(f, "linear stretch (mean={mean}, stddev={stddev})")
            }
            StretchPolicy::Percentile { from, to } => {
                write!(f, "percentile range ({from}..{to})")
            }
            StretchPolicy::Equalize { variance } => {
                write!(f, "histogram equalization (variance={variance})")
            }
            StretchPolicy::Cast => write!(f, "cast"),
        }
    }
}

/// Per-band mapping from sample value to output byte.
#[derive(Debug, Clone, PartialEq)]
pub enum StretchPlan {
    /// `out = trunc((v - offset) * scale)` clamped to the output range.
    Linear { scale: f64, offset: f64 },
    /// `out = lookup[binning.to_bin(v)]`, one entry per source bin.
    Table { lookup: Vec<u8> },
}

impl StretchPlan {
    /// Output byte for a data sample, already moved off `out_ndv`.
    #[inline]
    pub fn map_value(&self, v: f64, binning: &Binning, out_ndv: u8) -> Result<u8> {
        match self {
            StretchPlan::Linear { scale, offset } => {
                Ok(avoid_ndv(linear_to_byte(v, *scale, *offset), out_ndv))
            }
            StretchPlan::Table { lookup } => Ok(lookup[binning.to_bin(v)?]),
        }
    }
}

/// Move a data byte that collides with the output no-data value one step
/// toward the middle of the range.
#[inline]
pub fn avoid_ndv(v: u8, out_ndv: u8) -> u8 {
    if v != out_ndv {
        v
    } else if out_ndv < (OUTPUT_RANGE / 2) as u8 {
        v + 1
    } else {
        v - 1
    }
}

#[inline]
pub fn linear_to_byte(v: f64, scale: f64, offset: f64) -> u8 {
    let out = (v - offset) * scale;
    if out.is_nan() || out < 0.0 {
        0
    } else if out > OUTPUT_MAX as f64 {
        OUTPUT_MAX
    } else {
        out as u8
    }
}

/// Linear plan reproducing `target_mean`/`target_stddev` on the band's histogram.
pub fn deviation_plan(h: &Histogram, target_mean: f64, target_stddev: f64) -> StretchPlan {
    if h.data_count == 0 {
        warn!("Band has no data pixels; every pixel maps to the no-data value");
        return StretchPlan::Linear {
            scale: 0.0,
            offset: 0.0,
        };
    }
    if target_stddev == 0.0 {
        let level = linear_to_byte(target_mean, 1.0, 0.0);
        return StretchPlan::Table {
            lookup: vec![level; h.binning.bin_count],
        };
    }
    if h.stddev == 0.0 {
        return StretchPlan::Linear {
            scale: 0.0,
            offset: h.mean,
        };
    }
    let scale = target_stddev / h.stddev;
    StretchPlan::Linear {
        scale,
        offset: h.mean - target_mean / scale,
    }
}

/// Bin indices bounding the `[from, to]` cumulative window of the histogram.
/// A window collapsing onto a single bin (or inverted by a heavy bin
/// straddling both bounds) widens to the whole bin range.
pub fn percentile_window(h: &Histogram, from: f64, to: f64) -> Result<(usize, usize)> {
    let start_count = (h.data_count as f64 * from) as u64;
    let end_count = (h.data_count as f64 * to) as u64;

    let mut cnt = 0u64;
    let mut from_idx = None;
    let mut to_idx = None;
    for (i, &c) in h.counts.iter().enumerate() {
        if cnt <= start_count {
            from_idx = Some(i);
        }
        cnt += c;
        if cnt <= end_count {
            to_idx = Some(i);
        } else {
            break;
        }
    }

    match (from_idx, to_idx) {
        (Some(lo), Some(hi)) if lo >= hi => Ok((0, h.binning.last_bin())),
        (Some(lo), Some(hi)) => Ok((lo, hi)),
        _ => Err(Error::PercentileWindow),
    }
}

/// Linear plan mapping the percentile window onto `[0, 255]`.
pub fn percentile_plan(h: &Histogram, from: f64, to: f64) -> Result<StretchPlan> {
    let (from_idx, to_idx) = percentile_window(h, from, to)?;
    let from_val = h.binning.from_bin(from_idx);
    let to_val = h.binning.from_bin(to_idx);
    debug!(
        "Percentile window: bins [{}, {}] -> values [{}, {}]",
        from_idx, to_idx, from_val, to_val
    );
    let span = to_val - from_val;
    let scale = if span > 0.0 {
        OUTPUT_MAX as f64 / span
    } else {
        0.0
    };
    Ok(StretchPlan::Linear {
        scale,
        offset: from_val,
    })
}

/// Discretized Gaussian over `levels` output levels centered on the middle
/// level, normalized to sum 1. A zero variance gives a flat distribution.
pub fn gaussian_target(variance: f64, levels: usize) -> Vec<f64> {
    let center = (levels / 2) as f64;
    let mut weights: Vec<f64> = (0..levels)
        .map(|k| {
            if variance == 0.0 {
                1.0
            } else {
                let x = (k as f64 - center) / variance;
                (-x * x).exp()
            }
        })
        .collect();
    let total: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= total;
    }
    weights
}

/// Lookup table sending each source bin to the smallest output level whose
/// cumulative target mass reaches the bin's cumulative source mass.
pub fn match_histogram(h: &Histogram, target: &[f64]) -> Vec<u8> {
    const EPS: f64 = 1e-12;
    let mut lookup = vec![0u8; h.counts.len()];
    if h.data_count == 0 || target.is_empty() {
        return lookup;
    }
    let total = h.data_count as f64;
    let last_level = target.len().min(OUTPUT_RANGE) - 1;

    let mut level = 0usize;
    let mut target_cdf = target[0];
    let mut src_cum = 0u64;
    for (entry, &cnt) in lookup.iter_mut().zip(&h.counts) {
        src_cum += cnt;
        let src_frac = src_cum as f64 / total;
        while level < last_level && target_cdf < src_frac - EPS {
            level += 1;
            target_cdf += target[level];
        }
        *entry = level as u8;
    }
    lookup
}

pub fn equalize_plan(h: &Histogram, variance: f64) -> StretchPlan {
    let target = gaussian_target(variance, OUTPUT_RANGE);
    StretchPlan::Table {
        lookup: match_histogram(h, &target),
    }
}

/// Plan for one band. Table entries are moved off `out_ndv` here; linear
/// results are adjusted per pixel in the apply pass.
pub fn plan_band(h: &Histogram, policy: &StretchPolicy, out_ndv: u8) -> Result<StretchPlan> {
    let plan = match *policy {
        StretchPolicy::Deviation { mean, stddev } => deviation_plan(h, mean, stddev),
        StretchPolicy::Percentile { from, to } => percentile_plan(h, from, to)?,
        StretchPolicy::Equalize { variance } => equalize_plan(h, variance),
        StretchPolicy::Cast => StretchPlan::Linear {
            scale: 1.0,
            offset: 0.0,
        },
    };
    Ok(match plan {
        StretchPlan::Table { mut lookup } => {
            for v in &mut lookup {
                *v = avoid_ndv(*v, out_ndv);
            }
            StretchPlan::Table { lookup }
        }
        linear => linear,
    })
}

pub fn plan_bands(
    histograms: &[Histogram],
    policy: &StretchPolicy,
    out_ndv: u8,
) -> Result<Vec<StretchPlan>> {
    if matches!(policy, StretchPolicy::Cast) {
        warn!("No stretch requested; casting input to 8-bit");
    }
    histograms
        .iter()
        .enumerate()
        .map(|(band_idx, h)| {
            let plan = plan_band(h, policy, out_ndv)?;
            match &plan {
                StretchPlan::Linear { scale, offset } => {
                    debug!("band {}: linear scale={} offset={}", band_idx + 1, scale, offset)
                }
                StretchPlan::Table { lookup } => {
                    debug!("band {}: lookup table with {} entries", band_idx + 1, lookup.len())
                }
            }
            Ok(plan)
        })
        .collect()
}
