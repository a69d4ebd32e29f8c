//! Per-band histograms over binned sample values.
//!
//! Counts are accumulated in one streaming pass over every block of the
//! source. Mean and standard deviation are then derived from the finished
//! count table (so their precision is bounded by the bin width), while
//! `min`/`max` follow the raw samples.
use tracing::debug;

use crate::core::binning::Binning;
use crate::core::blocks::{BlockBuffers, BlockWindows};
use crate::core::ndv::NdvDef;
use crate::error::Result;
use crate::io::RasterSource;

/// Distribution of one band's data pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub binning: Binning,
    pub counts: Vec<u64>,
    pub data_count: u64,
    pub ndv_count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
}

impl Histogram {
    /// Empty histogram for `binning`; statistics are NaN until finalized.
    pub fn new(binning: Binning) -> Self {
        Self {
            binning,
            counts: vec![0; binning.bin_count],
            data_count: 0,
            ndv_count: 0,
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            stddev: f64::NAN,
        }
    }

    /// Derive `data_count`, `mean` and `stddev` from the count table.
    /// A histogram without data ends with NaN mean and stddev.
    fn finalize(&mut self) {
        let binning = self.binning;
        let mut data_count = 0u64;
        let mut accum = 0.0f64;
        for (i, &cnt) in self.counts.iter().enumerate() {
            data_count += cnt;
            accum += binning.from_bin(i) * cnt as f64;
        }
        self.data_count = data_count;
        self.mean = accum / data_count as f64;

        let mean = self.mean;
        let var_accum: f64 = self
            .counts
            .iter()
            .enumerate()
            .filter(|(_, cnt)| **cnt > 0)
            .map(|(i, &cnt)| {
                let d = binning.from_bin(i) - mean;
                d * d * cnt as f64
            })
            .sum();
        self.stddev = (var_accum / data_count as f64).sqrt();
    }

    /// Total pixels seen for this band, data and no-data.
    pub fn pixel_count(&self) -> u64 {
        self.data_count + self.ndv_count
    }
}

/// Streaming builder of one histogram per band.
#[derive(Debug, Clone)]
pub struct HistogramAccumulator {
    histograms: Vec<Histogram>,
    seen: Vec<bool>,
}

impl HistogramAccumulator {
    pub fn new(binnings: &[Binning]) -> Self {
        Self {
            histograms: binnings.iter().copied().map(Histogram::new).collect(),
            seen: vec![false; binnings.len()],
        }
    }

    /// Add the first `len` pixels of a block. `mask[i]` marks pixel `i` as no-data
    /// for every band.
    pub fn consume_block(&mut self, bands: &[Vec<f64>], mask: &[bool], len: usize) -> Result<()> {
        for ((hg, seen), samples) in self
            .histograms
            .iter_mut()
            .zip(self.seen.iter_mut())
            .zip(bands)
        {
            for (&v, &is_ndv) in samples[..len].iter().zip(&mask[..len]) {
                if is_ndv {
                    hg.ndv_count += 1;
                    continue;
                }
                hg.counts[hg.binning.to_bin(v)?] += 1;
                if v == f64::INFINITY {
                    continue;
                }
                if !*seen {
                    hg.min = v;
                    hg.max = v;
                    *seen = true;
                } else {
                    hg.min = hg.min.min(v);
                    hg.max = hg.max.max(v);
                }
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Vec<Histogram> {
        for hg in &mut self.histograms {
            hg.finalize();
        }
        self.histograms
    }
}

/// Build one histogram per band of `source`, classifying pixels with `ndv`.
pub fn compute_histograms<S: RasterSource + ?Sized>(
    source: &S,
    ndv: &NdvDef,
    binnings: &[Binning],
) -> Result<Vec<Histogram>> {
    let windows = BlockWindows::new(source.size(), source.block_size());
    let mut buffers = BlockBuffers::for_windows(source.band_count(), &windows);
    let mut accumulator = HistogramAccumulator::new(binnings);

    let mut blocks = 0usize;
    for window in windows {
        buffers.load(source, &window, ndv)?;
        accumulator.consume_block(&buffers.bands, &buffers.mask, window.len())?;
        blocks += 1;
    }
    debug!("Histogram pass consumed {} blocks", blocks);

    Ok(accumulator.finish())
}

/// Finite extremes of each band's data pixels; `None` for a band without any.
/// Used to size the binning of bands whose type has no natural bin layout.
pub fn compute_minmax<S: RasterSource + ?Sized>(
    source: &S,
    ndv: &NdvDef,
) -> Result<Vec<Option<(f64, f64)>>> {
    let band_count = source.band_count();
    let windows = BlockWindows::new(source.size(), source.block_size());
    let mut buffers = BlockBuffers::for_windows(band_count, &windows);
    let mut minmax: Vec<Option<(f64, f64)>> = vec![None; band_count];

    for window in windows {
        buffers.load(source, &window, ndv)?;
        let len = window.len();
        for (range, samples) in minmax.iter_mut().zip(&buffers.bands) {
            for (&v, &is_ndv) in samples[..len].iter().zip(&buffers.mask[..len]) {
                if is_ndv || !v.is_finite() {
                    continue;
                }
                *range = match *range {
                    None => Some((v, v)),
                    Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                };
            }
        }
    }
    Ok(minmax)
}
