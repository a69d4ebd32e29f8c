//! High-level, ergonomic library API: stretch a dataset on disk to an 8-bit
//! dataset, stretch in-memory arrays to buffers, or only compute and report
//! the per-band histograms. Prefer these entrypoints over the low-level `core`
//! modules when integrating rastretch.
use ndarray::Array2;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::apply::apply_stretch;
use crate::core::binning::Binning;
use crate::core::histogram::{Histogram, compute_histograms, compute_minmax};
use crate::core::ndv::NdvDef;
use crate::core::params::StretchParams;
use crate::core::plan::{StretchPlan, StretchPolicy, plan_bands};
use crate::error::{Error, Result};
use crate::io::gdal::{GdalSink, GdalSource, check_driver};
use crate::io::memory::MemSink;
use crate::io::{RasterSink, RasterSource};
use crate::types::PixelType;

/// Exact binning for the small integral types; otherwise `float_bin_count`
/// bins over the observed range, which costs one extra min/max pass (run at
/// most once, and only when some band needs it).
pub fn select_binnings<S: RasterSource + ?Sized>(
    source: &S,
    ndv: &NdvDef,
    float_bin_count: usize,
) -> Result<Vec<Binning>> {
    let pixel_types = (0..source.band_count())
        .map(|band| source.pixel_type(band))
        .collect::<Result<Vec<_>>>()?;

    let minmax = if pixel_types.iter().all(PixelType::is_exact) {
        None
    } else {
        info!("Computing min/max for binning...");
        Some(compute_minmax(source, ndv)?)
    };

    let binnings = pixel_types
        .iter()
        .enumerate()
        .map(|(band, pixel_type)| match pixel_type {
            PixelType::UInt8 => Binning::identity(256, 0.0),
            PixelType::UInt16 => Binning::identity(65536, 0.0),
            PixelType::Int16 => Binning::identity(65536, -32768.0),
            PixelType::Other => match minmax.as_ref().and_then(|m| m[band]) {
                Some((min, max)) => Binning::spanning(min, max, float_bin_count),
                None => Binning::identity(float_bin_count, 0.0),
            },
        })
        .collect::<Vec<_>>();

    for (band, (binning, pixel_type)) in binnings.iter().zip(&pixel_types).enumerate() {
        debug!(
            "band {} ({}): {} bins, offset={}, scale={}",
            band + 1,
            pixel_type,
            binning.bin_count,
            binning.offset,
            binning.scale
        );
    }
    Ok(binnings)
}

/// No-data rules for a run: the explicit no-data or valid-range slabs when
/// given, otherwise the source bands' own no-data values. Checked against the
/// source's band count.
pub fn build_ndv<S: RasterSource + ?Sized>(params: &StretchParams, source: &S) -> Result<NdvDef> {
    let ndv = match params.explicit_ndv()? {
        Some(def) => def,
        None => {
            let values = (0..source.band_count())
                .map(|band| source.no_data_value(band))
                .collect::<Result<Vec<_>>>()?;
            NdvDef::from_band_values(&values)
        }
    };
    ndv.validate(source.band_count())?;
    if !ndv.is_empty() {
        debug!("No-data rules: {}", ndv);
    }
    Ok(ndv)
}

/// Everything the first pass learns about a source.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub ndv: NdvDef,
    pub binnings: Vec<Binning>,
    pub histograms: Vec<Histogram>,
}

/// Build no-data rules, binnings and histograms for `source`.
pub fn analyze<S: RasterSource + ?Sized>(source: &S, params: &StretchParams) -> Result<Analysis> {
    let (width, height) = source.size();
    if width == 0 || height == 0 {
        return Err(Error::EmptyRaster { width, height });
    }
    info!(
        "Input size is {}, {}, {}",
        width,
        height,
        source.band_count()
    );

    let ndv = build_ndv(params, source)?;
    let binnings = select_binnings(source, &ndv, params.float_bin_count)?;

    info!("Computing histogram...");
    let histograms = compute_histograms(source, &ndv, &binnings)?;
    for (band, hg) in histograms.iter().enumerate() {
        info!(
            "band {}: min={}, max={}, mean={}, stddev={}, valid_count={}, ndv_count={}",
            band + 1,
            hg.min,
            hg.max,
            hg.mean,
            hg.stddev,
            hg.data_count,
            hg.ndv_count
        );
    }

    Ok(Analysis {
        ndv,
        binnings,
        histograms,
    })
}

fn require_policy(params: &StretchParams) -> Result<StretchPolicy> {
    if params.dump_histogram {
        return Err(Error::ConflictingModes {
            selected: match params.policy {
                Some(policy) => format!("{policy}, histogram dump"),
                None => "stretch, histogram dump".to_string(),
            },
        });
    }
    let policy = params.policy.ok_or(Error::NoMode {
        choices: "a stretch policy",
    })?;
    policy.validate()?;
    Ok(policy)
}

/// Plan from `analysis` and write every band of `source` into `sink`.
pub fn stretch_analyzed<S, K>(
    source: &S,
    sink: &mut K,
    analysis: &Analysis,
    policy: &StretchPolicy,
    out_ndv: u8,
) -> Result<Vec<StretchPlan>>
where
    S: RasterSource + ?Sized,
    K: RasterSink + ?Sized,
{
    info!("Planning {}", policy);
    let plans = plan_bands(&analysis.histograms, policy, out_ndv)?;

    info!("Computing output...");
    apply_stretch(
        source,
        sink,
        &analysis.ndv,
        &analysis.binnings,
        &plans,
        out_ndv,
    )?;
    Ok(plans)
}

/// Stretch any source into any sink with `params.policy`. Paths and the output
/// format in `params` are ignored.
pub fn stretch_raster<S, K>(source: &S, sink: &mut K, params: &StretchParams) -> Result<Analysis>
where
    S: RasterSource + ?Sized,
    K: RasterSink + ?Sized,
{
    let policy = require_policy(params)?;
    let analysis = analyze(source, params)?;
    stretch_analyzed(source, sink, &analysis, &policy, params.out_ndv)?;
    Ok(analysis)
}

/// Stretch an in-memory source to one `(rows, cols)` byte array per band.
pub fn stretch_to_buffer<S: RasterSource + ?Sized>(
    source: &S,
    params: &StretchParams,
) -> Result<Vec<Array2<u8>>> {
    let (width, height) = source.size();
    let mut sink = MemSink::new(width, height, source.band_count());
    stretch_raster(source, &mut sink, params)?;
    Ok(sink.into_bands())
}

/// Stretch `params.input` into a new `params.output` dataset created with the
/// `params.output_format` driver. Projection and geotransform are copied and
/// `params.out_ndv` is recorded as the output no-data value.
pub fn stretch_path(params: &StretchParams) -> Result<()> {
    params.validate()?;
    let policy = require_policy(params)?;
    let (Some(input), Some(output)) = (params.input.as_ref(), params.output.as_ref()) else {
        return Err(Error::MissingArgument {
            arg: "input/output".to_string(),
        });
    };

    let source = GdalSource::open(input)?;
    check_driver(&params.output_format)?;
    let analysis = analyze(&source, params)?;

    let (width, height) = source.size();
    let mut sink = GdalSink::create(
        output,
        &params.output_format,
        width,
        height,
        source.band_count(),
    )?;
    sink.copy_georeference(&source)?;
    sink.set_no_data_value(params.out_ndv)?;

    stretch_analyzed(&source, &mut sink, &analysis, &policy, params.out_ndv)?;
    info!("Wrote {:?}", output);
    Ok(())
}

/// One histogram bin in a report.
#[derive(Debug, Clone, Serialize)]
pub struct BinCount {
    pub index: usize,
    pub value: f64,
    pub count: u64,
}

/// Statistics and full bin counts of one band.
#[derive(Debug, Clone, Serialize)]
pub struct BandReport {
    pub band: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
    pub data_count: u64,
    pub ndv_count: u64,
    pub binning: Binning,
    pub bins: Vec<BinCount>,
}

impl BandReport {
    pub fn from_histogram(band: usize, hg: &Histogram) -> Self {
        Self {
            band,
            min: hg.min,
            max: hg.max,
            mean: hg.mean,
            stddev: hg.stddev,
            data_count: hg.data_count,
            ndv_count: hg.ndv_count,
            binning: hg.binning,
            bins: hg
                .counts
                .iter()
                .enumerate()
                .map(|(index, &count)| BinCount {
                    index,
                    value: hg.binning.from_bin(index),
                    count,
                })
                .collect(),
        }
    }
}

/// Result of a histogram dump.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramReport {
    pub width: usize,
    pub height: usize,
    pub bands: Vec<BandReport>,
}

/// Compute the histograms of `source` and report them without writing output.
pub fn report_histograms<S: RasterSource + ?Sized>(
    source: &S,
    params: &StretchParams,
) -> Result<HistogramReport> {
    let analysis = analyze(source, params)?;
    let (width, height) = source.size();
    Ok(HistogramReport {
        width,
        height,
        bands: analysis
            .histograms
            .iter()
            .enumerate()
            .map(|(idx, hg)| BandReport::from_histogram(idx + 1, hg))
            .collect(),
    })
}

/// Histogram dump of `params.input`.
pub fn dump_histograms(params: &StretchParams) -> Result<HistogramReport> {
    params.validate()?;
    let input = params.input.as_ref().ok_or(Error::MissingArgument {
        arg: "input".to_string(),
    })?;
    let source = GdalSource::open(input)?;
    report_histograms(&source, params)
}

/// Run whichever mode `params` selects. Returns the report in dump mode.
pub fn run(params: &StretchParams) -> Result<Option<HistogramReport>> {
    params.validate()?;
    if params.dump_histogram {
        dump_histograms(params).map(Some)
    } else {
        stretch_path(params).map(|()| None)
    }
}
