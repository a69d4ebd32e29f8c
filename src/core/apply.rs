//! Second pass: map every pixel through its band's plan and write the bytes.
use tracing::debug;

use crate::core::binning::Binning;
use crate::core::blocks::{BlockBuffers, BlockWindows};
use crate::core::ndv::NdvDef;
use crate::core::plan::{StretchPlan, avoid_ndv, linear_to_byte};
use crate::error::{Error, Result};
use crate::io::{RasterSink, RasterSource};

/// Stretch the first `len` samples of one band's block into `out`.
/// No-data pixels get `out_ndv`; data pixels never do.
pub fn stretch_block(
    samples: &[f64],
    mask: &[bool],
    len: usize,
    binning: &Binning,
    plan: &StretchPlan,
    out_ndv: u8,
    out: &mut [u8],
) -> Result<()> {
    let pixels = samples[..len].iter().zip(&mask[..len]).zip(&mut out[..len]);
    match plan {
        StretchPlan::Linear { scale, offset } => {
            for ((&v, &is_ndv), o) in pixels {
                *o = if is_ndv {
                    out_ndv
                } else {
                    avoid_ndv(linear_to_byte(v, *scale, *offset), out_ndv)
                };
            }
        }
        StretchPlan::Table { lookup } => {
            for ((&v, &is_ndv), o) in pixels {
                *o = if is_ndv {
                    out_ndv
                } else {
                    avoid_ndv(lookup[binning.to_bin(v)?], out_ndv)
                };
            }
        }
    }
    Ok(())
}

/// Read `source` block by block, stretch each band with its plan and write the
/// result to `sink` in the same block geometry.
pub fn apply_stretch<S, K>(
    source: &S,
    sink: &mut K,
    ndv: &NdvDef,
    binnings: &[Binning],
    plans: &[StretchPlan],
    out_ndv: u8,
) -> Result<()>
where
    S: RasterSource + ?Sized,
    K: RasterSink + ?Sized,
{
    let band_count = source.band_count();
    if binnings.len() != band_count || plans.len() != band_count {
        return Err(Error::Processing(format!(
            "{} bands but {} binnings and {} plans",
            band_count,
            binnings.len(),
            plans.len()
        )));
    }

    let windows = BlockWindows::new(source.size(), source.block_size());
    let mut buffers = BlockBuffers::for_windows(band_count, &windows);
    let mut out = vec![0u8; windows.max_block_len()];

    let mut blocks = 0usize;
    for window in windows {
        buffers.load(source, &window, ndv)?;
        let len = window.len();
        for (band, (binning, plan)) in binnings.iter().zip(plans).enumerate() {
            stretch_block(
                &buffers.bands[band],
                &buffers.mask,
                len,
                binning,
                plan,
                out_ndv,
                &mut out,
            )?;
            sink.write_block(band, &window, &out[..len])?;
        }
        blocks += 1;
    }
    debug!("Apply pass wrote {} blocks per band", blocks);
    Ok(())
}
