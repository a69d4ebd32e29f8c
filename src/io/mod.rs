//! I/O layer: the raster collaborator traits the stretch engine is written
//! against, a GDAL-backed implementation for datasets on disk, and an
//! `ndarray`-backed in-memory implementation.
use crate::core::blocks::BlockWindow;
use crate::error::Result;
use crate::types::PixelType;

pub mod gdal;
pub use gdal::{GdalError, GdalSink, GdalSource};

pub mod memory;
pub use memory::{MemRaster, MemSink};

/// Read side of a multi-band raster. Band indices are 0-based.
pub trait RasterSource {
    /// `(width, height)` in pixels.
    fn size(&self) -> (usize, usize);

    fn band_count(&self) -> usize;

    /// Preferred `(width, height)` of an I/O block.
    fn block_size(&self) -> (usize, usize);

    fn pixel_type(&self, band: usize) -> Result<PixelType>;

    /// The band's intrinsic no-data value, if it declares one.
    fn no_data_value(&self, band: usize) -> Result<Option<f64>>;

    /// Read `window` of `band` into `buf` (row-major, exactly `window.len()` samples),
    /// converted to `f64`.
    fn read_block(&self, band: usize, window: &BlockWindow, buf: &mut [f64]) -> Result<()>;
}

/// Write side of an 8-bit raster with the same geometry as its source.
pub trait RasterSink {
    /// Write `buf` (row-major, exactly `window.len()` bytes) to `window` of `band`.
    fn write_block(&mut self, band: usize, window: &BlockWindow, buf: &[u8]) -> Result<()>;
}
