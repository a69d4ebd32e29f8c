//! In-memory rasters backed by `ndarray`, for embedding the engine without
//! touching disk.
use ndarray::{Array2, s};

use crate::core::blocks::BlockWindow;
use crate::error::{Error, Result};
use crate::io::{RasterSink, RasterSource};
use crate::types::PixelType;

/// Multi-band source held as `(rows, cols)` arrays of equal shape.
#[derive(Debug, Clone)]
pub struct MemRaster {
    bands: Vec<Array2<f64>>,
    pixel_types: Vec<PixelType>,
    no_data: Vec<Option<f64>>,
    block_size: (usize, usize),
}

impl MemRaster {
    /// Bands default to `PixelType::Other`, no intrinsic no-data value and
    /// one-row blocks.
    pub fn new(bands: Vec<Array2<f64>>) -> Result<Self> {
        let Some(first) = bands.first() else {
            return Err(Error::Processing("raster has no bands".into()));
        };
        let dim = first.dim();
        if let Some(bad) = bands.iter().find(|b| b.dim() != dim) {
            return Err(Error::Processing(format!(
                "band shape {:?} differs from {:?}",
                bad.dim(),
                dim
            )));
        }
        let band_count = bands.len();
        Ok(Self {
            bands,
            pixel_types: vec![PixelType::Other; band_count],
            no_data: vec![None; band_count],
            block_size: (dim.1.max(1), 1),
        })
    }

    pub fn with_pixel_type(mut self, pixel_type: PixelType) -> Self {
        self.pixel_types.fill(pixel_type);
        self
    }

    pub fn with_no_data(mut self, values: Vec<Option<f64>>) -> Self {
        self.no_data = values;
        self
    }

    pub fn with_block_size(mut self, block_size: (usize, usize)) -> Self {
        self.block_size = block_size;
        self
    }

    fn check_band(&self, band: usize) -> Result<()> {
        if band >= self.bands.len() {
            return Err(Error::Processing(format!("band index {band} out of range")));
        }
        Ok(())
    }
}

impl RasterSource for MemRaster {
    fn size(&self) -> (usize, usize) {
        let (rows, cols) = self.bands[0].dim();
        (cols, rows)
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn block_size(&self) -> (usize, usize) {
        self.block_size
    }

    fn pixel_type(&self, band: usize) -> Result<PixelType> {
        self.check_band(band)?;
        Ok(self.pixel_types[band])
    }

    fn no_data_value(&self, band: usize) -> Result<Option<f64>> {
        self.check_band(band)?;
        Ok(self.no_data.get(band).copied().flatten())
    }

    fn read_block(&self, band: usize, window: &BlockWindow, buf: &mut [f64]) -> Result<()> {
        self.check_band(band)?;
        if buf.len() != window.len() {
            return Err(Error::BufferSize {
                got: buf.len(),
                needed: window.len(),
            });
        }
        let view = self.bands[band].slice(s![
            window.y_off..window.y_off + window.height,
            window.x_off..window.x_off + window.width
        ]);
        for (dst, &src) in buf.iter_mut().zip(view.iter()) {
            *dst = src;
        }
        Ok(())
    }
}

/// 8-bit output bands of a fixed shape.
#[derive(Debug, Clone)]
pub struct MemSink {
    pub bands: Vec<Array2<u8>>,
}

impl MemSink {
    pub fn new(width: usize, height: usize, band_count: usize) -> Self {
        Self {
            bands: vec![Array2::zeros((height, width)); band_count],
        }
    }

    pub fn into_bands(self) -> Vec<Array2<u8>> {
        self.bands
    }
}

impl RasterSink for MemSink {
    fn write_block(&mut self, band: usize, window: &BlockWindow, buf: &[u8]) -> Result<()> {
        let Some(target) = self.bands.get_mut(band) else {
            return Err(Error::Processing(format!("band index {band} out of range")));
        };
        if buf.len() != window.len() {
            return Err(Error::BufferSize {
                got: buf.len(),
                needed: window.len(),
            });
        }
        let mut view = target.slice_mut(s![
            window.y_off..window.y_off + window.height,
            window.x_off..window.x_off + window.width
        ]);
        for (dst, &src) in view.iter_mut().zip(buf) {
            *dst = src;
        }
        Ok(())
    }
}
