use gdal::errors::GdalError as GdalCrateError;
use gdal::raster::{Buffer, GdalDataType};
use gdal::{Dataset, DriverManager};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::blocks::BlockWindow;
use crate::error::Result;
use crate::io::{RasterSink, RasterSource};
use crate::types::PixelType;

/// Errors encountered when using GDAL datasets
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Output driver not available: {0}")]
    DriverUnavailable(String),
    #[error("Could not create output dataset {path}: {source}")]
    CreateFailed {
        path: String,
        #[source]
        source: GdalCrateError,
    },
}

fn gdal_err(e: GdalCrateError) -> crate::Error {
    GdalError::from(e).into()
}

// Helper to extract EPSG code from WKT authority tag
fn parse_epsg(wkt: &str) -> Option<String> {
    const KEY: &str = "AUTHORITY[\"EPSG\",\"";
    let idx = wkt.rfind(KEY)?;
    let start = idx + KEY.len();
    let end = wkt[start..].find('"')?;
    Some(format!("EPSG:{}", &wkt[start..start + end]))
}

/// Fail early when no GDAL driver is registered under `driver_name`
pub fn check_driver(driver_name: &str) -> std::result::Result<(), GdalError> {
    DriverManager::get_driver_by_name(driver_name)
        .map(|_| ())
        .map_err(|_| GdalError::DriverUnavailable(driver_name.to_string()))
}

/// Source raster read through GDAL
pub struct GdalSource {
    pub dataset: Dataset,
    size: (usize, usize),
    band_count: usize,
    block_size: (usize, usize),
}

impl GdalSource {
    /// Open a GDAL-supported dataset (e.g., GeoTIFF, ENVI, HDF5) for reading
    pub fn open<P: AsRef<Path>>(path: P) -> std::result::Result<Self, GdalError> {
        let dataset = Dataset::open(path.as_ref())?;
        let size = dataset.raster_size();
        let band_count = dataset.raster_count() as usize;
        if band_count == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        // Block geometry of the first band drives every pass
        let (bx, by) = dataset.rasterband(1)?.block_size();
        let block_size = if bx == 0 || by == 0 {
            (size.0.max(1), 1)
        } else {
            (bx, by)
        };
        debug!(
            "Opened {:?}: {}x{}x{}, block {}x{}",
            path.as_ref(),
            size.0,
            size.1,
            band_count,
            block_size.0,
            block_size.1
        );
        Ok(GdalSource {
            dataset,
            size,
            band_count,
            block_size,
        })
    }
}

impl RasterSource for GdalSource {
    fn size(&self) -> (usize, usize) {
        self.size
    }

    fn band_count(&self) -> usize {
        self.band_count
    }

    fn block_size(&self) -> (usize, usize) {
        self.block_size
    }

    fn pixel_type(&self, band: usize) -> Result<PixelType> {
        let band = self.dataset.rasterband(band + 1).map_err(gdal_err)?;
        Ok(match band.band_type() {
            GdalDataType::UInt8 => PixelType::UInt8,
            GdalDataType::UInt16 => PixelType::UInt16,
            GdalDataType::Int16 => PixelType::Int16,
            _ => PixelType::Other,
        })
    }

    fn no_data_value(&self, band: usize) -> Result<Option<f64>> {
        let band = self.dataset.rasterband(band + 1).map_err(gdal_err)?;
        Ok(band.no_data_value())
    }

    fn read_block(&self, band: usize, window: &BlockWindow, buf: &mut [f64]) -> Result<()> {
        let band = self.dataset.rasterband(band + 1).map_err(gdal_err)?;
        let shape = (window.width, window.height);
        band.read_into_slice::<f64>(
            (window.x_off as isize, window.y_off as isize),
            shape,
            shape,
            buf,
            None,
        )
        .map_err(gdal_err)
    }
}

/// 8-bit destination dataset written through GDAL
pub struct GdalSink {
    pub dataset: Dataset,
    // Reused block storage handed to `Buffer` on every write
    scratch: Vec<u8>,
}

impl GdalSink {
    /// Create a byte dataset through the named driver (e.g. "GTiff")
    pub fn create<P: AsRef<Path>>(
        path: P,
        driver_name: &str,
        width: usize,
        height: usize,
        band_count: usize,
    ) -> std::result::Result<Self, GdalError> {
        let driver = DriverManager::get_driver_by_name(driver_name)
            .map_err(|_| GdalError::DriverUnavailable(driver_name.to_string()))?;
        let dataset = driver
            .create_with_band_type::<u8, _>(path.as_ref(), width, height, band_count)
            .map_err(|source| GdalError::CreateFailed {
                path: path.as_ref().display().to_string(),
                source,
            })?;
        Ok(GdalSink {
            dataset,
            scratch: Vec::new(),
        })
    }

    /// Copy projection and geotransform from the source dataset, when it has them
    pub fn copy_georeference(&mut self, source: &GdalSource) -> std::result::Result<(), GdalError> {
        let projection = source.dataset.projection();
        if !projection.is_empty() {
            self.dataset.set_projection(&projection)?;
            match parse_epsg(&projection) {
                Some(code) => info!("Copied projection {}", code),
                None => info!("Copied projection (no EPSG authority)"),
            }
        }
        if let Ok(gt) = source.dataset.geo_transform() {
            self.dataset.set_geo_transform(&gt)?;
            debug!("Copied geotransform {:?}", gt);
        }
        Ok(())
    }

    /// Record `value` as the no-data value of every output band
    pub fn set_no_data_value(&mut self, value: u8) -> std::result::Result<(), GdalError> {
        for idx in 1..=self.dataset.raster_count() as usize {
            let mut band = self.dataset.rasterband(idx)?;
            band.set_no_data_value(Some(value as f64))?;
        }
        Ok(())
    }
}

impl RasterSink for GdalSink {
    fn write_block(&mut self, band: usize, window: &BlockWindow, buf: &[u8]) -> Result<()> {
        let mut band = self.dataset.rasterband(band + 1).map_err(gdal_err)?;
        let shape = (window.width, window.height);
        let mut data = std::mem::take(&mut self.scratch);
        data.clear();
        data.extend_from_slice(buf);
        let mut buffer = Buffer::new(shape, data);
        let res = band.write((window.x_off as isize, window.y_off as isize), shape, &mut buffer);
        self.scratch = buffer.into_shape_and_vec().1;
        res.map_err(gdal_err)
    }
}
