//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, JSON and GDAL errors, and provides semantic variants
//! for configuration validation and invariant violations in the stretch engine.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("No stretch mode selected; choose exactly one of {choices}")]
    NoMode { choices: &'static str },

    #[error("Only one mode may be selected, got: {selected}")]
    ConflictingModes { selected: String },

    #[error("No-data values and a valid range cannot be given together")]
    ConflictingNoData,

    #[error("Invalid no-data slab '{text}': {reason}")]
    InvalidSlab { text: String, reason: String },

    #[error("No-data slab {slab} has {intervals} intervals; expected 1 or {bands}")]
    MalformedNoData {
        slab: usize,
        intervals: usize,
        bands: usize,
    },

    #[error("Raster has no pixels: {width}x{height}")]
    EmptyRaster { width: usize, height: usize },

    #[error("Block buffer holds {got} samples, window needs {needed}")]
    BufferSize { got: usize, needed: usize },

    #[error("NaN value reached histogram binning; it should have been classified as no-data")]
    NanInBinning,

    #[error("Could not locate a percentile window in the histogram")]
    PercentileWindow,

    #[error("Processing error: {0}")]
    Processing(String),
}
