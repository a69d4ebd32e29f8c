#![doc = r#"
rastretch: stretch any GDAL raster to 8 bits per band.

This crate turns rasters of arbitrary sample type (8/16-bit integers, 32-bit
integers, floating point) into byte rasters suitable for display, using a
histogram built in a single streaming pass. Supported policies are a linear
stretch to a target mean and standard deviation, a linear stretch of a
percentile window, histogram equalization toward a Gaussian, and a plain cast.
No-data pixels, declared per band or as multi-band slabs, are excluded from
statistics and written as a dedicated output value that valid pixels never
take. It powers the `rastretch` CLI and can be embedded in your own Rust
applications.

Requirements
------------
- GDAL development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Quick start: stretch a dataset to a file
----------------------------------------
```rust,no_run
use std::path::PathBuf;
use rastretch::{stretch_path, NdvSlab, StretchParams, StretchPolicy};

fn main() -> rastretch::Result<()> {
    let params = StretchParams {
        input: Some(PathBuf::from("/data/scene.tif")),
        output: Some(PathBuf::from("/out/scene_8bit.tif")),
        ndv: vec!["0 0 0".parse::<NdvSlab>()?],
        out_ndv: 0,
        policy: Some(StretchPolicy::Deviation { mean: 128.0, stddev: 50.0 }),
        ..Default::default()
    };
    stretch_path(&params)
}
```

Stretch in-memory arrays
------------------------
```rust
use ndarray::array;
use rastretch::{stretch_to_buffer, MemRaster, PixelType, StretchParams, StretchPolicy};

fn main() -> rastretch::Result<()> {
    let band = array![[10.0, 20.0], [30.0, 40.0]];
    let source = MemRaster::new(vec![band])?.with_pixel_type(PixelType::UInt8);
    let params = StretchParams {
        policy: Some(StretchPolicy::Percentile { from: 0.0, to: 1.0 }),
        ..Default::default()
    };
    let bands = stretch_to_buffer(&source, &params)?;
    assert_eq!(bands[0].dim(), (2, 2));
    Ok(())
}
```

Histogram report
----------------
```rust,no_run
use std::path::PathBuf;
use rastretch::{dump_histograms, StretchParams};

fn main() -> rastretch::Result<()> {
    let params = StretchParams {
        input: Some(PathBuf::from("/data/scene.tif")),
        dump_histogram: true,
        ..Default::default()
    };
    let report = dump_histograms(&params)?;
    for band in &report.bands {
        println!("band {}: valid={} nodata={}", band.band, band.data_count, band.ndv_count);
    }
    Ok(())
}
```

Error handling
--------------
All public functions return `rastretch::Result<T>`; match on `rastretch::Error`
to handle specific cases, e.g. GDAL errors or invalid configuration.

```rust,no_run
use std::path::PathBuf;
use rastretch::{stretch_path, Error, StretchParams, StretchPolicy};

fn main() {
    let params = StretchParams {
        input: Some(PathBuf::from("/bad/path.tif")),
        output: Some(PathBuf::from("/out.tif")),
        policy: Some(StretchPolicy::Equalize { variance: 0.0 }),
        ..Default::default()
    };

    match stretch_path(&params) {
        Ok(()) => {}
        Err(Error::Gdal(e)) => eprintln!("GDAL error: {e}"),
        Err(Error::ConflictingNoData) => eprintln!("pick --ndv or --valid-range"),
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`]: high-level, ergonomic entry points.
- [`core`]: binning, no-data rules, histograms, planning and the apply pass.
- [`io`]: the `RasterSource`/`RasterSink` seams, GDAL and in-memory backends.
- [`types`]: `PixelType` and output range constants.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use core::binning::Binning;
pub use core::histogram::Histogram;
pub use core::ndv::{Interval, NdvDef, NdvSlab};
pub use core::params::StretchParams;
pub use core::plan::{StretchPlan, StretchPolicy};
pub use error::{Error, Result};
pub use types::PixelType;

// Raster backends
pub use io::{GdalError, GdalSink, GdalSource, MemRaster, MemSink, RasterSink, RasterSource};

// High-level API re-exports
pub use api::{
    Analysis, BandReport, HistogramReport, analyze, dump_histograms, report_histograms, run,
    stretch_path, stretch_raster, stretch_to_buffer,
};
