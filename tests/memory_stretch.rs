use approx::assert_abs_diff_eq;
use ndarray::Array2;

use rastretch::{
    Error, MemRaster, PixelType, StretchParams, StretchPolicy, report_histograms,
    stretch_to_buffer,
};

fn mean_and_stddev(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn ramp_4x4() -> Array2<f64> {
    Array2::from_shape_fn((4, 4), |(r, c)| (10 * (r * 4 + c + 1)) as f64)
}

fn params(policy: StretchPolicy) -> StretchParams {
    StretchParams {
        policy: Some(policy),
        ..Default::default()
    }
}

#[test]
fn deviation_stretch_hits_target_moments() {
    let source = MemRaster::new(vec![ramp_4x4()])
        .unwrap()
        .with_pixel_type(PixelType::UInt8);
    let bands = stretch_to_buffer(
        &source,
        &params(StretchPolicy::Deviation {
            mean: 128.0,
            stddev: 50.0,
        }),
    )
    .unwrap();

    let out: Vec<f64> = bands[0].iter().map(|&v| v as f64).collect();
    let (mean, stddev) = mean_and_stddev(&out);
    assert_abs_diff_eq!(mean, 128.0, epsilon = 1.5);
    assert_abs_diff_eq!(stddev, 50.0, epsilon = 1.5);
    // Monotonic in the input
    assert!(out.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn dump_reports_exact_counts_with_declared_nodata() {
    let mut band = ramp_4x4();
    band[[0, 0]] = 0.0;
    band[[2, 1]] = 0.0;
    band[[3, 3]] = 0.0;
    let source = MemRaster::new(vec![band])
        .unwrap()
        .with_pixel_type(PixelType::UInt8)
        .with_no_data(vec![Some(0.0)]);
    let dump = StretchParams {
        dump_histogram: true,
        ..Default::default()
    };

    let report = report_histograms(&source, &dump).unwrap();
    assert_eq!((report.width, report.height), (4, 4));
    let b = &report.bands[0];
    assert_eq!(b.band, 1);
    assert_eq!(b.data_count, 13);
    assert_eq!(b.ndv_count, 3);
    assert_eq!(b.bins.len(), 256);
    assert_eq!(b.bins[0].count, 0);
    assert_eq!(b.bins.iter().map(|bin| bin.count).sum::<u64>(), 13);
    assert_eq!(b.bins[20].count, 1);
    assert_eq!(b.min, 20.0);
    assert_eq!(b.max, 150.0);
}

#[test]
fn nodata_pixels_and_only_they_get_out_ndv() {
    // Cast maps 255 straight onto out_ndv, so it must be nudged to 254.
    let band = Array2::from_shape_vec(
        (2, 4),
        vec![255.0, 255.0, 7.0, -1.0, 0.0, 128.0, 300.0, 254.0],
    )
    .unwrap();
    let source = MemRaster::new(vec![band]).unwrap();
    let stretch = StretchParams {
        ndv: vec!["-inf..-1".parse().unwrap()],
        out_ndv: 255,
        policy: Some(StretchPolicy::Cast),
        float_bin_count: 1024,
        ..Default::default()
    };

    let out = stretch_to_buffer(&source, &stretch).unwrap();
    let got: Vec<u8> = out[0].iter().copied().collect();
    assert_eq!(got, vec![254, 254, 7, 255, 0, 128, 254, 254]);
}

#[test]
fn multiband_slab_requires_every_band_to_match() {
    let r = Array2::from_shape_vec((1, 3), vec![0.0, 0.0, 50.0]).unwrap();
    let g = Array2::from_shape_vec((1, 3), vec![0.0, 10.0, 0.0]).unwrap();
    let source = MemRaster::new(vec![r, g])
        .unwrap()
        .with_pixel_type(PixelType::UInt8);
    let stretch = StretchParams {
        ndv: vec!["0 0".parse().unwrap()],
        out_ndv: 0,
        policy: Some(StretchPolicy::Cast),
        ..Default::default()
    };

    let out = stretch_to_buffer(&source, &stretch).unwrap();
    // Only pixel 0 is no-data; valid zeros are nudged to 1.
    assert_eq!(out[0].iter().copied().collect::<Vec<_>>(), vec![0, 1, 50]);
    assert_eq!(out[1].iter().copied().collect::<Vec<_>>(), vec![0, 10, 1]);
}

#[test]
fn nan_is_always_nodata() {
    let band = Array2::from_shape_vec((1, 4), vec![f64::NAN, 5.0, 6.0, 7.0]).unwrap();
    let source = MemRaster::new(vec![band]).unwrap();
    let stretch = StretchParams {
        valid_range: vec!["-inf..inf".parse().unwrap()],
        out_ndv: 200,
        policy: Some(StretchPolicy::Cast),
        float_bin_count: 1024,
        ..Default::default()
    };
    let out = stretch_to_buffer(&source, &stretch).unwrap();
    assert_eq!(out[0].iter().copied().collect::<Vec<_>>(), vec![200, 5, 6, 7]);
}

#[test]
fn block_geometry_does_not_change_the_result() {
    let band = Array2::from_shape_fn((37, 23), |(r, c)| ((r * 31 + c * 7) % 1000) as f64 + 0.25);
    let policy = StretchPolicy::Equalize { variance: 40.0 };
    let stretch = StretchParams {
        float_bin_count: 4096,
        ..params(policy)
    };

    let rows = MemRaster::new(vec![band.clone()]).unwrap();
    let tiles = MemRaster::new(vec![band]).unwrap().with_block_size((8, 5));

    let a = stretch_to_buffer(&rows, &stretch).unwrap();
    let b = stretch_to_buffer(&tiles, &stretch).unwrap();
    assert_eq!(a, b);
}

#[test]
fn percentile_stretch_clamps_tails() {
    let values: Vec<f64> = (0..100).map(f64::from).collect();
    let band = Array2::from_shape_vec((10, 10), values).unwrap();
    let source = MemRaster::new(vec![band])
        .unwrap()
        .with_pixel_type(PixelType::UInt16);
    let out = stretch_to_buffer(
        &source,
        &params(StretchPolicy::Percentile { from: 0.1, to: 0.9 }),
    )
    .unwrap();
    let out = &out[0];
    // out_ndv 0 pushes the clipped low tail to 1
    assert_eq!(out[[0, 0]], 1);
    assert_eq!(out[[0, 9]], 1);
    assert_eq!(out[[9, 9]], 255);
    assert!(out[[5, 0]] > 100 && out[[5, 0]] < 160);
}

#[test]
fn missing_policy_is_an_error() {
    let source = MemRaster::new(vec![ramp_4x4()]).unwrap();
    let res = stretch_to_buffer(&source, &StretchParams::default());
    assert!(matches!(res, Err(Error::NoMode { .. })));
}
