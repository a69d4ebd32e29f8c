use gdal::raster::{Buffer, GdalDataType};
use gdal::{Dataset, DriverManager};
use std::path::Path;

use rastretch::{Error, StretchParams, StretchPolicy, dump_histograms, stretch_path};

const WIDTH: usize = 48;
const HEIGHT: usize = 32;
const GEO_TRANSFORM: [f64; 6] = [500000.0, 10.0, 0.0, 4600000.0, 0.0, -10.0];

// 16-bit ramp with a zero no-data border on the first row
fn create_synthetic_u16(path: &Path) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut ds = driver
        .create_with_band_type::<u16, _>(path, WIDTH, HEIGHT, 1)
        .unwrap();
    ds.set_geo_transform(&GEO_TRANSFORM).unwrap();

    let mut data = vec![0u16; WIDTH * HEIGHT];
    for y in 1..HEIGHT {
        for x in 0..WIDTH {
            data[y * WIDTH + x] = (1000 + 7 * x + 31 * y) as u16;
        }
    }

    let mut band = ds.rasterband(1).unwrap();
    let mut buffer = Buffer::new((WIDTH, HEIGHT), data);
    band.write((0, 0), (WIDTH, HEIGHT), &mut buffer).unwrap();
    band.set_no_data_value(Some(0.0)).unwrap();
}

#[test]
fn stretch_writes_byte_geotiff() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = temp_dir.path().join("input.tif");
    let output = temp_dir.path().join("output.tif");
    create_synthetic_u16(&input);

    let params = StretchParams {
        input: Some(input.clone()),
        output: Some(output.clone()),
        out_ndv: 0,
        policy: Some(StretchPolicy::Deviation {
            mean: 128.0,
            stddev: 40.0,
        }),
        ..Default::default()
    };
    stretch_path(&params).unwrap();

    let ds = Dataset::open(&output).unwrap();
    assert_eq!(ds.raster_size(), (WIDTH, HEIGHT));
    assert_eq!(ds.geo_transform().unwrap(), GEO_TRANSFORM);

    let band = ds.rasterband(1).unwrap();
    assert_eq!(band.band_type(), GdalDataType::UInt8);
    assert_eq!(band.no_data_value(), Some(0.0));

    let buffer: Buffer<u8> = band
        .read_as((0, 0), (WIDTH, HEIGHT), (WIDTH, HEIGHT), None)
        .unwrap();
    let data = buffer.data();
    assert!(data[..WIDTH].iter().all(|&v| v == 0));
    assert!(data[WIDTH..].iter().all(|&v| v != 0));
    let mean = data[WIDTH..].iter().map(|&v| v as f64).sum::<f64>() / (data.len() - WIDTH) as f64;
    assert!((mean - 128.0).abs() < 2.0, "mean {mean}");
}

#[test]
fn dump_counts_intrinsic_nodata() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = temp_dir.path().join("input.tif");
    create_synthetic_u16(&input);

    let params = StretchParams {
        input: Some(input),
        dump_histogram: true,
        ..Default::default()
    };
    let report = dump_histograms(&params).unwrap();
    let band = &report.bands[0];
    assert_eq!(band.ndv_count, WIDTH as u64);
    assert_eq!(band.data_count, (WIDTH * (HEIGHT - 1)) as u64);
    assert_eq!(band.bins.len(), 65536);
    assert_eq!(band.min, 1031.0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["bands"][0]["data_count"], (WIDTH * (HEIGHT - 1)) as u64);
}

#[test]
fn unknown_driver_fails_before_writing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let input = temp_dir.path().join("input.tif");
    let output = temp_dir.path().join("output.xyz");
    create_synthetic_u16(&input);

    let params = StretchParams {
        input: Some(input),
        output: Some(output.clone()),
        output_format: "NoSuchDriver".to_string(),
        policy: Some(StretchPolicy::Cast),
        ..Default::default()
    };
    assert!(matches!(stretch_path(&params), Err(Error::Gdal(_))));
    assert!(!output.exists());
}
