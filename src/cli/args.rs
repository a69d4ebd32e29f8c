use clap::Parser;
use std::path::PathBuf;

use rastretch::core::ndv::NdvSlab;

fn parse_slab(s: &str) -> Result<NdvSlab, String> {
    s.parse::<NdvSlab>().map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(
    name = "rastretch",
    version,
    about = "Stretch any GDAL raster to 8 bits per band"
)]
pub struct CliArgs {
    /// Input dataset
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output dataset (not needed with --dump-histogram)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// GDAL driver of the output dataset (default GTiff)
    #[arg(short = 'f', long)]
    pub format: Option<String>,

    /// No-data slab: "v", "lo..hi" or one entry per band ("0 0 0", "-inf..0,0,0").
    /// May be repeated.
    #[arg(long = "ndv", value_name = "SLAB", value_parser = parse_slab, allow_hyphen_values = true)]
    pub ndv: Vec<NdvSlab>,

    /// Valid-data slab, same syntax as --ndv; everything outside is no-data.
    /// May be repeated.
    #[arg(long, value_name = "SLAB", value_parser = parse_slab, allow_hyphen_values = true)]
    pub valid_range: Vec<NdvSlab>,

    /// Output value written for no-data pixels, avoided by valid pixels
    #[arg(long, value_name = "BYTE")]
    pub out_ndv: Option<u8>,

    /// Linear stretch to the target mean and standard deviation
    #[arg(long, num_args = 2, value_names = ["MEAN", "STDDEV"], allow_negative_numbers = true)]
    pub linear_stretch: Option<Vec<f64>>,

    /// Linear stretch of the window between two cumulative fractions in [0, 1]
    #[arg(long, num_args = 2, value_names = ["FROM", "TO"], allow_negative_numbers = true)]
    pub percentile_range: Option<Vec<f64>>,

    /// Histogram equalization toward a Gaussian of the given variance (0 = flat)
    #[arg(long, value_name = "VARIANCE", allow_negative_numbers = true)]
    pub histeq: Option<f64>,

    /// Plain cast and clamp of sample values to 0..=255
    #[arg(long, default_value_t = false)]
    pub cast: bool,

    /// Compute and print the per-band histograms; no output is written
    #[arg(long, default_value_t = false)]
    pub dump_histogram: bool,

    /// Write the histogram report here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub dump_output: Option<PathBuf>,

    /// Bin count for bands without exact binning (floating point, 32-bit ints)
    #[arg(long, value_name = "N")]
    pub bins: Option<usize>,

    /// JSON run parameters; command line flags override its fields
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_value_modes() {
        let args = CliArgs::try_parse_from([
            "rastretch",
            "-i",
            "in.tif",
            "-o",
            "out.tif",
            "--linear-stretch",
            "128",
            "50",
            "--ndv",
            "0 0 0",
            "--ndv",
            "-inf..-1",
        ])
        .unwrap();
        assert_eq!(args.linear_stretch, Some(vec![128.0, 50.0]));
        assert_eq!(args.ndv.len(), 2);
        assert_eq!(args.ndv[0].intervals.len(), 3);
        assert!(args.percentile_range.is_none());
    }

    #[test]
    fn rejects_bad_slab() {
        let res = CliArgs::try_parse_from(["rastretch", "--ndv", "5..1"]);
        assert!(res.is_err());
    }
}
