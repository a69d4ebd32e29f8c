use std::fs;
use std::path::Path;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rastretch::api::{self, HistogramReport};
use rastretch::{Error, StretchParams, StretchPolicy};

use super::args::CliArgs;

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The mode picked on the command line: `Some(Some(policy))` for a stretch,
/// `Some(None)` for a histogram dump, `None` when no mode flag was given.
fn selected_mode(args: &CliArgs) -> rastretch::Result<Option<Option<StretchPolicy>>> {
    let mut selected: Vec<(&str, Option<StretchPolicy>)> = Vec::new();
    if let Some([mean, stddev]) = args.linear_stretch.as_deref() {
        selected.push((
            "--linear-stretch",
            Some(StretchPolicy::Deviation {
                mean: *mean,
                stddev: *stddev,
            }),
        ));
    }
    if let Some([from, to]) = args.percentile_range.as_deref() {
        selected.push((
            "--percentile-range",
            Some(StretchPolicy::Percentile {
                from: *from,
                to: *to,
            }),
        ));
    }
    if let Some(variance) = args.histeq {
        selected.push(("--histeq", Some(StretchPolicy::Equalize { variance })));
    }
    if args.cast {
        selected.push(("--cast", Some(StretchPolicy::Cast)));
    }
    if args.dump_histogram {
        selected.push(("--dump-histogram", None));
    }

    match selected.len() {
        0 => Ok(None),
        1 => Ok(selected.pop().map(|(_, policy)| policy)),
        _ => Err(Error::ConflictingModes {
            selected: selected
                .iter()
                .map(|(flag, _)| *flag)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// Start from the `--config` file (or defaults) and let explicit flags win.
pub fn build_params(args: &CliArgs) -> rastretch::Result<StretchParams> {
    let mut params = match &args.config {
        Some(path) => {
            debug!("Loading parameters from {:?}", path);
            StretchParams::from_json_file(path)?
        }
        None => StretchParams::default(),
    };

    if let Some(input) = &args.input {
        params.input = Some(input.clone());
    }
    if let Some(output) = &args.output {
        params.output = Some(output.clone());
    }
    if let Some(format) = &args.format {
        params.output_format = format.clone();
    }
    if !args.ndv.is_empty() {
        params.ndv = args.ndv.clone();
    }
    if !args.valid_range.is_empty() {
        params.valid_range = args.valid_range.clone();
    }
    if let Some(out_ndv) = args.out_ndv {
        params.out_ndv = out_ndv;
    }
    if let Some(bins) = args.bins {
        params.float_bin_count = bins;
    }
    if let Some(mode) = selected_mode(args)? {
        params.dump_histogram = mode.is_none();
        params.policy = mode;
    }
    Ok(params)
}

fn write_report(report: &HistogramReport, dest: Option<&Path>) -> rastretch::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match dest {
        Some(path) => {
            fs::write(path, json)?;
            info!("Histogram report written to {:?}", path);
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);

    let params = build_params(&args)?;
    debug!("Run parameters: {:?}", params);

    match api::run(&params)? {
        Some(report) => write_report(&report, args.dump_output.as_deref())?,
        None => info!(
            "Successfully processed: {:?} -> {:?}",
            params.input, params.output
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["rastretch", "-i", "in.tif", "-o", "out.tif"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_become_params() {
        let params = build_params(&parse(&[
            "--percentile-range",
            "0.02",
            "0.98",
            "--out-ndv",
            "255",
            "--valid-range",
            "1..4095",
        ]))
        .unwrap();
        assert_eq!(
            params.policy,
            Some(StretchPolicy::Percentile { from: 0.02, to: 0.98 })
        );
        assert_eq!(params.out_ndv, 255);
        assert_eq!(params.valid_range.len(), 1);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn two_modes_conflict() {
        let res = build_params(&parse(&["--cast", "--histeq", "0"]));
        assert!(matches!(res, Err(Error::ConflictingModes { .. })));
    }

    #[test]
    fn no_mode_is_reported_by_validation() {
        let params = build_params(&parse(&[])).unwrap();
        assert!(matches!(params.validate(), Err(Error::NoMode { .. })));
    }

    #[test]
    fn flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(
            &path,
            r#"{ "input": "a.tif", "output": "b.tif", "policy": { "kind": "cast" }, "out_ndv": 7 }"#,
        )
        .unwrap();
        let config = path.to_str().unwrap();

        let args =
            CliArgs::try_parse_from(["rastretch", "--config", config, "--dump-histogram"]).unwrap();
        let params = build_params(&args).unwrap();
        assert!(params.dump_histogram);
        assert_eq!(params.policy, None);
        assert_eq!(params.out_ndv, 7);
        assert_eq!(params.input.as_deref(), Some(Path::new("a.tif")));
    }
}
