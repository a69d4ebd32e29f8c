use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::ndv::{NdvDef, NdvSlab};
use crate::core::plan::StretchPolicy;
use crate::error::{Error, Result};

/// Bin count used for bands whose type has no exact binning.
pub const DEFAULT_FLOAT_BIN_COUNT: usize = 10_000_000;

pub const DEFAULT_OUTPUT_FORMAT: &str = "GTiff";

/// Run parameters, suitable for config files. Built once and passed by
/// reference to every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StretchParams {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// GDAL driver short name of the output dataset
    pub output_format: String,
    /// Explicit no-data slabs; exclusive with `valid_range`
    pub ndv: Vec<NdvSlab>,
    /// Explicit valid-data slabs; exclusive with `ndv`
    pub valid_range: Vec<NdvSlab>,
    /// Output byte written for no-data pixels
    pub out_ndv: u8,
    pub policy: Option<StretchPolicy>,
    /// Only build and report histograms; nothing is written
    pub dump_histogram: bool,
    pub float_bin_count: usize,
}

impl Default for StretchParams {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            ndv: Vec::new(),
            valid_range: Vec::new(),
            out_ndv: 0,
            policy: None,
            dump_histogram: false,
            float_bin_count: DEFAULT_FLOAT_BIN_COUNT,
        }
    }
}

impl StretchParams {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Check mode selection, paths and numeric arguments.
    pub fn validate(&self) -> Result<()> {
        match (self.policy.as_ref(), self.dump_histogram) {
            (None, false) => {
                return Err(Error::NoMode {
                    choices: "a stretch policy or histogram dump",
                });
            }
            (Some(policy), true) => {
                return Err(Error::ConflictingModes {
                    selected: format!("{policy}, histogram dump"),
                });
            }
            (Some(policy), false) => policy.validate()?,
            (None, true) => {}
        }

        if self.input.is_none() {
            return Err(Error::MissingArgument {
                arg: "input".to_string(),
            });
        }
        if !self.dump_histogram && self.output.is_none() {
            return Err(Error::MissingArgument {
                arg: "output".to_string(),
            });
        }
        if !self.ndv.is_empty() && !self.valid_range.is_empty() {
            return Err(Error::ConflictingNoData);
        }
        if self.float_bin_count == 0 {
            return Err(Error::InvalidArgument {
                arg: "float_bin_count",
                value: "0".to_string(),
            });
        }
        if self.output_format.is_empty() {
            return Err(Error::InvalidArgument {
                arg: "output_format",
                value: String::new(),
            });
        }
        Ok(())
    }

    /// No-data rules given explicitly, or `None` when the source's own
    /// no-data values should be used.
    pub fn explicit_ndv(&self) -> Result<Option<NdvDef>> {
        match (self.ndv.is_empty(), self.valid_range.is_empty()) {
            (false, false) => Err(Error::ConflictingNoData),
            (false, true) => Ok(Some(NdvDef::no_data(self.ndv.clone()))),
            (true, false) => Ok(Some(NdvDef::valid_range(self.valid_range.clone()))),
            (true, true) => Ok(None),
        }
    }
}
