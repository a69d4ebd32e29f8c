//! Command Line Interface (CLI) layer for rastretch.
//!
//! This module defines argument parsing (`args`) and the orchestration logic
//! (`runner`) that turns flags or a JSON config into `StretchParams` and hands
//! them to `rastretch::api::run`.
//!
//! If you are embedding rastretch into another application, prefer using
//! the high-level `rastretch::api` module instead of calling the CLI code.
pub mod args;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
