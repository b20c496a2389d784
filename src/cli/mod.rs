//! Command-line interface for cert-forge.
//!
//! Provides the `serve` and `analyze` commands.

mod commands;

pub use commands::{
    parse_cli, run_with_cli, AnalysisMode, AnalyzeArgs, Cli, Commands, ModelArgs, ServeArgs,
};
