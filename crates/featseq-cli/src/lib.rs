//! Library side of the `featseq` command-line tool.
//!
//! `main.rs` only parses arguments and prints; the commands themselves live
//! here so they can be driven from tests.

pub mod commands;
pub mod config;

pub use commands::{
    decode_file, encode_files, render_report, replay_file, validate_files, CliError, FileStatus,
};
pub use config::{CliConfig, ConfigError, OutputConfig};
