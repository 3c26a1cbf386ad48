//! CLI subcommands

pub mod config;
pub mod sync;

use std::path::PathBuf;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Settings shared by every subcommand
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: PathBuf,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Context {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}
