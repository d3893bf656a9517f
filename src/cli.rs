//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::pipeline::ExportOptions;
use crate::query_file::LineJoin;

/// Export the result of a SQL query to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "pgcsv")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Output CSV file path
    #[arg(long, value_name = "PATH", default_value = "output.csv")]
    pub output: PathBuf,

    /// Input SQL query file path
    #[arg(long, value_name = "PATH", default_value = "input.dat")]
    pub query: PathBuf,

    /// Settings file with the PG_* connection variables
    #[arg(long = "env-file", value_name = "PATH", default_value = ".env")]
    pub env_file: PathBuf,

    /// Keep line breaks of the query file instead of joining lines with spaces
    #[arg(long = "preserve-newlines")]
    pub preserve_newlines: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            query_path: self.query.clone(),
            output_path: self.output.clone(),
            line_join: if self.preserve_newlines {
                LineJoin::Newline
            } else {
                LineJoin::Space
            },
        }
    }

    /// Default log filter for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
