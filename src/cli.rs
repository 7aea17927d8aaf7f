use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "apache-report")]
#[command(author, version, about = "Summary statistics for Apache combined+ access logs")]
pub struct Cli {
    /// Access log in combined format with the request duration (%D) appended
    #[arg(required = true, value_name = "FILE")]
    pub file: PathBuf,

    /// Output format
    #[arg(long, short, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Log filter for diagnostics on stderr (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Do not warn about skipped lines
    #[arg(long, short)]
    pub quiet: bool,

    /// Read buffer size in KB
    #[arg(long, default_value = "64")]
    pub buffer_kb: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable labelled lines
    Table,
    /// Pretty-printed JSON object
    Json,
    /// CSV header plus one row
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
