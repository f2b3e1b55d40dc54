//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debugging detail
    #[arg(short = 'x', long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download station files from the GSOD server
    Download(DownloadArgs),
    /// Convert a GSOD file to CSV, SQL or Parquet
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Folder where the files will be stored
    pub destination: PathBuf,

    /// Password for the server, usually your email address
    #[arg(short = 'P', long, env = "GSOD_FTP_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// User name for the server
    #[arg(short = 'U', long, env = "GSOD_FTP_USER", default_value = "anonymous")]
    pub username: String,

    /// Server host name
    #[arg(short = 'u', long, default_value = "ftp.ncdc.noaa.gov")]
    pub url: String,

    /// Server port
    #[arg(long, default_value_t = 21)]
    pub port: u16,

    /// Directory holding the yearly folders on the server
    #[arg(long, default_value = "pub/data/gsod")]
    pub path: String,

    /// Comma separated station codes, e.g. 010010.99999 [default: all stations]
    #[arg(short, long, conflicts_with = "file")]
    pub stations: Option<String>,

    /// File with one station code per line [default: all stations]
    #[arg(short = 'F', long)]
    pub file: Option<PathBuf>,

    /// First year to download
    #[arg(short, long, default_value_t = 1928)]
    pub first_year: i32,

    /// Last year to download [default: current year]
    #[arg(short, long)]
    pub end_year: Option<i32>,

    /// Retries of a failing remote operation before giving up
    #[arg(long, default_value_t = 5)]
    pub max_retries: usize,

    /// Delay before the first retry, doubled on each further retry
    #[arg(long, default_value_t = 1000)]
    pub retry_delay_ms: u64,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// GSOD file to convert, plain or gzipped
    pub filename: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputMode::Csv)]
    pub mode: OutputMode,

    /// Field separator [csv mode only]
    #[arg(short, long, default_value = ",", value_parser = parse_separator)]
    pub separator: u8,

    /// Table name used in SQL statements [sql mode only]
    #[arg(short = 'n', long = "tablename", default_value = "gsod")]
    pub table_name: String,

    /// Add a CREATE TABLE statement [sql mode only]
    #[arg(short = 'c', long = "createtable")]
    pub create_table: bool,

    /// Data is valid only if reported at least this many times (0 = always valid)
    #[arg(short, long, default_value_t = 0)]
    pub threshold: u32,

    /// Output file [parquet mode only, default: ~/gsod-<input>-<date>.parquet]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    Csv,
    Sql,
    Parquet,
}

fn parse_separator(s: &str) -> Result<u8, String> {
    match s {
        "\\t" | "tab" => Ok(b'\t'),
        _ if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        _ => Err(format!("separator must be a single ASCII character, got {:?}", s)),
    }
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    let style = ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

    ProgressBar::new(size).with_message(message).with_style(style)
}

// -- Tests -------------------------------------------------------------------
