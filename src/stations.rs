//! Station codes used to select files on the server.
//!
//! A station is identified by its six digit USAF code and five digit WBAN code,
//! written `NNNNNN.NNNNN` in station lists and `NNNNNN-NNNNN` in file names.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    str::FromStr,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StationError {
    #[error("invalid station code {0:?}, expected NNNNNN.NNNNN")]
    InvalidCode(String),

    #[error("cannot read station list {path}: {source}")]
    Unreadable { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub usaf: String,
    pub wban: String,
}

impl Station {
    /// Name of this station's file for `year` on the server.
    pub fn file_name(&self, year: i32) -> String {
        format!("{}-{}-{}.op.gz", self.usaf, self.wban, year)
    }
}

impl FromStr for Station {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        let invalid = || StationError::InvalidCode(code.to_string());

        let (usaf, wban) = code
            .split_once('.')
            .or_else(|| code.split_once('-'))
            .ok_or_else(invalid)?;

        if !is_digits(usaf, 6) || !is_digits(wban, 5) {
            return Err(invalid());
        }

        Ok(Station {
            usaf: usaf.to_string(),
            wban: wban.to_string(),
        })
    }
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.chars().all(|c| c.is_ascii_digit())
}

/// Parses a comma separated list of station codes.
pub fn parse_list(list: &str) -> Result<Vec<Station>, StationError> {
    list.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::parse)
        .collect()
}

/// Reads a station list file with one code per line.
pub fn read_file(path: &Path) -> Result<Vec<Station>, StationError> {
    let unreadable = |source| StationError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(unreadable)?);
    let mut stations = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(unreadable)?;
        if line.trim().is_empty() {
            continue;
        }
        stations.push(line.parse()?);
    }

    Ok(stations)
}

// -- Tests -------------------------------------------------------------------
