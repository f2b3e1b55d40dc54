pub mod record;
pub mod schema;

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use thiserror::Error;
use tracing::debug;

pub use record::Record;
pub use schema::{FieldSpec, SqlType, FIELDS, PRIMARY_KEY};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("cannot open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("error reading line {line}: {source}")]
    Read { line: usize, source: io::Error },

    #[error("line {line}: field `{field}` is not a number: {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Parses a GSOD file, plain or gzipped. The first line is a column header and
/// is skipped. A `threshold` above zero nulls observations reported fewer times.
pub fn parse_file(path: &Path, threshold: u32) -> Result<Vec<Record>, ParseError> {
    let reader = open(path).map_err(|source| ParseError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let records = parse_lines(reader, threshold)?;
    debug!(path = %path.display(), records = records.len(), "Parsed file");

    Ok(records)
}

pub fn parse_lines<R: BufRead>(reader: R, threshold: u32) -> Result<Vec<Record>, ParseError> {
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate().skip(1) {
        let line_number = index + 1;
        let line = line.map_err(|source| ParseError::Read {
            line: line_number,
            source,
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let mut record = Record::from_line(&line, line_number)?;
        if threshold > 0 {
            record.apply_threshold(threshold);
        }
        records.push(record);
    }

    Ok(records)
}

// Gzip is detected by magic number, not extension
fn open(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let mut file = BufReader::new(File::open(path)?);
    let is_gzip = file.fill_buf()?.starts_with(&GZIP_MAGIC);

    if is_gzip {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(file))
    }
}

// -- Tests -------------------------------------------------------------------
