//! One parsed GSOD line.

use super::{
    schema::{field_index, FIELDS},
    ParseError,
};

/// Observations paired with the count field that says how many reports they
/// were derived from.
const COUNTED_FIELDS: [(&str, &str); 6] = [
    ("temp", "temp_count"),
    ("dewp", "dewp_count"),
    ("slp", "slp_count"),
    ("stp", "stp_count"),
    ("visib", "visib_count"),
    ("wdsp", "wdsp_count"),
];

/// Values of one line, in [`FIELDS`] order. `None` marks missing data.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub values: Vec<Option<String>>,
}

impl Record {
    /// Parses a data line. `line_number` is only used for error reporting.
    pub fn from_line(line: &str, line_number: usize) -> Result<Self, ParseError> {
        let mut values = Vec::with_capacity(FIELDS.len());

        for field in FIELDS.iter() {
            let raw = field.slice(line);

            let value = if raw.is_empty() || is_missing(raw) {
                None
            } else if let Some(conversion) = field.conversion {
                let number: f64 = raw.parse().map_err(|_| ParseError::InvalidNumber {
                    line: line_number,
                    field: field.name,
                    value: raw.to_string(),
                })?;
                Some(conversion.format(number))
            } else {
                Some(raw.to_string())
            };

            values.push(value);
        }

        Ok(Record { values })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        field_index(name).and_then(|i| self.values[i].as_deref())
    }

    /// Nulls every counted observation reported fewer than `threshold` times.
    pub fn apply_threshold(&mut self, threshold: u32) {
        for (field, count_field) in COUNTED_FIELDS {
            let count = self
                .get(count_field)
                .and_then(|c| c.parse::<u32>().ok())
                .unwrap_or(0);

            if count < threshold {
                if let Some(i) = field_index(field) {
                    self.values[i] = None;
                }
            }
        }
    }
}

/// True for the all-nines sentinel, e.g. `99.99` or `9999.9`.
pub fn is_missing(value: &str) -> bool {
    match value.split_once('.') {
        Some((whole, fraction)) => {
            !whole.is_empty()
                && !fraction.is_empty()
                && whole.chars().all(|c| c == '9')
                && fraction.chars().all(|c| c == '9')
        }
        None => false,
    }
}

// -- Tests -------------------------------------------------------------------
