//! Fixed-width layout of one GSOD record line.
//!
//! See "GSOD readme.txt" on the NCEI server for the column definitions. Column
//! ranges are 1-indexed and inclusive.

use std::fmt;

/// Target SQL type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Float,
    Char(u8),
}

impl SqlType {
    /// True for character types, whose values are quoted in SQL output.
    pub fn is_text(&self) -> bool {
        matches!(self, SqlType::Char(_))
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Integer => write!(f, "INTEGER"),
            SqlType::Float => write!(f, "FLOAT"),
            SqlType::Char(width) => write!(f, "CHAR({})", width),
        }
    }
}

/// Unit conversion applied to a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    FahrenheitToCelsius,
    MilesToKilometres,
    KnotsToKmh,
    InchesToMillimetres,
}

impl Conversion {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Conversion::FahrenheitToCelsius => (value - 32.0) / 1.8,
            Conversion::MilesToKilometres => value / 0.6214,
            Conversion::KnotsToKmh => value / 1.9425,
            Conversion::InchesToMillimetres => value * 25.4 * 0.1,
        }
    }

    /// Converts and formats to one decimal place.
    pub fn format(&self, value: f64) -> String {
        format!("{:.1}", self.apply(value))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub start: usize,
    pub end: usize,
    pub conversion: Option<Conversion>,
    pub sql_type: SqlType,
}

impl FieldSpec {
    const fn new(
        name: &'static str,
        start: usize,
        end: usize,
        conversion: Option<Conversion>,
        sql_type: SqlType,
    ) -> Self {
        FieldSpec {
            name,
            start,
            end,
            conversion,
            sql_type,
        }
    }

    /// Slices this field out of a line and trims it. Characters past the end of
    /// the line are treated as absent.
    pub fn slice<'a>(&self, line: &'a str) -> &'a str {
        let from = (self.start - 1).min(line.len());
        let to = self.end.min(line.len());

        line.get(from..to).unwrap_or("").trim()
    }
}

use Conversion::*;
use SqlType::*;

pub const FIELDS: [FieldSpec; 32] = [
    FieldSpec::new("stn", 1, 6, None, Integer),
    FieldSpec::new("wban", 8, 12, None, Integer),
    FieldSpec::new("year", 15, 18, None, Integer),
    FieldSpec::new("month", 19, 20, None, Integer),
    FieldSpec::new("day", 21, 22, None, Integer),
    FieldSpec::new("temp", 25, 30, Some(FahrenheitToCelsius), Float),
    FieldSpec::new("temp_count", 32, 33, None, Integer),
    FieldSpec::new("dewp", 36, 41, Some(FahrenheitToCelsius), Float),
    FieldSpec::new("dewp_count", 43, 44, None, Integer),
    // pressures are millibars already
    FieldSpec::new("slp", 47, 52, None, Float),
    FieldSpec::new("slp_count", 54, 55, None, Integer),
    FieldSpec::new("stp", 58, 63, None, Float),
    FieldSpec::new("stp_count", 65, 66, None, Integer),
    FieldSpec::new("visib", 69, 73, Some(MilesToKilometres), Float),
    FieldSpec::new("visib_count", 75, 76, None, Integer),
    FieldSpec::new("wdsp", 79, 83, Some(KnotsToKmh), Float),
    FieldSpec::new("wdsp_count", 85, 86, None, Integer),
    FieldSpec::new("mxspd", 89, 93, Some(KnotsToKmh), Float),
    FieldSpec::new("gust", 96, 100, Some(KnotsToKmh), Float),
    FieldSpec::new("max", 103, 108, Some(FahrenheitToCelsius), Float),
    FieldSpec::new("max_flag", 109, 109, None, Char(1)),
    FieldSpec::new("min", 111, 116, Some(FahrenheitToCelsius), Float),
    FieldSpec::new("min_flag", 117, 117, None, Char(1)),
    FieldSpec::new("prcp", 119, 123, Some(InchesToMillimetres), Float),
    FieldSpec::new("prcp_flag", 124, 124, None, Char(1)),
    FieldSpec::new("sndp", 126, 130, Some(InchesToMillimetres), Float),
    // FRSHTT indicators, 1 = yes, 0 = no
    FieldSpec::new("fog", 133, 133, None, Integer),
    FieldSpec::new("rain", 134, 134, None, Integer),
    FieldSpec::new("snow", 135, 135, None, Integer),
    FieldSpec::new("hail", 136, 136, None, Integer),
    FieldSpec::new("thunder", 137, 137, None, Integer),
    FieldSpec::new("tornado", 138, 138, None, Integer),
];

pub const PRIMARY_KEY: [&str; 5] = ["stn", "wban", "year", "month", "day"];

/// Position of a field in [`FIELDS`].
pub fn field_index(name: &str) -> Option<usize> {
    FIELDS.iter().position(|f| f.name == name)
}

pub fn field_names() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.name)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn should_have_ordered_non_overlapping_columns() {
        for pair in FIELDS.windows(2) {
            assert!(pair[0].start <= pair[0].end, "{}", pair[0].name);
            assert!(pair[0].end < pair[1].start, "{} overlaps {}", pair[0].name, pair[1].name);
        }
        assert_eq!(FIELDS[0].start, 1);
        assert_eq!(FIELDS[FIELDS.len() - 1].end, 138);
    }

    #[test]
    fn should_convert_units() {
        assert_eq!(Conversion::FahrenheitToCelsius.format(32.0), "0.0");
        assert_eq!(Conversion::FahrenheitToCelsius.format(212.0), "100.0");
        assert_eq!(Conversion::MilesToKilometres.format(1.0), "1.6");
        assert_eq!(Conversion::KnotsToKmh.format(1.0), "0.5");
        assert_eq!(Conversion::InchesToMillimetres.format(1.0), "2.5");
        assert_eq!(Conversion::InchesToMillimetres.format(10.0), "25.4");
    }

    #[test]
    fn should_slice_columns() {
        let line = "030050 99999  19291001    45.2  4";
        let stn = &FIELDS[field_index("stn").unwrap()];
        let temp = &FIELDS[field_index("temp").unwrap()];
        let tornado = &FIELDS[field_index("tornado").unwrap()];

        assert_eq!(stn.slice(line), "030050");
        assert_eq!(temp.slice(line), "45.2");
        assert_eq!(tornado.slice(line), "");
    }

    #[test]
    fn should_render_sql_types() {
        assert_eq!(SqlType::Integer.to_string(), "INTEGER");
        assert_eq!(SqlType::Float.to_string(), "FLOAT");
        assert_eq!(SqlType::Char(1).to_string(), "CHAR(1)");
        assert!(SqlType::Char(1).is_text());
        assert!(!SqlType::Float.is_text());
    }

    #[test]
    fn should_find_primary_key_fields() {
        for name in PRIMARY_KEY {
            assert!(field_index(name).is_some(), "{}", name);
        }
        assert_eq!(field_names().count(), FIELDS.len());
    }
}
