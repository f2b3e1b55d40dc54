use std::io::Write;

use anyhow::Result;
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::reading::{schema::field_names, Record};

/// Writes a header of field names then one row per record. Missing values are
/// written as empty fields. Values are joined by `separator` and never quoted.
pub fn write_csv<W: Write>(records: &[Record], separator: u8, out: W) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(separator)
        .terminator(Terminator::Any(b'\n'))
        .quote_style(QuoteStyle::Never)
        .has_headers(false)
        .from_writer(out);

    writer.write_record(field_names())?;

    for record in records {
        writer.write_record(record.values.iter().map(|v| v.as_deref().unwrap_or("")))?;
    }

    writer.flush()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
