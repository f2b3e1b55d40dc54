//! Save parsed records to a parquet file.

use std::{fs::File, path::Path, sync::Arc};

use anyhow::{anyhow, Result};
use arrow::{
    array::{ArrayRef, Float64Builder, Int32Builder, StringBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};

use crate::reading::{FieldSpec, Record, SqlType, FIELDS};

pub fn save_records(records: &[Record], file_path: &Path) -> Result<()> {
    let schema = Arc::new(schema());
    let columns = FIELDS
        .iter()
        .enumerate()
        .map(|(i, field)| build_column(records, i, field))
        .collect::<Result<Vec<ArrayRef>>>()?;

    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let file = File::create(file_path)?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

fn schema() -> Schema {
    let fields: Vec<Field> = FIELDS
        .iter()
        .map(|f| Field::new(f.name, data_type(f.sql_type), true))
        .collect();

    Schema::new(fields)
}

fn data_type(sql_type: SqlType) -> DataType {
    match sql_type {
        SqlType::Integer => DataType::Int32,
        SqlType::Float => DataType::Float64,
        SqlType::Char(_) => DataType::Utf8,
    }
}

fn build_column(records: &[Record], index: usize, field: &FieldSpec) -> Result<ArrayRef> {
    let values = records.iter().map(|r| r.values[index].as_deref());

    let column: ArrayRef = match field.sql_type {
        SqlType::Integer => {
            let mut builder = Int32Builder::with_capacity(records.len());
            for value in values {
                builder.append_option(value.map(|v| parse(v, field)).transpose()?);
            }
            Arc::new(builder.finish())
        }
        SqlType::Float => {
            let mut builder = Float64Builder::with_capacity(records.len());
            for value in values {
                builder.append_option(value.map(|v| parse(v, field)).transpose()?);
            }
            Arc::new(builder.finish())
        }
        SqlType::Char(_) => {
            let mut builder = StringBuilder::with_capacity(records.len(), records.len());
            for value in values {
                builder.append_option(value);
            }
            Arc::new(builder.finish())
        }
    };

    Ok(column)
}

fn parse<T: std::str::FromStr>(value: &str, field: &FieldSpec) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("field `{}` is not {}: {:?}", field.name, field.sql_type, value))
}

// -- Tests -------------------------------------------------------------------
