//! Renders parsed records as delimited text, SQL statements or Parquet.

pub mod csv_writer;
pub mod parquet_writer;
pub mod sql_writer;

pub use csv_writer::write_csv;
pub use parquet_writer::save_records;
pub use sql_writer::write_sql;
