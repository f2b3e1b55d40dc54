use std::io::Write;

use anyhow::Result;

use crate::reading::{Record, FIELDS, PRIMARY_KEY};

/// Writes an optional `CREATE TABLE` statement followed by one `INSERT` per
/// record. Missing values are left out of the column list entirely.
pub fn write_sql<W: Write>(records: &[Record], table: &str, create_table: bool, mut out: W) -> Result<()> {
    if create_table {
        writeln!(out, "{}", create_table_statement(table))?;
    }

    for record in records {
        writeln!(out, "{}", insert_statement(table, record))?;
    }

    out.flush()?;

    Ok(())
}

pub fn create_table_statement(table: &str) -> String {
    let columns: Vec<String> = FIELDS
        .iter()
        .map(|f| format!("{} {}", f.name, f.sql_type))
        .collect();

    format!(
        "CREATE TABLE {} (\n {},\n PRIMARY KEY ({})\n);",
        table,
        columns.join(",\n "),
        PRIMARY_KEY.join(", ")
    )
}

pub fn insert_statement(table: &str, record: &Record) -> String {
    let mut columns = Vec::new();
    let mut values = Vec::new();

    for (field, value) in FIELDS.iter().zip(&record.values) {
        if let Some(value) = value {
            columns.push(field.name);
            if field.sql_type.is_text() {
                values.push(format!("'{}'", value.replace('\'', "''")));
            } else {
                values.push(value.clone());
            }
        }
    }

    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table,
        columns.join(","),
        values.join(",")
    )
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const LINE: &str = "030050 99999  19291001    45.2  4    40.4  4  1001.3  4  9999.9  0    6.2  4   13.0  4   18.1  999.9    48.0*   42.1*  0.00I 999.9  010000";

    #[test]
    fn should_write_insert_without_null_columns() {
        let record = Record::from_line(LINE, 2).unwrap();

        assert_eq!(
            insert_statement("gsod", &record),
            "INSERT INTO gsod (stn,wban,year,month,day,temp,temp_count,dewp,dewp_count,slp,slp_count,stp_count,visib,visib_count,wdsp,wdsp_count,mxspd,max,max_flag,min,min_flag,prcp,prcp_flag,fog,rain,snow,hail,thunder,tornado) \
             VALUES (030050,99999,1929,10,01,7.3,4,4.7,4,1001.3,4,0,10.0,4,6.7,4,9.3,8.9,'*',5.6,'*',0.0,'I',0,1,0,0,0,0);"
        );
    }

    #[test]
    fn should_quote_char_values() {
        let mut record = Record::from_line(LINE, 2).unwrap();
        let flag = crate::reading::schema::field_index("prcp_flag").unwrap();
        record.values[flag] = Some("'".to_string());

        let sql = insert_statement("gsod", &record);

        assert!(sql.contains(",'*',"));
        assert!(sql.contains(",''''"));
        assert!(!sql.contains("gust"));
        assert!(!sql.contains("sndp"));
    }

    #[test]
    fn should_write_create_table() {
        let sql = create_table_statement("weather");

        assert!(sql.starts_with("CREATE TABLE weather (\n stn INTEGER,\n wban INTEGER,\n"));
        assert!(sql.contains(" max_flag CHAR(1),\n"));
        assert!(sql.contains(" temp FLOAT,\n"));
        assert!(sql.ends_with(" tornado INTEGER,\n PRIMARY KEY (stn, wban, year, month, day)\n);"));
    }

    #[test]
    fn should_only_create_table_when_asked() {
        let records = vec![Record::from_line(LINE, 2).unwrap()];

        let mut without = Vec::new();
        write_sql(&records, "gsod", false, &mut without).unwrap();
        let without = String::from_utf8(without).unwrap();
        assert_eq!(without.lines().count(), 1);
        assert!(without.starts_with("INSERT INTO gsod ("));

        let mut with = Vec::new();
        write_sql(&records, "gsod", true, &mut with).unwrap();
        let with = String::from_utf8(with).unwrap();
        assert!(with.starts_with("CREATE TABLE gsod ("));
        assert!(with.trim_end().ends_with(");"));
        assert_eq!(with.matches("INSERT INTO").count(), 1);
    }
}
