use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use super::make_parquet_file_name;
use crate::{
    cli::{create_spinner, ConvertArgs, OutputMode},
    output::{save_records, write_csv, write_sql},
    reading::parse_file,
};

/// Converts one GSOD file. Text modes write to `out`; parquet mode writes a
/// file and returns its path.
pub fn convert<W: Write>(args: &ConvertArgs, out: W) -> Result<Option<String>> {
    let records = parse_file(&args.filename, args.threshold)
        .with_context(|| format!("cannot convert {}", args.filename.display()))?;

    info!(
        file = %args.filename.display(),
        records = records.len(),
        threshold = args.threshold,
        "Parsed"
    );

    match args.mode {
        OutputMode::Csv => {
            write_csv(&records, args.separator, out)?;
            Ok(None)
        }
        OutputMode::Sql => {
            write_sql(&records, &args.table_name, args.create_table, out)?;
            Ok(None)
        }
        OutputMode::Parquet => {
            let path = args
                .output
                .clone()
                .unwrap_or_else(|| make_parquet_file_name(&args.filename));

            let bar = create_spinner(format!("Saving {} records...", records.len()));
            save_records(&records, &path)?;
            bar.finish_and_clear();

            Ok(Some(path.to_string_lossy().to_string()))
        }
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::fs;

    use clap::Parser;
    use tempfile::{NamedTempFile, TempDir};

    use super::*;
    use crate::cli::{Cli, Commands};

    const INPUT: &str = "\
STN--- WBAN   YEARMODA    TEMP       DEWP      SLP        STP       VISIB      WDSP     MXSPD   GUST    MAX     MIN   PRCP   SNDP   FRSHTT
030050 99999  19291001    45.2  4    40.4  4  1001.3  4  9999.9  0    6.2  4   13.0  4   18.1  999.9    48.0*   42.1*  0.00I 999.9  010000
";

    fn input() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(INPUT.as_bytes()).unwrap();
        file
    }

    fn args(extra: &[&str], file: &NamedTempFile) -> ConvertArgs {
        let path = file.path().to_string_lossy().to_string();
        let mut argv = vec!["gsod", "convert"];
        argv.extend_from_slice(extra);
        argv.push(&path);

        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Convert(args) => args,
            _ => panic!("expected convert"),
        }
    }

    fn run(args: &ConvertArgs) -> String {
        let mut out = Vec::new();
        let saved = convert(args, &mut out).unwrap();
        assert!(saved.is_none());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn should_convert_to_csv() {
        let file = input();

        let output = run(&args(&[], &file));
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("stn,wban,year,month,day,temp,temp_count"));
        assert!(lines[1].starts_with("030050,99999,1929,10,01,7.3,4,4.7,4"));
    }

    #[test]
    fn should_convert_with_separator() {
        let file = input();

        let output = run(&args(&["-s", ";"], &file));

        assert!(output.lines().nth(1).unwrap().starts_with("030050;99999;1929;10;01;7.3"));
    }

    #[test]
    fn should_convert_to_sql() {
        let file = input();

        let output = run(&args(&["-m", "sql", "-n", "weather", "-c"], &file));

        assert!(output.starts_with("CREATE TABLE weather ("));
        assert!(output.contains("INSERT INTO weather (stn,wban,year"));
        assert!(output.trim_end().ends_with(");"));
    }

    #[test]
    fn should_apply_threshold() {
        let file = input();

        let output = run(&args(&["-t", "5"], &file));

        // every count in the fixture is below 5
        assert!(output.lines().nth(1).unwrap().starts_with("030050,99999,1929,10,01,,4,,4"));
    }

    #[test]
    fn should_save_parquet_file() {
        let file = input();
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.parquet");
        let target_arg = target.to_string_lossy().to_string();

        let saved = convert(&args(&["-m", "parquet", "-o", &target_arg], &file), Vec::new()).unwrap();

        assert_eq!(saved.as_deref(), Some(target_arg.as_str()));
        assert!(fs::metadata(&target).unwrap().len() > 0);
    }

    #[test]
    fn should_fail_on_missing_file() {
        let file = input();
        let mut args = args(&[], &file);
        args.filename = "/no/such/file.op".into();

        let err = convert(&args, Vec::new()).unwrap_err();

        assert!(format!("{:#}", err).contains("/no/such/file.op"));
    }
}
