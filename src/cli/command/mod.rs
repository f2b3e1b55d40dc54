pub mod convert;
pub mod download;

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};
pub use convert::convert;
pub use download::download;

/// Default parquet output, named after the input file and today's date.
pub fn make_parquet_file_name(input: &Path) -> PathBuf {
    let today = Local::now();
    let stem = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .and_then(|n| n.split('.').next().map(str::to_string))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "records".to_string());

    let file_name = format!(
        "gsod-{}-{}-{:02}-{:02}.parquet",
        stem,
        today.year(),
        today.month(),
        today.day()
    );

    dirs::home_dir().unwrap_or_default().join(file_name)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_name_parquet_file_after_input() {
        let path = make_parquet_file_name(Path::new("/data/010010-99999-2012.op.gz"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();

        assert!(name.starts_with("gsod-010010-99999-2012-"));
        assert!(name.ends_with(".parquet"));
    }
}
