use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use indicatif::MultiProgress;
use tracing::info;

use crate::{
    cli::{create_progress_bar, create_spinner, DownloadArgs},
    download::{
        check_writable, FtpConnector, Retriever, RetrieverConfig, RetryPolicy, ServerConfig,
    },
    logging,
    stations::{self, Station},
};

pub fn download(args: &DownloadArgs, debug: bool) -> Result<String> {
    // Local preconditions are checked before anything touches the network
    check_writable(&args.destination)?;
    let stations = station_filter(args)?;

    let server = ServerConfig {
        host: args.url.clone(),
        port: args.port,
        user: args.username.clone(),
        password: args.password.clone(),
        base_path: args.path.clone(),
    };
    let product = server.product().to_string();

    let progress = MultiProgress::new();
    let log_file = args.destination.join(format!("{}.log", product));
    logging::init(debug, Some(&log_file), Some(&progress))?;

    let config = RetrieverConfig {
        destination: args.destination.clone(),
        stations,
        first_year: args.first_year,
        last_year: args.end_year.unwrap_or_else(|| Local::now().year()),
        retry: RetryPolicy::new(args.max_retries, Duration::from_millis(args.retry_delay_ms)),
        product,
    };

    info!(
        host = %server.host,
        first_year = config.first_year,
        last_year = config.last_year,
        stations = config.stations.as_ref().map_or(0, Vec::len),
        "Starting download"
    );

    let host = server.host.clone();
    let years_bar = progress.add(create_progress_bar(0, "Downloading...".to_string()));
    let mut retriever = Retriever::new(FtpConnector::new(server), config, years_bar)?;

    let bar = progress.add(create_spinner(format!("Connecting to {}...", host)));
    retriever
        .connect()
        .with_context(|| format!("cannot connect to {}", host))?;
    bar.finish_with_message(format!("Connected to {}", host));

    let summary = retriever.download_all()?;

    Ok(format!(
        "Downloaded {} files over {} years to `{}` ({} already present, {} conflicting)",
        summary.downloaded,
        summary.years,
        args.destination.display(),
        summary.already_present,
        summary.conflicts
    ))
}

/// Stations given on the command line or in a list file; `None` means all.
fn station_filter(args: &DownloadArgs) -> Result<Option<Vec<Station>>> {
    let stations = match (&args.stations, &args.file) {
        (Some(list), _) => Some(stations::parse_list(list)?),
        (None, Some(path)) => Some(stations::read_file(path)?),
        (None, None) => None,
    };

    Ok(stations)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::io::Write;

    use clap::Parser;
    use tempfile::{NamedTempFile, TempDir};

    use super::*;
    use crate::cli::{Cli, Commands};

    fn args(extra: &[&str]) -> DownloadArgs {
        let mut argv = vec!["gsod", "download", "-P", "pw"];
        argv.extend_from_slice(extra);

        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Download(args) => args,
            _ => panic!("expected download"),
        }
    }

    #[test]
    fn should_download_all_stations_by_default() {
        let stations = station_filter(&args(&["/tmp"])).unwrap();

        assert!(stations.is_none());
    }

    #[test]
    fn should_take_stations_from_list() {
        let stations = station_filter(&args(&["-s", "010010.99999,010014.99999", "/tmp"]))
            .unwrap()
            .unwrap();

        assert_eq!(stations.len(), 2);
    }

    #[test]
    fn should_take_stations_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "010010.99999").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let stations = station_filter(&args(&["-F", &path, "/tmp"])).unwrap().unwrap();

        assert_eq!(stations[0].file_name(2012), "010010-99999-2012.op.gz");
    }

    #[test]
    fn should_reject_bad_station_code() {
        assert!(station_filter(&args(&["-s", "10010", "/tmp"])).is_err());
    }

    #[test]
    fn should_abort_before_connecting_when_folder_not_writable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing").to_string_lossy().to_string();

        let err = download(&args(&["-u", "unreachable.invalid", &missing]), false).unwrap_err();

        assert!(err.to_string().contains("not writable"));
    }
}
