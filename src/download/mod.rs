//! Mirrors the yearly GSOD directories of a remote server into a local folder.
//!
//! Files already present locally are never fetched again: the local folder is
//! the record of what has been downloaded. Every remote operation runs under a
//! bounded retry policy; a transient failure drops the session and the next
//! attempt reconnects and returns to the year directory being worked on.

pub mod retry;
pub mod session;

use std::{
    collections::HashSet,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    thread,
};

use indicatif::ProgressBar;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::stations::Station;

pub use retry::RetryPolicy;
pub use session::{Connector, FtpConnector, RemoteSession, ServerConfig, SessionError};

#[derive(Error, Debug)]
pub enum RetrieverError {
    #[error("folder to store downloaded files {path} does not exist or is not writable: {source}")]
    NotWritable { path: PathBuf, source: io::Error },

    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: usize,
        source: SessionError,
    },

    #[error("{operation} failed: {source}")]
    Remote {
        operation: String,
        source: SessionError,
    },

    #[error("cannot write {path}: {source}")]
    Local { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub destination: PathBuf,
    /// `None` downloads every station.
    pub stations: Option<Vec<Station>>,
    pub first_year: i32,
    pub last_year: i32,
    pub retry: RetryPolicy,
    /// Names the download log, `listfile<product>.txt`.
    pub product: String,
}

/// What happened to one candidate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Downloaded,
    AlreadyPresent,
    /// More than one local file shares the candidate's stem.
    Conflict(usize),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub years: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub conflicts: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Downloaded => self.downloaded += 1,
            Outcome::AlreadyPresent => self.already_present += 1,
            Outcome::Conflict(_) => self.conflicts += 1,
        }
    }

    fn merge(&mut self, other: RunSummary) {
        self.years += other.years;
        self.downloaded += other.downloaded;
        self.already_present += other.already_present;
        self.conflicts += other.conflicts;
    }
}

/// Fails unless a file can be created in `folder`.
pub fn check_writable(folder: &Path) -> Result<(), RetrieverError> {
    NamedTempFile::new_in(folder)
        .map(drop)
        .map_err(|source| RetrieverError::NotWritable {
            path: folder.to_path_buf(),
            source,
        })
}

pub struct Retriever<C: Connector> {
    connector: C,
    session: Option<C::Session>,
    config: RetrieverConfig,
    current_year: Option<i32>,
    remote_years: Vec<i32>,
    download_log: BufWriter<File>,
    log_path: PathBuf,
    progress: ProgressBar,
}

impl<C: Connector> Retriever<C> {
    /// Checks the destination and truncates the download log. No connection is
    /// made until [`Retriever::connect`].
    pub fn new(connector: C, config: RetrieverConfig, progress: ProgressBar) -> Result<Self, RetrieverError> {
        check_writable(&config.destination)?;

        let log_path = config
            .destination
            .join(format!("listfile{}.txt", config.product));
        let log_file = File::create(&log_path).map_err(|source| RetrieverError::Local {
            path: log_path.clone(),
            source,
        })?;

        Ok(Self {
            connector,
            session: None,
            config,
            current_year: None,
            remote_years: Vec::new(),
            download_log: BufWriter::new(log_file),
            log_path,
            progress,
        })
    }

    /// Opens the session and reads which year directories the server has.
    pub fn connect(&mut self) -> Result<(), RetrieverError> {
        let listing = self.retrying("list base directory", |s| s.list())?;
        self.remote_years = year_directories(&listing);

        info!(years = self.remote_years.len(), "Connected");
        Ok(())
    }

    /// Years on the server within `[first, last]`, newest first.
    pub fn list_years(&self, first: i32, last: i32) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .remote_years
            .iter()
            .copied()
            .filter(|y| (first..=last).contains(y))
            .collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();

        debug!(first, last, selected = years.len(), "Selected years");
        years
    }

    pub fn enter_year(&mut self, year: i32) -> Result<(), RetrieverError> {
        let dir = year.to_string();
        self.retrying(&format!("enter directory {}", dir), |s| s.cwd(&dir))?;
        self.current_year = Some(year);

        debug!(year, "Entered directory");
        Ok(())
    }

    pub fn leave_year(&mut self) -> Result<(), RetrieverError> {
        self.retrying("leave directory", |s| s.cdup())?;
        self.current_year = None;

        debug!("Left directory");
        Ok(())
    }

    /// Remote files for `year`, restricted to the configured stations if any.
    pub fn list_candidate_files(&mut self, year: i32) -> Result<Vec<String>, RetrieverError> {
        let listing = self.retrying(&format!("list directory {}", year), |s| s.nlst())?;
        let names: Vec<String> = listing
            .iter()
            .map(|entry| entry.rsplit('/').next().unwrap_or(entry).to_string())
            .collect();

        let candidates = match &self.config.stations {
            Some(stations) => {
                let available: HashSet<&str> = names.iter().map(String::as_str).collect();
                stations
                    .iter()
                    .map(|s| s.file_name(year))
                    .filter(|name| available.contains(name.as_str()))
                    .collect()
            }
            None => names,
        };

        debug!(year, candidates = candidates.len(), "Listed remote files");
        Ok(candidates)
    }

    /// Drops candidates that already exist in the destination folder.
    pub fn filter_already_downloaded(&self, candidates: Vec<String>) -> Result<Vec<String>, RetrieverError> {
        let local: HashSet<String> = self.local_files()?.into_iter().collect();

        Ok(candidates
            .into_iter()
            .filter(|name| !local.contains(name))
            .collect())
    }

    /// Streams one remote file into the destination folder and records it in
    /// the download log. A failed download leaves no partial file behind.
    pub fn download_one(&mut self, name: &str) -> Result<(), RetrieverError> {
        let path = self.config.destination.join(name);

        let result = self.retrying(&format!("download {}", name), |s| {
            let mut file = File::create(&path).map_err(|e| {
                SessionError::Fatal(format!("cannot create {}: {}", path.display(), e))
            })?;
            s.retrieve(name, &mut file)
        });

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                if let Err(remove_error) = fs::remove_file(&path) {
                    warn!(file = name, error = %remove_error, "Cannot remove partial download");
                }
                return Err(e);
            }
        };

        writeln!(self.download_log, "{}", name)
            .and_then(|_| self.download_log.flush())
            .map_err(|source| RetrieverError::Local {
                path: self.log_path.clone(),
                source,
            })?;

        debug!(file = name, bytes, "Downloaded");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn download_year(&mut self, year: i32) -> Result<RunSummary, RetrieverError> {
        let mut summary = RunSummary {
            years: 1,
            ..Default::default()
        };

        self.enter_year(year)?;

        let candidates = self.list_candidate_files(year)?;
        let pending = self.filter_already_downloaded(candidates)?;
        let mut local = self.local_files()?;

        for name in pending {
            let outcome = match stem_matches(&name, &local) {
                0 => {
                    self.download_one(&name)?;
                    local.push(name.clone());
                    Outcome::Downloaded
                }
                1 => {
                    warn!(file = %name, "File already exists");
                    Outcome::AlreadyPresent
                }
                n => {
                    error!(file = %name, matches = n, "Too many local files for stem");
                    Outcome::Conflict(n)
                }
            };
            summary.record(outcome);
        }

        self.leave_year()?;

        info!(
            year,
            downloaded = summary.downloaded,
            already_present = summary.already_present,
            conflicts = summary.conflicts,
            "Year done"
        );
        Ok(summary)
    }

    /// Downloads every selected year, newest first, then closes the session.
    pub fn download_all(mut self) -> Result<RunSummary, RetrieverError> {
        let years = self.list_years(self.config.first_year, self.config.last_year);
        let mut summary = RunSummary::default();

        self.progress.set_length(years.len() as u64);

        for year in years {
            self.progress.set_message(format!("Downloading {}", year));
            summary.merge(self.download_year(year)?);
            self.progress.inc(1);
        }

        self.progress.finish_with_message("Download complete");
        self.close()?;

        Ok(summary)
    }

    pub fn close(mut self) -> Result<(), RetrieverError> {
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.quit() {
                warn!(error = %e, "Error closing connection");
            }
        }

        self.download_log
            .flush()
            .map_err(|source| RetrieverError::Local {
                path: self.log_path.clone(),
                source,
            })?;

        debug!("Connection closed");
        Ok(())
    }

    fn local_files(&self) -> Result<Vec<String>, RetrieverError> {
        let local = |source| RetrieverError::Local {
            path: self.config.destination.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config.destination).map_err(local)? {
            let entry = entry.map_err(local)?;
            if entry.file_type().map_err(local)?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        Ok(names)
    }

    fn session(&mut self) -> Result<&mut C::Session, SessionError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                let mut session = self.connector.connect()?;
                if let Some(year) = self.current_year {
                    session.cwd(&year.to_string())?;
                    debug!(year, "Re-entered directory after reconnect");
                }
                session
            }
        };

        Ok(self.session.insert(session))
    }

    /// Runs `op` until it succeeds, fails permanently or the retry policy is
    /// exhausted.
    fn retrying<T>(
        &mut self,
        operation: &str,
        mut op: impl FnMut(&mut C::Session) -> Result<T, SessionError>,
    ) -> Result<T, RetrieverError> {
        let mut delays = self.config.retry.delays();
        let mut attempts = 0;

        loop {
            attempts += 1;

            let error = match self.session().and_then(&mut op) {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !error.is_transient() {
                return Err(RetrieverError::Remote {
                    operation: operation.to_string(),
                    source: error,
                });
            }

            // the next attempt reconnects
            self.session = None;

            match delays.next() {
                Some(delay) => {
                    warn!(
                        operation,
                        attempt = attempts,
                        error = %error,
                        delay_ms = delay.as_millis() as u64,
                        "Transient error, retrying"
                    );
                    thread::sleep(delay);
                }
                None => {
                    return Err(RetrieverError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts,
                        source: error,
                    })
                }
            }
        }
    }
}

/// Year directories in a long listing. Only `d` entries count, and the name is
/// the last whitespace separated token.
fn year_directories(listing: &[String]) -> Vec<i32> {
    listing
        .iter()
        .filter(|line| line.starts_with('d'))
        .filter_map(|line| line.split_whitespace().last())
        .filter_map(|name| name.parse().ok())
        .collect()
}

/// Number of local files sharing `name`'s stem, the part before the first `.`.
fn stem_matches(name: &str, local: &[String]) -> usize {
    let stem = name.split('.').next().unwrap_or(name);
    local.iter().filter(|f| f.starts_with(stem)).count()
}

// -- Tests -------------------------------------------------------------------
