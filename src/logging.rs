//! Tracing setup. Components only emit events; the command that runs them
//! decides where the events go.

use std::{
    fs::File,
    io::{self, Write},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use indicatif::MultiProgress;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Writes to stderr with the progress bars cleared, so log lines and bar
/// redraws do not interleave.
#[derive(Clone)]
pub struct ProgressWriter {
    progress: MultiProgress,
}

impl ProgressWriter {
    pub fn new(progress: MultiProgress) -> Self {
        Self { progress }
    }
}

impl Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.progress.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.progress.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for ProgressWriter {
    type Writer = ProgressWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Logs to stderr and, if given, to `log_file` as well. When `progress` is
/// given, stderr output goes around its bars. `RUST_LOG` overrides the level
/// chosen by `debug`.
pub fn init(debug: bool, log_file: Option<&Path>, progress: Option<&MultiProgress>) -> Result<()> {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    let stderr = match progress {
        Some(progress) => BoxMakeWriter::new(ProgressWriter::new(progress.clone())),
        None => BoxMakeWriter::new(io::stderr),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(stderr))
        .with(file_layer)
        .try_init()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
