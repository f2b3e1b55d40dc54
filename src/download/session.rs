//! Remote file server session.
//!
//! The retriever only talks to the server through [`RemoteSession`], so the
//! download loop can be exercised without a network.

use std::io::{self, Write};

use suppaftp::{types::FileType, FtpError, FtpStream};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SessionError {
    /// Connection reset, timeout or a temporary server refusal.
    #[error("transient remote error: {0}")]
    Transient(String),

    #[error("remote error: {0}")]
    Fatal(String),
}

impl SessionError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Transient(_))
    }
}

impl From<FtpError> for SessionError {
    fn from(e: FtpError) -> Self {
        match &e {
            FtpError::ConnectionError(_) => SessionError::Transient(e.to_string()),
            // 4xx replies are temporary by definition (RFC 959)
            FtpError::UnexpectedResponse(response) if response.status.code() / 100 == 4 => {
                SessionError::Transient(e.to_string())
            }
            _ => SessionError::Fatal(e.to_string()),
        }
    }
}

pub trait RemoteSession {
    fn cwd(&mut self, path: &str) -> Result<(), SessionError>;
    fn cdup(&mut self) -> Result<(), SessionError>;
    /// Long listing of the working directory, one line per entry.
    fn list(&mut self) -> Result<Vec<String>, SessionError>;
    /// Names in the working directory.
    fn nlst(&mut self) -> Result<Vec<String>, SessionError>;
    /// Streams a remote file into `sink`, returning the byte count.
    fn retrieve(&mut self, name: &str, sink: &mut dyn Write) -> Result<u64, SessionError>;
    fn quit(&mut self) -> Result<(), SessionError>;
}

/// Opens logged-in sessions positioned in the base path.
pub trait Connector {
    type Session: RemoteSession;

    fn connect(&self) -> Result<Self::Session, SessionError>;
}

/// Where and how to log in.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub base_path: String,
}

impl ServerConfig {
    /// Last component of the base path, e.g. `gsod` for `pub/data/gsod`.
    pub fn product(&self) -> &str {
        self.base_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|p| !p.is_empty())
            .unwrap_or("gsod")
    }
}

pub struct FtpConnector {
    config: ServerConfig,
}

impl FtpConnector {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }
}

impl Connector for FtpConnector {
    type Session = FtpStream;

    fn connect(&self) -> Result<FtpStream, SessionError> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        debug!(%address, "Opening connection");

        let mut stream = FtpStream::connect(address.as_str())?;
        stream.login(self.config.user.as_str(), self.config.password.as_str())?;
        stream.transfer_type(FileType::Binary)?;
        stream.cwd(self.config.base_path.as_str())?;

        Ok(stream)
    }
}

impl RemoteSession for FtpStream {
    fn cwd(&mut self, path: &str) -> Result<(), SessionError> {
        Ok(FtpStream::cwd(self, path)?)
    }

    fn cdup(&mut self) -> Result<(), SessionError> {
        Ok(FtpStream::cdup(self)?)
    }

    fn list(&mut self) -> Result<Vec<String>, SessionError> {
        Ok(FtpStream::list(self, None)?)
    }

    fn nlst(&mut self) -> Result<Vec<String>, SessionError> {
        Ok(FtpStream::nlst(self, None)?)
    }

    fn retrieve(&mut self, name: &str, sink: &mut dyn Write) -> Result<u64, SessionError> {
        let bytes = self.retr(name, |reader| {
            io::copy(reader, &mut *sink).map_err(FtpError::ConnectionError)
        })?;

        Ok(bytes)
    }

    fn quit(&mut self) -> Result<(), SessionError> {
        Ok(FtpStream::quit(self)?)
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    fn config(base_path: &str) -> ServerConfig {
        ServerConfig {
            host: "ftp.example.org".to_string(),
            port: 21,
            user: "anonymous".to_string(),
            password: "me@example.org".to_string(),
            base_path: base_path.to_string(),
        }
    }

    #[test]
    fn should_name_product_after_base_path() {
        assert_eq!(config("pub/data/gsod").product(), "gsod");
        assert_eq!(config("/pub/data/gsod/").product(), "gsod");
        assert_eq!(config("noaa").product(), "noaa");
        assert_eq!(config("").product(), "gsod");
    }

    #[test]
    fn should_classify_io_errors_as_transient() {
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");

        assert!(SessionError::from(FtpError::ConnectionError(reset)).is_transient());
        assert!(!SessionError::Fatal("550".to_string()).is_transient());
    }
}
