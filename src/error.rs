use std::path::PathBuf;
use thiserror::Error;

/// How far a failure reaches: a `Recoverable` error degrades the run (search-only mode,
/// a skipped scene), a `Fatal` one aborts the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Recoverable,
    Fatal,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unable to read configuration file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Unable to create directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Credentials unavailable: {0}")]
    Credentials(String),
    #[error("Catalog query failed: {0}")]
    Search(String),
    #[error("No authenticated session, downloads are disabled")]
    NoSession,
    #[error("Download of {title} failed: {reason}")]
    Download { title: String, reason: String },
    #[error("Invalid month '{0}', expected YYYY-MM")]
    Month(String),
}

impl Error {
    pub fn severity(&self) -> Severity {
        match self {
            Error::ConfigRead { .. }
            | Error::ConfigParse { .. }
            | Error::Directory { .. }
            | Error::Month(_) => Severity::Fatal,
            Error::Credentials(_)
            | Error::Search(_)
            | Error::NoSession
            | Error::Download { .. } => Severity::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
