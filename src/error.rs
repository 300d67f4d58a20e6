use std::convert::Infallible;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpioError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unexpected data in {}: {byte:#04x}", .path.display())]
    UnexpectedData { path: PathBuf, byte: u8 },
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GpioError {
    /// Builds a mapper that attaches `path` to an I/O failure.
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> GpioError + '_ {
        move |source| GpioError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            GpioError::Io { path, .. } | GpioError::UnexpectedData { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Kind of the underlying I/O failure, if any.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            GpioError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

impl From<Infallible> for GpioError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
