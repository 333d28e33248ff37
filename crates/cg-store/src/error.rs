use std::fmt;
use std::path::PathBuf;

use cg_core::CoreError;

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A line or file is not valid structured data.
    Parse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },
    /// A corpus payload is valid JSON but not a document.
    InvalidDocument { origin: String, message: String },
    NotFound(PathBuf),
    /// A corpus directory holds no `.json`/`.jsonl` files.
    EmptySource(PathBuf),
    Config { path: PathBuf, message: String },
    Core(CoreError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            StoreError::Parse {
                path,
                line: Some(line),
                message,
            } => write!(f, "{}:{line} invalid JSON: {message}", path.display()),
            StoreError::Parse {
                path,
                line: None,
                message,
            } => write!(f, "{} invalid JSON: {message}", path.display()),
            StoreError::InvalidDocument { origin, message } => {
                write!(f, "{origin}: invalid document: {message}")
            }
            StoreError::NotFound(path) => write!(f, "path {} does not exist", path.display()),
            StoreError::EmptySource(path) => {
                write!(f, "no JSON or JSONL files found in {}", path.display())
            }
            StoreError::Config { path, message } => {
                write!(f, "invalid config {}: {message}", path.display())
            }
            StoreError::Core(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Core(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        StoreError::Core(e)
    }
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_path_buf())
        } else {
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
