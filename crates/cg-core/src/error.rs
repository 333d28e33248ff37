use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Invalid parameters, rejected before any computation starts.
    Config(String),
    /// The audit was handed zero documents.
    EmptyCorpus,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Config(msg) => write!(f, "invalid configuration: {msg}"),
            CoreError::EmptyCorpus => write!(f, "no documents found in source"),
        }
    }
}

impl std::error::Error for CoreError {}

pub type Result<T> = std::result::Result<T, CoreError>;
