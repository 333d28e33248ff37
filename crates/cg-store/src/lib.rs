pub mod config;
pub mod corpus;
pub mod error;
pub mod journal;

pub use config::{AuditSection, GateConfig, ValidateSection};
pub use corpus::{load_documents, parse_documents};
pub use error::{Result, StoreError};
pub use journal::{read_all, read_window};
