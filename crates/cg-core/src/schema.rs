//! JSON Schema export for the record, document and report shapes.

use std::fmt;
use std::str::FromStr;

use schemars::schema_for;
use serde_json::Value;

use crate::cohesion::{CohesionReport, Document};
use crate::error::CoreError;
use crate::record::{JournalRecord, ShadowRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaTarget {
    Journal,
    Shadow,
    Document,
    Report,
}

impl SchemaTarget {
    pub const ALL: [SchemaTarget; 4] = [
        SchemaTarget::Journal,
        SchemaTarget::Shadow,
        SchemaTarget::Document,
        SchemaTarget::Report,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SchemaTarget::Journal => "journal",
            SchemaTarget::Shadow => "shadow",
            SchemaTarget::Document => "document",
            SchemaTarget::Report => "report",
        }
    }
}

impl fmt::Display for SchemaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemaTarget {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchemaTarget::ALL
            .into_iter()
            .find(|t| t.name() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| {
                CoreError::Config(format!(
                    "unknown schema '{s}' (expected journal, shadow, document or report)"
                ))
            })
    }
}

pub fn json_schema(target: SchemaTarget) -> Value {
    let schema = match target {
        SchemaTarget::Journal => schema_for!(JournalRecord),
        SchemaTarget::Shadow => schema_for!(ShadowRecord),
        SchemaTarget::Document => schema_for!(Document),
        SchemaTarget::Report => schema_for!(CohesionReport),
    };
    schema.to_value()
}
