//! Journal and shadow record model.
//!
//! Two views of the same line exist. [`JournalRecord`] is the typed
//! producer contract and round-trips unknown keys through flattened
//! extension maps. [`Entry`] is the line exactly as it was read, a loose
//! JSON object, which is what the validator inspects: a record that breaks
//! the contract must still be checkable so every problem can be reported.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// The four bounded quality metrics carried by every journal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// `∆` — distress proxy; drives the crisis rule.
    Delta,
    /// `D` — depth.
    Depth,
    /// `Ω` — confidence shift.
    Omega,
    /// `Λ` — length/latency budget.
    Lambda,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Delta, Metric::Depth, Metric::Omega, Metric::Lambda];

    /// Key used on disk.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Delta => "∆",
            Metric::Depth => "D",
            Metric::Omega => "Ω",
            Metric::Lambda => "Λ",
        }
    }

    /// Alternate spellings accepted on read. Some producers write the Greek
    /// capital delta (U+0394) instead of the increment sign (U+2206).
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Metric::Delta => &["Δ"],
            _ => &[],
        }
    }
}

/// One value per metric, serialized under the on-disk metric keys.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PerMetric<T> {
    #[serde(rename = "∆")]
    pub delta: T,
    #[serde(rename = "D")]
    pub depth: T,
    #[serde(rename = "Ω")]
    pub omega: T,
    #[serde(rename = "Λ")]
    pub lambda: T,
}

impl<T> PerMetric<T> {
    pub fn from_fn(mut f: impl FnMut(Metric) -> T) -> Self {
        Self {
            delta: f(Metric::Delta),
            depth: f(Metric::Depth),
            omega: f(Metric::Omega),
            lambda: f(Metric::Lambda),
        }
    }

    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::Delta => &self.delta,
            Metric::Depth => &self.depth,
            Metric::Omega => &self.omega,
            Metric::Lambda => &self.lambda,
        }
    }
}

/// Closed integer ranges for each metric.
///
/// Passed explicitly to the validator; nothing is read from disk behind the
/// caller's back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricBounds {
    pub delta: [i64; 2],
    pub depth: [i64; 2],
    pub omega: [i64; 2],
    pub lambda: [i64; 2],
}

impl Default for MetricBounds {
    fn default() -> Self {
        Self {
            delta: [-3, 3],
            depth: [0, 9],
            omega: [-3, 3],
            lambda: [0, 9999],
        }
    }
}

impl MetricBounds {
    pub fn range(&self, metric: Metric) -> (i64, i64) {
        let [lo, hi] = match metric {
            Metric::Delta => self.delta,
            Metric::Depth => self.depth,
            Metric::Omega => self.omega,
            Metric::Lambda => self.lambda,
        };
        (lo, hi)
    }

    pub fn contains(&self, metric: Metric, value: f64) -> bool {
        let (lo, hi) = self.range(metric);
        lo as f64 <= value && value <= hi as f64
    }

    pub fn validate(&self) -> Result<()> {
        for metric in Metric::ALL {
            let (lo, hi) = self.range(metric);
            if lo > hi {
                return Err(CoreError::Config(format!(
                    "bounds for {} are inverted: [{lo}, {hi}]",
                    metric.key()
                )));
            }
        }
        Ok(())
    }
}

/// Free-form event mapping. `evidence` is the only required key; everything
/// else is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Events {
    pub evidence: Vec<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A tool/agent action attached to a decision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct AgentStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One decision emitted by a producing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JournalRecord {
    #[serde(default)]
    pub facet: String,
    #[serde(default)]
    pub snapshot: String,
    /// `None` means the pipeline blocked or produced no answer.
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(rename = "∆", alias = "Δ")]
    pub delta: i64,
    #[serde(rename = "D")]
    pub depth: i64,
    #[serde(rename = "Ω")]
    pub omega: i64,
    #[serde(rename = "Λ")]
    pub lambda: i64,
    pub mirror: String,
    #[serde(default)]
    pub modules: Vec<String>,
    pub events: Events,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ritual: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_step: Option<AgentStep>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl JournalRecord {
    pub fn metric(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Delta => self.delta,
            Metric::Depth => self.depth,
            Metric::Omega => self.omega,
            Metric::Lambda => self.lambda,
        }
    }

    pub fn is_crisis(&self) -> bool {
        self.delta as f64 <= crate::constants::CRISIS_DELTA
    }
}

/// Mirror entry in the shadow journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShadowRecord {
    pub mirror: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A journal line as read from disk: its 1-based line number and the raw
/// JSON object. No field is assumed to be present or well-typed.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub line: usize,
    pub fields: Map<String, Value>,
}

impl Entry {
    pub fn new(line: usize, fields: Map<String, Value>) -> Self {
        Self { line, fields }
    }

    /// Serialize a typed record into an entry, as if it had been read from
    /// `line` of a journal file.
    pub fn from_record<T: Serialize>(line: usize, record: &T) -> serde_json::Result<Self> {
        match serde_json::to_value(record)? {
            Value::Object(fields) => Ok(Self { line, fields }),
            other => Err(serde::ser::Error::custom(format!(
                "record serialized to {other}, expected an object"
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Raw metric value, looked up under its key and then its aliases.
    pub fn metric(&self, metric: Metric) -> Option<&Value> {
        self.fields.get(metric.key()).or_else(|| {
            metric
                .aliases()
                .iter()
                .find_map(|alias| self.fields.get(*alias))
        })
    }

    /// Metric as a number, if present and numeric. Booleans are not numbers.
    pub fn metric_value(&self, metric: Metric) -> Option<f64> {
        self.metric(metric).and_then(Value::as_f64)
    }

    pub fn facet(&self) -> Option<&str> {
        self.fields.get("facet").and_then(Value::as_str)
    }

    pub fn mirror(&self) -> Option<&str> {
        self.fields.get("mirror").and_then(Value::as_str)
    }

    /// Module names in order; non-string items are skipped.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.fields
            .get("modules")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    pub fn events(&self) -> Option<&Map<String, Value>> {
        self.fields.get("events").and_then(Value::as_object)
    }

    pub fn to_record(&self) -> serde_json::Result<JournalRecord> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }

    pub fn to_shadow(&self) -> serde_json::Result<ShadowRecord> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }
}

/// Truthiness as producers use it: null, false, zero, and empty
/// strings/arrays/objects are false; everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
