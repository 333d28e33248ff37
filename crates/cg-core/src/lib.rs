//! Canon journal integrity and corpus cohesion auditing.
//!
//! Validates append-only decision journals against bounded-metric and
//! conditional invariants, aggregates rolling statistics for release gating,
//! and audits RAG corpora for chunk-boundary discontinuities using an
//! LCS-based similarity score.
//!
//! Zero I/O — callers hand in already-parsed entries and documents.

pub mod aggregate;
pub mod cohesion;
pub mod constants;
pub mod error;
pub mod record;
pub mod schema;
pub mod similarity;
pub mod stats;
pub mod tokenizer;
pub mod validator;

pub use aggregate::{AggregateSummary, MetricSpread, aggregate};
pub use cohesion::{AuditConfig, Anomaly, CohesionReport, Document, ScoreStats, audit, preview};
pub use constants::{
    DEFAULT_PREVIEW_LENGTH, DEFAULT_SAMPLE_SIZE, DEFAULT_SEED, DEFAULT_THRESHOLD, DEFAULT_WINDOW,
    MIN_SHADOW_RATIO,
};
pub use error::{CoreError, Result};
pub use record::{
    AgentStep, Entry, Events, JournalRecord, Metric, MetricBounds, PerMetric, ShadowRecord,
    is_truthy,
};
pub use schema::{SchemaTarget, json_schema};
pub use similarity::{ScoringMode, lcs_length, score_tokens, score_text};
pub use tokenizer::tokenize;
pub use validator::{
    JournalStream, Rule, Validator, ValidatorConfig, Verdict, VerdictSummary, Violation,
    ViolationKind,
};
