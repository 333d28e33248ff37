//! Corpus cohesion audit.
//!
//! Chunks produced by a healthy segmenter overlap with their neighbours; a
//! pair of adjacent chunks with almost no shared subsequence usually means a
//! document was split in the wrong place or two documents were glued
//! together. The audit samples documents, scores every adjacent pair, and
//! reports the pairs that fall below a threshold.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_PREVIEW_LENGTH, DEFAULT_SAMPLE_SIZE, DEFAULT_SEED, DEFAULT_THRESHOLD, ELLIPSIS,
    SCORE_PRECISION,
};
use crate::error::{CoreError, Result};
use crate::similarity::{ScoringMode, score_tokens};
use crate::stats;
use crate::tokenizer::tokenize;

/// A corpus document: an id and its chunks in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    pub doc_id: String,
    pub chunks: Vec<String>,
}

impl Document {
    pub fn new(doc_id: impl Into<String>, chunks: Vec<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            chunks,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditConfig {
    pub sample_size: usize,
    pub threshold: f64,
    pub seed: u64,
    pub preview_length: usize,
    pub mode: ScoringMode,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            threshold: DEFAULT_THRESHOLD,
            seed: DEFAULT_SEED,
            preview_length: DEFAULT_PREVIEW_LENGTH,
            mode: ScoringMode::default(),
        }
    }
}

impl AuditConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(CoreError::Config(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.preview_length == 0 {
            return Err(CoreError::Config(
                "preview_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// An adjacent chunk pair scoring below the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Anomaly {
    pub doc_id: String,
    /// Index of the first chunk of the pair.
    pub chunk_index: usize,
    pub score: f64,
    pub chunk_a: String,
    pub chunk_b: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ScoreStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ScoreStats {
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        Self {
            count: scores.len(),
            mean: Some(stats::mean(scores)),
            median: stats::median(scores),
            min: stats::min(scores),
            max: stats::max(scores),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CohesionReport {
    pub documents_total: usize,
    pub documents_sampled: usize,
    pub chunk_pairs_evaluated: usize,
    pub threshold: f64,
    pub mode: ScoringMode,
    pub scores: ScoreStats,
    pub anomalies: Vec<Anomaly>,
}

impl CohesionReport {
    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty()
    }
}

/// Pick the documents to audit.
///
/// A sample size at or above the corpus size keeps the whole corpus in
/// order. Otherwise exactly `sample_size` distinct documents are drawn and
/// returned in corpus order. The draw is a partial Fisher-Yates shuffle over
/// a ChaCha8 stream keyed by `seed`, so the selection depends only on the
/// seed, the corpus size and the sample size.
pub fn sample_documents(documents: &[Document], sample_size: usize, seed: u64) -> Vec<&Document> {
    if sample_size >= documents.len() {
        return documents.iter().collect();
    }
    let mut rng = seeded_rng(seed);
    let mut pool: Vec<usize> = (0..documents.len()).collect();
    for i in 0..sample_size {
        let j = i + bounded(rng.next_u64(), pool.len() - i);
        pool.swap(i, j);
    }
    pool.truncate(sample_size);
    pool.sort_unstable();
    pool.into_iter().map(|i| &documents[i]).collect()
}

/// Key: the seed in the first eight bytes (little-endian), zeros after.
fn seeded_rng(seed: u64) -> ChaCha8Rng {
    let mut key = [0u8; 32];
    key[..8].copy_from_slice(&seed.to_le_bytes());
    ChaCha8Rng::from_seed(key)
}

/// Map a uniform `u64` into `0..span` by widening multiply.
fn bounded(x: u64, span: usize) -> usize {
    ((u128::from(x) * span as u128) >> 64) as usize
}

/// Audit the cohesion of adjacent chunks across a sample of the corpus.
///
/// Anomalies are data, not errors: the only failures are an invalid config
/// and an empty corpus.
pub fn audit(documents: &[Document], config: &AuditConfig) -> Result<CohesionReport> {
    config.validate()?;
    if documents.is_empty() {
        return Err(CoreError::EmptyCorpus);
    }

    let sampled = sample_documents(documents, config.sample_size, config.seed);
    let mut scores = Vec::new();
    let mut anomalies = Vec::new();

    for doc in &sampled {
        let tokens: Vec<Vec<String>> = doc.chunks.iter().map(|c| tokenize(c)).collect();
        for (i, pair) in tokens.windows(2).enumerate() {
            let score = score_tokens(&pair[0], &pair[1], config.mode);
            scores.push(score);
            if score < config.threshold {
                anomalies.push(Anomaly {
                    doc_id: doc.doc_id.clone(),
                    chunk_index: i,
                    score: stats::round_to(score, SCORE_PRECISION),
                    chunk_a: preview(&doc.chunks[i], config.preview_length),
                    chunk_b: preview(&doc.chunks[i + 1], config.preview_length),
                });
            }
        }
    }

    Ok(CohesionReport {
        documents_total: documents.len(),
        documents_sampled: sampled.len(),
        chunk_pairs_evaluated: scores.len(),
        threshold: config.threshold,
        mode: config.mode,
        scores: ScoreStats::from_scores(&scores),
        anomalies,
    })
}

/// Truncate `text` to at most `limit` characters, marking the cut with an
/// ellipsis that counts toward the limit.
pub fn preview(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut out: String = text.chars().take(limit.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}
