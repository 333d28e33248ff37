/// Default validation window: the last 50 journal records.
pub const DEFAULT_WINDOW: usize = 50;

/// Minimum shadow-to-main ratio for the coverage policy (inclusive).
pub const MIN_SHADOW_RATIO: f64 = 0.2;

/// Crisis threshold: `∆` at or below this requires a ritual.
pub const CRISIS_DELTA: f64 = -2.0;

/// Documents drawn per cohesion audit.
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Adjacent chunk pairs scoring strictly below this are anomalies.
pub const DEFAULT_THRESHOLD: f64 = 0.35;

/// Seed for the nightly audit sampler.
pub const DEFAULT_SEED: u64 = 13;

/// Characters kept in anomaly chunk previews.
pub const DEFAULT_PREVIEW_LENGTH: usize = 120;

/// Appended to truncated previews.
pub const ELLIPSIS: char = '…';

/// Decimal places for anomaly scores.
pub const SCORE_PRECISION: u32 = 4;

/// Decimal places for ratios in summaries.
pub const RATIO_PRECISION: u32 = 3;

/// Size of the module usage census.
pub const TOP_MODULES: usize = 5;
