//! Strict journal validation for release gating.
//!
//! Per-record rules (schema) are checked line by line over the window;
//! cross-record rules (policy) are checked once over the whole window. All
//! findings are collected before a verdict is returned, so one run surfaces
//! every problem in the window.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::constants::{CRISIS_DELTA, DEFAULT_WINDOW, MIN_SHADOW_RATIO, RATIO_PRECISION};
use crate::error::{CoreError, Result};
use crate::record::{Entry, Metric, MetricBounds, PerMetric, is_truthy};
use crate::stats::{mean, ratio, round_to};

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorConfig {
    pub bounds: MetricBounds,
    /// Trailing records to validate; `0` validates the whole stream.
    pub window: usize,
    pub min_shadow_ratio: f64,
    /// Disable only for early-stage journals that have no shadow trail yet.
    pub require_shadow_coverage: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            bounds: MetricBounds::default(),
            window: DEFAULT_WINDOW,
            min_shadow_ratio: MIN_SHADOW_RATIO,
            require_shadow_coverage: true,
        }
    }
}

impl ValidatorConfig {
    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        if !self.min_shadow_ratio.is_finite() || self.min_shadow_ratio < 0.0 {
            return Err(CoreError::Config(format!(
                "min_shadow_ratio must be a non-negative number, got {}",
                self.min_shadow_ratio
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    /// A single record breaks a journal record invariant.
    Schema,
    /// A rule over the whole window fails.
    Policy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Metric(Metric),
    Mirror,
    Evidence,
    Crisis,
    AgentStep,
    ShadowCoverage,
    ShadowMirror,
}

impl Rule {
    pub fn kind(self) -> ViolationKind {
        match self {
            Rule::ShadowCoverage | Rule::ShadowMirror => ViolationKind::Policy,
            _ => ViolationKind::Schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub rule: Rule,
    /// Path (or label) of the stream the offending line came from.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Violation {
    fn at(rule: Rule, source: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind: rule.kind(),
            rule,
            source: source.to_string(),
            line: Some(line),
            message: message.into(),
        }
    }

    fn window(rule: Rule, source: &str, message: impl Into<String>) -> Self {
        Self {
            kind: rule.kind(),
            rule,
            source: source.to_string(),
            line: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.source, line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// A labelled run of journal entries in file order.
#[derive(Debug, Clone, Copy)]
pub struct JournalStream<'a> {
    pub source: &'a str,
    pub entries: &'a [Entry],
}

impl<'a> JournalStream<'a> {
    pub fn new(source: &'a str, entries: &'a [Entry]) -> Self {
        Self { source, entries }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Records in the validated window.
    pub count: usize,
    pub averages: PerMetric<f64>,
    pub shadow_ratio: f64,
    pub violations: Vec<Violation>,
}

/// What a passing run prints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerdictSummary {
    pub count: usize,
    pub avg: PerMetric<f64>,
    pub shadow_ratio: f64,
}

impl Verdict {
    pub fn ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    pub fn summary(&self) -> VerdictSummary {
        VerdictSummary {
            count: self.count,
            avg: self.averages,
            shadow_ratio: round_to(self.shadow_ratio, RATIO_PRECISION),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// The trailing slice of `entries` this validator checks.
    pub fn window<'e>(&self, entries: &'e [Entry]) -> &'e [Entry] {
        match self.config.window {
            0 => entries,
            w => &entries[entries.len().saturating_sub(w)..],
        }
    }

    /// Validate the main stream's window and, when given, the shadow stream.
    ///
    /// The shadow ratio is measured against the windowed main count, not the
    /// full file. An absent shadow stream counts as zero shadow records.
    pub fn validate(&self, main: JournalStream<'_>, shadow: Option<JournalStream<'_>>) -> Verdict {
        let window = self.window(main.entries);
        let mut violations = Vec::new();

        for entry in window {
            self.check_entry(main.source, entry, &mut violations);
        }

        let shadow_entries = shadow.map_or(&[][..], |s| s.entries);
        let shadow_ratio = ratio(shadow_entries.len(), window.len());
        if self.config.require_shadow_coverage && shadow_ratio < self.config.min_shadow_ratio {
            violations.push(Violation::window(
                Rule::ShadowCoverage,
                shadow.map_or(main.source, |s| s.source),
                format!(
                    "shadow_ratio {} < {:.prec$} ({} shadow / {} entries)",
                    floored_ratio(shadow_entries.len(), window.len()),
                    self.config.min_shadow_ratio,
                    shadow_entries.len(),
                    window.len(),
                    prec = RATIO_PRECISION as usize,
                ),
            ));
        }

        if let Some(shadow) = shadow {
            for entry in shadow.entries {
                if !entry.mirror().is_some_and(|m| !m.is_empty()) {
                    violations.push(Violation::at(
                        Rule::ShadowMirror,
                        shadow.source,
                        entry.line,
                        "mirror is required in shadow entry",
                    ));
                }
            }
        }

        let averages = PerMetric::from_fn(|metric| {
            let values: Vec<f64> = window
                .iter()
                .map(|e| e.metric_value(metric).unwrap_or(0.0))
                .collect();
            mean(&values)
        });

        Verdict {
            count: window.len(),
            averages,
            shadow_ratio,
            violations,
        }
    }

    fn check_entry(&self, source: &str, entry: &Entry, out: &mut Vec<Violation>) {
        let line = entry.line;

        for metric in Metric::ALL {
            if let Some(message) = self.check_metric(entry.metric(metric), metric) {
                out.push(Violation::at(Rule::Metric(metric), source, line, message));
            }
        }

        if !entry.mirror().is_some_and(|m| !m.is_empty()) {
            out.push(Violation::at(
                Rule::Mirror,
                source,
                line,
                "mirror is required",
            ));
        }

        match entry.get("events") {
            Some(Value::Object(events)) => {
                if !is_non_empty_array(events.get("evidence")) {
                    out.push(Violation::at(
                        Rule::Evidence,
                        source,
                        line,
                        "events.evidence[] must have at least 1 item",
                    ));
                }
            }
            _ => out.push(Violation::at(
                Rule::Evidence,
                source,
                line,
                "events must be an object with evidence[]",
            )),
        }

        let in_crisis = entry
            .metric_value(Metric::Delta)
            .is_some_and(|delta| delta <= CRISIS_DELTA);
        if in_crisis && !entry.get("ritual").is_some_and(is_truthy) {
            out.push(Violation::at(
                Rule::Crisis,
                source,
                line,
                "crisis-rule: ritual is required when ∆≤−2",
            ));
        }

        if let Some(step) = entry.get("agent_step") {
            match step {
                Value::Object(step) => {
                    if step.get("approved").is_some_and(|v| !v.is_boolean()) {
                        out.push(Violation::at(
                            Rule::AgentStep,
                            source,
                            line,
                            "agent_step.approved must be boolean",
                        ));
                    }
                    if step.contains_key("evidence") && !is_non_empty_array(step.get("evidence"))
                    {
                        out.push(Violation::at(
                            Rule::AgentStep,
                            source,
                            line,
                            "agent_step.evidence must be non-empty list",
                        ));
                    }
                }
                _ => out.push(Violation::at(
                    Rule::AgentStep,
                    source,
                    line,
                    "agent_step must be an object",
                )),
            }
        }
    }

    fn check_metric(&self, value: Option<&Value>, metric: Metric) -> Option<String> {
        let (lo, hi) = self.config.bounds.range(metric);
        let key = metric.key();
        match value {
            None => Some(format!("metric {key} missing")),
            Some(v) => match v.as_f64() {
                None => Some(format!("metric {key} must be numeric, got {v}")),
                Some(n) if !self.config.bounds.contains(metric, n) => Some(format!(
                    "metric {key} out of range: {v} not in [{lo}, {hi}]"
                )),
                Some(_) => None,
            },
        }
    }
}

fn is_non_empty_array(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_array)
        .is_some_and(|items| !items.is_empty())
}

/// `numerator / max(1, denominator)` truncated to `RATIO_PRECISION`
/// places in integer arithmetic, so a failing ratio never prints as the
/// threshold it missed.
fn floored_ratio(numerator: usize, denominator: usize) -> String {
    let scale = 10usize.pow(RATIO_PRECISION);
    let scaled = numerator * scale / denominator.max(1);
    format!(
        "{}.{:0width$}",
        scaled / scale,
        scaled % scale,
        width = RATIO_PRECISION as usize
    )
}
