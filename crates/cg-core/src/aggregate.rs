//! Rolling journal statistics for CI summaries.
//!
//! Purely additive: every entry contributes whatever it has, nothing is
//! rejected, and an empty journal produces a well-defined zero summary.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::constants::{RATIO_PRECISION, TOP_MODULES};
use crate::record::{Entry, Metric, PerMetric, is_truthy};
use crate::stats::{max, mean, min, population_stdev, ratio, round_to};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSpread {
    pub min: f64,
    pub max: f64,
    pub stdev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub count: usize,
    /// Distinct facet names, sorted.
    pub facets: Vec<String>,
    pub avg: PerMetric<f64>,
    /// `None` when there are no entries.
    pub spread: Option<PerMetric<MetricSpread>>,
    pub shadow_ratio: f64,
    pub veil_trigger_rate: f64,
    /// Most used modules, most frequent first; ties keep first-seen order.
    pub top_modules: Vec<(String, usize)>,
}

/// Summarize `entries` against a separately supplied shadow set.
///
/// Missing or non-numeric metrics count as zero, matching how producers
/// default them.
pub fn aggregate(entries: &[Entry], shadow: &[Entry]) -> AggregateSummary {
    let facets: BTreeSet<&str> = entries.iter().filter_map(Entry::facet).collect();

    let columns = PerMetric::from_fn(|metric| metric_column(entries, metric));
    let avg = PerMetric::from_fn(|metric| mean(columns.get(metric)));
    let spread = (!entries.is_empty()).then(|| {
        PerMetric::from_fn(|metric| {
            let values = columns.get(metric);
            MetricSpread {
                min: min(values).unwrap_or(0.0),
                max: max(values).unwrap_or(0.0),
                stdev: round_to(population_stdev(values), RATIO_PRECISION),
            }
        })
    });

    let veil_hits = entries
        .iter()
        .filter(|e| {
            e.events()
                .and_then(|events| events.get("veil_triggered"))
                .is_some_and(is_truthy)
        })
        .count();
    let veil_trigger_rate = if entries.is_empty() {
        0.0
    } else {
        round_to(veil_hits as f64 / entries.len() as f64, RATIO_PRECISION)
    };

    AggregateSummary {
        count: entries.len(),
        facets: facets.into_iter().map(str::to_string).collect(),
        avg,
        spread,
        shadow_ratio: round_to(ratio(shadow.len(), entries.len()), RATIO_PRECISION),
        veil_trigger_rate,
        top_modules: top_modules(entries, TOP_MODULES),
    }
}

fn metric_column(entries: &[Entry], metric: Metric) -> Vec<f64> {
    entries
        .iter()
        .map(|e| e.metric_value(metric).unwrap_or(0.0))
        .collect()
}

/// Frequency census of module names across all entries.
pub fn top_modules(entries: &[Entry], limit: usize) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for module in entries.iter().flat_map(Entry::modules) {
        match index.get(module) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(module, counts.len());
                counts.push((module, 1));
            }
        }
    }
    // stable sort keeps first-encountered order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(name, n)| (name.to_string(), n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn entry(line: usize, value: Value) -> Entry {
        match value {
            Value::Object(fields) => Entry::new(line, fields),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_empty_is_well_defined() {
        let summary = aggregate(&[], &[]);
        assert_eq!(summary.count, 0);
        assert!(summary.facets.is_empty());
        assert_eq!(summary.avg, PerMetric::default());
        assert!(summary.spread.is_none());
        assert_eq!(summary.shadow_ratio, 0.0);
        assert_eq!(summary.veil_trigger_rate, 0.0);
        assert!(summary.top_modules.is_empty());
    }

    #[test]
    fn test_facets_sorted_and_distinct() {
        let entries = vec![
            entry(1, json!({"facet": "sage"})),
            entry(2, json!({"facet": "kain"})),
            entry(3, json!({"facet": "sage"})),
            entry(4, json!({})),
        ];
        let summary = aggregate(&entries, &[]);
        assert_eq!(summary.facets, vec!["kain", "sage"]);
        assert_eq!(summary.count, 4);
    }

    #[test]
    fn test_averages_default_missing_to_zero() {
        let entries = vec![
            entry(1, json!({"∆": 2, "D": 4, "Ω": -1, "Λ": 100})),
            entry(2, json!({"D": 8, "Λ": "n/a"})),
        ];
        let summary = aggregate(&entries, &[]);
        assert_eq!(summary.avg.delta, 1.0);
        assert_eq!(summary.avg.depth, 6.0);
        assert_eq!(summary.avg.omega, -0.5);
        assert_eq!(summary.avg.lambda, 50.0);
    }

    #[test]
    fn test_spread() {
        let entries = vec![
            entry(1, json!({"D": 2})),
            entry(2, json!({"D": 4})),
            entry(3, json!({"D": 9})),
        ];
        let spread = aggregate(&entries, &[]).spread.unwrap();
        assert_eq!(spread.depth.min, 2.0);
        assert_eq!(spread.depth.max, 9.0);
        assert_eq!(spread.depth.stdev, 2.944);
        assert_eq!(spread.delta.stdev, 0.0);
    }

    #[test]
    fn test_shadow_ratio_and_veil_rate() {
        let entries = vec![
            entry(1, json!({"events": {"veil_triggered": true}})),
            entry(2, json!({"events": {"veil_triggered": false}})),
            entry(3, json!({"events": {}})),
        ];
        let shadow = vec![entry(1, json!({"mirror": "a"}))];
        let summary = aggregate(&entries, &shadow);
        assert_eq!(summary.shadow_ratio, 0.333);
        assert_eq!(summary.veil_trigger_rate, 0.333);
    }

    #[test]
    fn test_top_modules_ties_first_seen() {
        let entries = vec![
            entry(1, json!({"modules": ["veil", "rag", "cot"]})),
            entry(2, json!({"modules": ["rag", "atelier", "pulse", "echo"]})),
            entry(3, json!({"modules": ["cot", "mirror"]})),
        ];
        let top = top_modules(&entries, 5);
        assert_eq!(
            top,
            vec![
                ("rag".to_string(), 2),
                ("cot".to_string(), 2),
                ("veil".to_string(), 1),
                ("atelier".to_string(), 1),
                ("pulse".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_top_modules_counts_repeats_within_entry() {
        let entries = vec![entry(1, json!({"modules": ["rag", "rag", 3, "veil"]}))];
        assert_eq!(
            top_modules(&entries, 5),
            vec![("rag".to_string(), 2), ("veil".to_string(), 1)]
        );
    }
}
