//! Sequence similarity via longest common subsequence.
//!
//! Both scoring conventions found in the audit tooling are kept as named
//! modes. For non-empty inputs they are algebraically equal
//! (`2rp/(r+p)` reduces to `2L/(|A|+|B|)`), but reports record which
//! convention produced a score, so a run picks one and applies it uniformly.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::tokenizer::tokenize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// ROUGE-L F1: harmonic mean of `L/|A|` and `L/|B|`.
    #[default]
    F1,
    /// Dice coefficient over the LCS: `2L / (|A| + |B|)`.
    Dice,
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMode::F1 => write!(f, "f1"),
            ScoringMode::Dice => write!(f, "dice"),
        }
    }
}

impl FromStr for ScoringMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f1" | "rouge-l" | "rouge_l" => Ok(ScoringMode::F1),
            "dice" => Ok(ScoringMode::Dice),
            other => Err(CoreError::Config(format!(
                "unknown scoring mode '{other}' (expected f1 or dice)"
            ))),
        }
    }
}

/// LCS length with a single rolling row: O(|a|·|b|) time, O(|b|) space.
pub fn lcs_length<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut row = vec![0usize; b.len() + 1];
    for x in a {
        // diag holds row[j - 1] from the previous pass
        let mut diag = 0;
        for (j, y) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if x == y {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[b.len()]
}

/// Score two token sequences in `[0, 1]`.
pub fn score_tokens<T: PartialEq>(a: &[T], b: &[T], mode: ScoringMode) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let lcs = lcs_length(a, b) as f64;
    match mode {
        ScoringMode::F1 => {
            if a.is_empty() || b.is_empty() {
                return 0.0;
            }
            let recall = lcs / a.len() as f64;
            let precision = lcs / b.len() as f64;
            if recall == 0.0 || precision == 0.0 {
                return 0.0;
            }
            2.0 * recall * precision / (recall + precision)
        }
        ScoringMode::Dice => 2.0 * lcs / (a.len() + b.len()) as f64,
    }
}

/// Tokenize both texts and score them.
pub fn score_text(a: &str, b: &str, mode: ScoringMode) -> f64 {
    score_tokens(&tokenize(a), &tokenize(b), mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        tokenize(s)
    }

    #[test]
    fn test_lcs_classic() {
        let a: Vec<char> = "ABCBDAB".chars().collect();
        let b: Vec<char> = "BDCABA".chars().collect();
        assert_eq!(lcs_length(&a, &b), 4);
    }

    #[test]
    fn test_lcs_empty() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(lcs_length(&empty, &toks("a b")), 0);
        assert_eq!(lcs_length(&toks("a b"), &empty), 0);
    }

    #[test]
    fn test_lcs_prefix() {
        assert_eq!(
            lcs_length(&toks("the cat sat"), &toks("the cat sat on the mat")),
            3
        );
    }

    #[test]
    fn test_f1_partial_overlap() {
        let score = score_text("the cat sat", "the cat sat on the mat", ScoringMode::F1);
        assert!((score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_dice_partial_overlap() {
        let score = score_text("the cat sat", "the cat sat on the mat", ScoringMode::Dice);
        assert!((score - 6.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_modes_agree_on_uneven_lengths() {
        // L = 1, |A| = 1, |B| = 4
        let f1 = score_text("alpha", "alpha beta gamma delta", ScoringMode::F1);
        let dice = score_text("alpha", "alpha beta gamma delta", ScoringMode::Dice);
        assert!((f1 - 0.4).abs() < 1e-12);
        assert!((dice - 0.4).abs() < 1e-12);

        // L = 2, |A| = 2, |B| = 3 with a gap
        let f1 = score_text("a c", "a b c", ScoringMode::F1);
        let dice = score_text("a c", "a b c", ScoringMode::Dice);
        assert!((f1 - 0.8).abs() < 1e-12);
        assert!((dice - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_identical_scores_one() {
        for mode in [ScoringMode::F1, ScoringMode::Dice] {
            assert_eq!(score_text("Quantum flux", "quantum FLUX", mode), 1.0);
        }
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        for mode in [ScoringMode::F1, ScoringMode::Dice] {
            assert_eq!(score_text("", "", mode), 0.0);
            assert_eq!(score_text("a b", "", mode), 0.0);
            assert_eq!(score_text("", "a b", mode), 0.0);
        }
    }

    #[test]
    fn test_disjoint_scores_zero() {
        for mode in [ScoringMode::F1, ScoringMode::Dice] {
            assert_eq!(
                score_text("quantum flux engine", "completely unrelated text block", mode),
                0.0
            );
        }
    }

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!("F1".parse::<ScoringMode>().unwrap(), ScoringMode::F1);
        assert_eq!("rouge-l".parse::<ScoringMode>().unwrap(), ScoringMode::F1);
        assert_eq!("dice".parse::<ScoringMode>().unwrap(), ScoringMode::Dice);
        assert!("cosine".parse::<ScoringMode>().is_err());
        assert_eq!(ScoringMode::Dice.to_string(), "dice");
        assert_eq!(ScoringMode::default(), ScoringMode::F1);
    }
}
