//! Optional TOML configuration for the gate.
//!
//! Every key is optional; anything omitted keeps the built-in default.
//!
//! ```toml
//! [validate]
//! window = 50
//! min_shadow_ratio = 0.2
//! require_shadow_coverage = true
//!
//! [validate.bounds]
//! lambda = [0, 9999]
//!
//! [audit]
//! sample_size = 100
//! threshold = 0.35
//! seed = 13
//! preview_length = 120
//! mode = "f1"
//! ```

use std::fs;
use std::path::Path;

use cg_core::{AuditConfig, MetricBounds, ScoringMode, ValidatorConfig};
use serde::Deserialize;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    pub validate: ValidateSection,
    pub audit: AuditSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidateSection {
    pub window: usize,
    pub min_shadow_ratio: f64,
    pub require_shadow_coverage: bool,
    pub bounds: MetricBounds,
}

impl Default for ValidateSection {
    fn default() -> Self {
        let defaults = ValidatorConfig::default();
        Self {
            window: defaults.window,
            min_shadow_ratio: defaults.min_shadow_ratio,
            require_shadow_coverage: defaults.require_shadow_coverage,
            bounds: defaults.bounds,
        }
    }
}

impl ValidateSection {
    pub fn to_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            bounds: self.bounds,
            window: self.window,
            min_shadow_ratio: self.min_shadow_ratio,
            require_shadow_coverage: self.require_shadow_coverage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSection {
    pub sample_size: usize,
    pub threshold: f64,
    pub seed: u64,
    pub preview_length: usize,
    pub mode: ScoringMode,
}

impl Default for AuditSection {
    fn default() -> Self {
        let defaults = AuditConfig::default();
        Self {
            sample_size: defaults.sample_size,
            threshold: defaults.threshold,
            seed: defaults.seed,
            preview_length: defaults.preview_length,
            mode: defaults.mode,
        }
    }
}

impl AuditSection {
    pub fn to_config(&self) -> AuditConfig {
        AuditConfig {
            sample_size: self.sample_size,
            threshold: self.threshold,
            seed: self.seed,
            preview_length: self.preview_length,
            mode: self.mode,
        }
    }
}

impl GateConfig {
    /// Load and check a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        let config = Self::parse(path, &text)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, otherwise the defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse TOML text; `path` only labels errors.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| StoreError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config
            .validate
            .to_config()
            .validate()
            .and_then(|_| config.audit.to_config().validate())
            .map_err(|e| StoreError::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("cg.toml")
    }

    #[test]
    fn test_empty_file_is_defaults() {
        let config = GateConfig::parse(&path(), "").unwrap();
        assert_eq!(config, GateConfig::default());
        assert_eq!(config.validate.to_config(), ValidatorConfig::default());
        assert_eq!(config.audit.to_config(), AuditConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let text = r#"
            [validate]
            window = 0
            require_shadow_coverage = false

            [validate.bounds]
            lambda = [0, 500]

            [audit]
            mode = "dice"
            seed = 7
        "#;
        let config = GateConfig::parse(&path(), text).unwrap();
        let validator = config.validate.to_config();
        assert_eq!(validator.window, 0);
        assert!(!validator.require_shadow_coverage);
        assert_eq!(validator.bounds.lambda, [0, 500]);
        assert_eq!(validator.bounds.delta, [-3, 3]);
        let audit = config.audit.to_config();
        assert_eq!(audit.mode, ScoringMode::Dice);
        assert_eq!(audit.seed, 7);
        assert_eq!(audit.threshold, 0.35);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = GateConfig::parse(&path(), "[validate]\nwindw = 3\n").unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
    }

    #[test]
    fn test_misspelled_bounds_key_rejected() {
        let err = GateConfig::parse(&path(), "[validate.bounds]\nlamda = [0, 5]\n").unwrap_err();
        assert!(matches!(err, StoreError::Config { .. }));
        assert!(err.to_string().contains("lamda"), "{err}");
    }

    #[test]
    fn test_semantic_checks_applied() {
        let err = GateConfig::parse(&path(), "[audit]\nthreshold = 2.0\n").unwrap_err();
        assert!(err.to_string().contains("threshold"));

        let err =
            GateConfig::parse(&path(), "[validate.bounds]\ndepth = [9, 0]\n").unwrap_err();
        assert!(err.to_string().contains("inverted"));
    }

    #[test]
    fn test_load_optional_none() {
        assert_eq!(
            GateConfig::load_optional(None).unwrap(),
            GateConfig::default()
        );
    }
}
