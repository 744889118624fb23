//! Classifier blend configuration.
//!
//! Defaults live in `vault_core::defaults`; each value can be overridden with
//! a `CLASSIFIER_*` environment variable.

use serde::{Deserialize, Serialize};
use tracing::debug;

use vault_core::defaults::{
    CLASSIFIER_FEATURE_JITTER, CLASSIFIER_FEATURE_THRESHOLD, CLASSIFIER_FEATURE_WEIGHT,
    CLASSIFIER_KEYWORD_WEIGHT,
};
use vault_core::{env_parse, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Weight of the keyword scorer's confidence in the blend.
    pub keyword_weight: f64,
    /// Weight of the feature scorer's confidence in the blend.
    pub feature_weight: f64,
    /// Feature confidence above which the feature category overrides the
    /// keyword category.
    pub feature_threshold: f64,
    /// Half-width of the heuristic scorer's uniform noise.
    pub feature_jitter: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            keyword_weight: CLASSIFIER_KEYWORD_WEIGHT,
            feature_weight: CLASSIFIER_FEATURE_WEIGHT,
            feature_threshold: CLASSIFIER_FEATURE_THRESHOLD,
            feature_jitter: CLASSIFIER_FEATURE_JITTER,
        }
    }
}

impl ClassifierConfig {
    /// Defaults overridden by `CLASSIFIER_KEYWORD_WEIGHT`,
    /// `CLASSIFIER_FEATURE_WEIGHT`, `CLASSIFIER_FEATURE_THRESHOLD` and
    /// `CLASSIFIER_FEATURE_JITTER`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(v) = env_parse("CLASSIFIER_KEYWORD_WEIGHT") {
            config.keyword_weight = v;
        }
        if let Some(v) = env_parse("CLASSIFIER_FEATURE_WEIGHT") {
            config.feature_weight = v;
        }
        if let Some(v) = env_parse("CLASSIFIER_FEATURE_THRESHOLD") {
            config.feature_threshold = v;
        }
        if let Some(v) = env_parse("CLASSIFIER_FEATURE_JITTER") {
            config.feature_jitter = v;
        }
        config.validate()?;
        debug!(
            subsystem = "inference",
            keyword_weight = config.keyword_weight,
            feature_weight = config.feature_weight,
            feature_threshold = config.feature_threshold,
            feature_jitter = config.feature_jitter,
            "Classifier config loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let unit = 0.0..=1.0;
        for (name, value) in [
            ("keyword_weight", self.keyword_weight),
            ("feature_weight", self.feature_weight),
            ("feature_threshold", self.feature_threshold),
            ("feature_jitter", self.feature_jitter),
        ] {
            if !unit.contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.keyword_weight + self.feature_weight == 0.0 {
            return Err(Error::Config(
                "keyword_weight and feature_weight cannot both be zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ClassifierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.keyword_weight, 0.4);
        assert_eq!(config.feature_weight, 0.6);
        assert_eq!(config.feature_threshold, 0.7);
    }

    #[test]
    fn out_of_range_rejected() {
        let config = ClassifierConfig {
            feature_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn zero_weights_rejected() {
        let config = ClassifierConfig {
            keyword_weight: 0.0,
            feature_weight: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
