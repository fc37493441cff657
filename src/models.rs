use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// One row of the marks table. Scores are parallel to the configured
/// subject list and never mutated after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub name: String,
    pub scores: Vec<f64>,
}

/// Classification cutoffs. Totals use strict comparisons against
/// `total_high`/`total_low`; individual subject marks against
/// `subject_high`/`subject_low`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub total_high: f64,
    pub total_low: f64,
    pub subject_high: f64,
    pub subject_low: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            total_high: 360.0,
            total_low: 160.0,
            subject_high: 90.0,
            subject_low: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartDims {
    pub width: u32,
    pub height: u32,
    /// Upper bound of the stacked chart's y axis.
    pub max_total: f64,
}

impl Default for ChartDims {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 600,
            max_total: 400.0,
        }
    }
}

/// The single configuration struct passed explicitly through the pipeline.
/// Subject order defines the index correspondence between each student's
/// scores and subject identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub subjects: Vec<String>,
    pub thresholds: Thresholds,
    pub chart: ChartDims,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            subjects: ["ADMS", "AOS", "A&CD", "C&NS"]
                .into_iter()
                .map(String::from)
                .collect(),
            thresholds: Thresholds::default(),
            chart: ChartDims::default(),
        }
    }
}

impl ReportConfig {
    /// Loads a config from a JSON file; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ReportError::InputRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: ReportConfig =
            serde_json::from_str(&raw).map_err(|e| ReportError::InputRead {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// An empty subject list would make averages divide by zero, so it is
    /// rejected here rather than handled downstream.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.subjects.is_empty() {
            return Err(ReportError::InvalidConfig(
                "subject list must not be empty".to_string(),
            ));
        }
        if self.thresholds.total_low >= self.thresholds.total_high {
            return Err(ReportError::InvalidConfig(format!(
                "total_low ({}) must be below total_high ({})",
                self.thresholds.total_low, self.thresholds.total_high
            )));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(ReportError::InvalidConfig(
                "chart dimensions must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ReportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.subjects.len(), 4);
        assert_eq!(config.thresholds.total_high, 360.0);
        assert_eq!(config.thresholds.total_low, 160.0);
    }

    #[test]
    fn empty_subjects_rejected() {
        let config = ReportConfig {
            subjects: vec![],
            ..ReportConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let mut config = ReportConfig::default();
        config.thresholds.total_low = 380.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ReportConfig =
            serde_json::from_str(r#"{"thresholds": {"total_high": 300.0}}"#).unwrap();
        assert_eq!(config.thresholds.total_high, 300.0);
        assert_eq!(config.thresholds.total_low, 160.0);
        assert_eq!(config.subjects.len(), 4);
        assert_eq!(config.chart.width, 1400);
    }
}
