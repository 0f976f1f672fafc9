//! Predictor configuration.
//!
//! Loaded from a TOML file; every section is optional and falls back to the
//! defaults of the climate-risk dashboard.

use std::path::Path;

use random_forest::{ForestParams, MaxFeatures, TreeParams};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::ConfigError;
use crate::stats::column_range;

pub const CONFIG_FILE_NAME: &str = "geomind.toml";

/// Which columns the predictor reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSchema {
    /// The two categorical columns to predict.
    pub outcome_columns: [String; 2],
    /// Numeric inputs, in the order feature vectors must follow.
    pub feature_columns: Vec<String>,
}

impl Default for RiskSchema {
    fn default() -> Self {
        Self {
            outcome_columns: ["Food_Risk".to_string(), "Health_Risk".to_string()],
            feature_columns: vec![
                "Temperature".to_string(),
                "Rainfall".to_string(),
                "Climate_Score".to_string(),
            ],
        }
    }
}

impl RiskSchema {
    pub fn new<S: Into<String>>(outcomes: [S; 2], features: impl IntoIterator<Item = S>) -> Self {
        let [a, b] = outcomes;
        Self {
            outcome_columns: [a.into(), b.into()],
            feature_columns: features.into_iter().map(Into::into).collect(),
        }
    }

    /// Every column the predictor needs, outcomes first.
    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.outcome_columns
            .iter()
            .chain(self.feature_columns.iter())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeaturesSetting {
    All,
    Sqrt,
    Log2,
    Count(usize),
}

impl From<MaxFeaturesSetting> for MaxFeatures {
    fn from(setting: MaxFeaturesSetting) -> Self {
        match setting {
            MaxFeaturesSetting::All => MaxFeatures::All,
            MaxFeaturesSetting::Sqrt => MaxFeatures::Sqrt,
            MaxFeaturesSetting::Log2 => MaxFeatures::Log2,
            MaxFeaturesSetting::Count(k) => MaxFeatures::Count(k),
        }
    }
}

/// Random forest hyperparameters as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestSettings {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeaturesSetting,
    pub bootstrap: bool,
    /// Fixed seed for reproducible training; omit for a fresh seed per fit.
    pub seed: Option<u64>,
}

impl Default for ForestSettings {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeaturesSetting::Sqrt,
            bootstrap: true,
            seed: Some(42),
        }
    }
}

impl ForestSettings {
    pub fn to_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.n_trees,
            tree: TreeParams {
                max_depth: self.max_depth,
                min_samples_split: self.min_samples_split,
                min_samples_leaf: self.min_samples_leaf,
                max_features: self.max_features.into(),
            },
            bootstrap: self.bootstrap,
            seed: self.seed,
        }
    }
}

/// Slider range for one feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRange {
    pub column: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl InputRange {
    pub fn new(column: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            column: column.to_string(),
            min,
            max,
            default,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Range spanning the observed values of `column`, defaulting to the
    /// midpoint. A constant column gets a unit-wide range.
    pub fn observed(dataset: &Dataset, column: &str) -> Option<Self> {
        let (min, max) = column_range(dataset, column)?;
        let max = if max > min { max } else { min + 1.0 };
        Some(Self::new(column, min, max, min + (max - min) / 2.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub schema: RiskSchema,
    pub forest: ForestSettings,
    pub inputs: Vec<InputRange>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            schema: RiskSchema::default(),
            forest: ForestSettings::default(),
            inputs: vec![
                InputRange::new("Temperature", 20.0, 45.0, 30.0),
                InputRange::new("Rainfall", 50.0, 300.0, 150.0),
                InputRange::new("Climate_Score", 0.0, 1.0, 0.5),
            ],
        }
    }
}

impl RiskConfig {
    /// Parses a TOML document. Call [`RiskConfig::validate`] afterwards.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn input_range(&self, column: &str) -> Option<&InputRange> {
        self.inputs.iter().find(|range| range.column == column)
    }

    /// One input range per feature column, in schema order.
    ///
    /// Configured ranges win; otherwise the range observed in `dataset` is
    /// used, and `0..=1` when the column has no numbers at all.
    pub fn feature_inputs(&self, dataset: &Dataset) -> Vec<InputRange> {
        self.schema
            .feature_columns
            .iter()
            .map(|column| {
                self.input_range(column)
                    .cloned()
                    .or_else(|| InputRange::observed(dataset, column))
                    .unwrap_or_else(|| InputRange::new(column, 0.0, 1.0, 0.5))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let [a, b] = &self.schema.outcome_columns;
        if a == b {
            return Err(ConfigError::Invalid(format!(
                "outcome columns must differ, both are `{a}`"
            )));
        }
        if self.schema.feature_columns.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one feature column is required".into(),
            ));
        }
        if self.forest.n_trees == 0 {
            return Err(ConfigError::Invalid("n_trees must be at least 1".into()));
        }
        self.forest
            .to_params()
            .tree
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        for range in &self.inputs {
            if !(range.min < range.max) {
                return Err(ConfigError::Invalid(format!(
                    "input `{}` has min {} not below max {}",
                    range.column, range.min, range.max
                )));
            }
            if !(range.min..=range.max).contains(&range.default) {
                return Err(ConfigError::Invalid(format!(
                    "input `{}` default {} is outside {}..={}",
                    range.column, range.default, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

/// Loads the configuration at `path`, falling back to defaults when the file
/// does not exist.
pub fn load(path: &Path) -> Result<RiskConfig, ConfigError> {
    if !path.exists() {
        return Ok(RiskConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = RiskConfig::from_toml_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}
