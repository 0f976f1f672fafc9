//! Climate, food and health risk prediction.
//!
//! Loads a regional risk [`Dataset`], summarizes it, and fits a pair of
//! random-forest classifiers that predict two categorical risk outcomes from
//! numeric climate features.

pub mod config;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod logging;
pub mod predictor;
pub mod stats;

pub use config::{ForestSettings, InputRange, RiskConfig, RiskSchema};
pub use dataset::{Dataset, Row, Value};
pub use encoding::CategoryEncoding;
pub use error::{ConfigError, DatasetError, PredictorError, SchemaError, ShapeError};
pub use predictor::{FeatureVector, OutcomePrediction, RiskModels, RiskPrediction, RiskPredictor, TrainedModel};
pub use stats::{ColumnSummary, column_range, describe, value_counts};

// Re-export the classifier types callers configure directly.
pub use random_forest::{ForestParams, MaxFeatures, TreeParams};
