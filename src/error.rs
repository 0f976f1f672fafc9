use std::path::PathBuf;

use random_forest::ForestError;

/// The dataset cannot support the requested model.
///
/// Callers are expected to skip the predictive feature when they see this and
/// keep serving everything else.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// The dataset has no rows.
    #[error("insufficient data: the dataset has no rows")]
    EmptyDataset,
    /// A required column is absent.
    #[error("required column `{0}` is missing")]
    MissingColumn(String),
    /// A feature cell does not hold a number.
    #[error("column `{column}` row {row}: expected a number, found `{found}`")]
    NonNumeric {
        column: String,
        row: usize,
        found: String,
    },
    /// A cell used for training is empty.
    #[error("column `{column}` row {row} has no value")]
    MissingValue { column: String, row: usize },
}

/// A feature vector does not line up with the columns a model was fitted on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("expected {expected} feature values, got {found}")]
    Length { expected: usize, found: usize },
    #[error("feature {position} should be `{expected}`, got `{found}`")]
    Order {
        position: usize,
        expected: String,
        found: String,
    },
}

/// Errors from fitting or querying the risk predictor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictorError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("classifier failure: {0}")]
    Model(#[from] ForestError),
    /// The classifier produced a code the outcome's encoding does not know.
    #[error("predicted code {code} has no label in the `{column}` encoding")]
    UnknownCode { column: String, code: usize },
}

/// Errors raised while reading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    /// A row does not have one value per column.
    #[error("Row {row} has {found} values, expected {expected}")]
    RowArity {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Errors raised while loading the predictor configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}
