//! Two-outcome risk classifier.
//!
//! [`RiskPredictor::fit`] encodes each outcome column with a
//! [`CategoryEncoding`], trains one random forest per outcome on the shared
//! feature columns, and returns [`RiskModels`]. [`RiskModels::predict`] maps a
//! single [`FeatureVector`] back to a pair of outcome labels.

use geomind_helpers::{DataPoint, argmax};
use ndarray::{Array1, ArrayView1};
use random_forest::{ForestError, ForestParams, RandomForest};
use tracing::info;

use crate::config::RiskSchema;
use crate::dataset::{Dataset, Value};
use crate::encoding::CategoryEncoding;
use crate::error::{PredictorError, SchemaError, ShapeError};

/// Numeric inputs for one prediction, in fit-time feature order.
///
/// A vector built with [`FeatureVector::named`] also carries its column
/// names, so a reordered vector is rejected instead of silently misread.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Array1<f64>,
    columns: Option<Vec<String>>,
}

impl FeatureVector {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: Array1::from(values.into()),
            columns: None,
        }
    }

    /// Builds a vector from `(column, value)` pairs.
    pub fn named<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<f64>) =
            pairs.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self {
            values: Array1::from(values),
            columns: Some(columns),
        }
    }

    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check_shape(&self, expected: &[String]) -> Result<(), ShapeError> {
        if self.len() != expected.len() {
            return Err(ShapeError::Length {
                expected: expected.len(),
                found: self.len(),
            });
        }
        if let Some(columns) = &self.columns {
            if let Some((position, (want, got))) = expected
                .iter()
                .zip(columns)
                .enumerate()
                .find(|(_, (want, got))| want != got)
            {
                return Err(ShapeError::Order {
                    position,
                    expected: want.clone(),
                    found: got.clone(),
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl<const N: usize> From<[f64; N]> for FeatureVector {
    fn from(values: [f64; N]) -> Self {
        Self::new(values.to_vec())
    }
}

/// The fitted classifier for one outcome column.
///
/// Immutable once built; owns the encoding needed to turn predicted codes
/// back into labels.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    column: String,
    feature_columns: Vec<String>,
    encoding: CategoryEncoding,
    forest: RandomForest<usize, f64>,
}

impl TrainedModel {
    /// The outcome column this model predicts.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn encoding(&self) -> &CategoryEncoding {
        &self.encoding
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Seed the forest was trained with.
    pub fn seed(&self) -> u64 {
        self.forest.seed()
    }

    /// Predicted integer code for `features`.
    pub fn predict_code(&self, features: &FeatureVector) -> Result<usize, PredictorError> {
        features.check_shape(&self.feature_columns)?;
        Ok(self.forest.predict(features.values())?)
    }

    /// Predicted label for `features`.
    pub fn predict(&self, features: &FeatureVector) -> Result<&str, PredictorError> {
        let code = self.predict_code(features)?;
        self.decode(code)
    }

    /// Probability of every label, in code order.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<(&str, f64)>, PredictorError> {
        features.check_shape(&self.feature_columns)?;
        let proba = self.forest.predict_proba(features.values())?;
        self.forest
            .classes()
            .iter()
            .zip(proba.iter())
            .map(|(&code, &p)| Ok((self.decode(code)?, p)))
            .collect()
    }

    /// Impurity-based importance of each feature column.
    pub fn feature_importances(&self) -> Vec<(&str, f64)> {
        self.feature_columns
            .iter()
            .map(String::as_str)
            .zip(self.forest.feature_importances().to_vec())
            .collect()
    }

    fn decode(&self, code: usize) -> Result<&str, PredictorError> {
        self.encoding
            .decode(code)
            .ok_or_else(|| PredictorError::UnknownCode {
                column: self.column.clone(),
                code,
            })
    }
}

/// Predicted label for one outcome column.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomePrediction {
    pub column: String,
    pub label: String,
    /// Share of the ensemble's probability mass behind `label`.
    pub confidence: f64,
}

/// Result of one prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskPrediction {
    pub first: OutcomePrediction,
    pub second: OutcomePrediction,
}

impl RiskPrediction {
    /// `(predicted first outcome, predicted second outcome)`.
    pub fn labels(&self) -> (&str, &str) {
        (&self.first.label, &self.second.label)
    }
}

/// The pair of models produced by one fit.
#[derive(Debug, Clone)]
pub struct RiskModels {
    models: [TrainedModel; 2],
    feature_columns: Vec<String>,
}

impl RiskModels {
    pub fn models(&self) -> &[TrainedModel; 2] {
        &self.models
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Looks up the model for an outcome column.
    pub fn model(&self, column: &str) -> Option<&TrainedModel> {
        self.models.iter().find(|m| m.column == column)
    }

    /// Predicts both outcomes for `features`.
    ///
    /// # Errors
    ///
    /// Returns `PredictorError::Shape` if `features` does not match the
    /// feature columns the models were fitted on.
    pub fn predict(&self, features: &FeatureVector) -> Result<RiskPrediction, PredictorError> {
        features.check_shape(&self.feature_columns)?;
        let [a, b] = &self.models;
        Ok(RiskPrediction {
            first: predict_outcome(a, features)?,
            second: predict_outcome(b, features)?,
        })
    }
}

fn predict_outcome(model: &TrainedModel, features: &FeatureVector) -> Result<OutcomePrediction, PredictorError> {
    let proba = model.forest.predict_proba(features.values())?;
    let best = argmax(proba.view()).ok_or(ForestError::NoTrees)?;
    let code = model.forest.classes()[best];
    let confidence = proba[best];
    Ok(OutcomePrediction {
        column: model.column.clone(),
        label: model.decode(code)?.to_string(),
        confidence,
    })
}

/// Trains the two outcome classifiers.
#[derive(Debug, Clone, Default)]
pub struct RiskPredictor {
    params: ForestParams,
}

impl RiskPredictor {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Checks that `dataset` has every column `schema` names and at least one row.
    pub fn check_schema(dataset: &Dataset, schema: &RiskSchema) -> Result<(), SchemaError> {
        if let Some(missing) = schema.required_columns().find(|c| !dataset.has_column(c)) {
            return Err(SchemaError::MissingColumn(missing.to_string()));
        }
        if dataset.is_empty() {
            return Err(SchemaError::EmptyDataset);
        }
        Ok(())
    }

    /// Whether the predictor can be fitted on `dataset`.
    pub fn is_available(dataset: &Dataset, schema: &RiskSchema) -> bool {
        Self::check_schema(dataset, schema).is_ok()
    }

    /// Fits one classifier per outcome column of `schema`.
    ///
    /// The dataset is only read. Outcome labels are encoded in sorted order,
    /// so fitting the same dataset twice yields identical encodings.
    ///
    /// # Errors
    ///
    /// Returns `PredictorError::Schema` when a required column is missing, the
    /// dataset is empty, a feature cell is not numeric, or a used cell is
    /// empty.
    pub fn fit(&self, dataset: &Dataset, schema: &RiskSchema) -> Result<RiskModels, PredictorError> {
        Self::check_schema(dataset, schema)?;
        let features = feature_matrix(dataset, &schema.feature_columns)?;

        let [a, b] = &schema.outcome_columns;
        let models = [
            self.fit_outcome(dataset, a, &features, schema)?,
            self.fit_outcome(dataset, b, &features, schema)?,
        ];
        info!(
            rows = dataset.n_rows(),
            first = %models[0].column,
            first_classes = models[0].encoding.len(),
            second = %models[1].column,
            second_classes = models[1].encoding.len(),
            "risk models fitted"
        );

        Ok(RiskModels {
            models,
            feature_columns: schema.feature_columns.clone(),
        })
    }

    fn fit_outcome(
        &self,
        dataset: &Dataset,
        column: &str,
        features: &[Array1<f64>],
        schema: &RiskSchema,
    ) -> Result<TrainedModel, PredictorError> {
        let labels = outcome_labels(dataset, column)?;
        let (encoding, codes) = CategoryEncoding::fit_transform(&labels);
        let data: Vec<DataPoint<usize, f64>> = features
            .iter()
            .zip(codes)
            .map(|(x, code)| DataPoint::new(x.clone(), code))
            .collect();
        let forest = RandomForest::fit(&data, &self.params)?;

        Ok(TrainedModel {
            column: column.to_string(),
            feature_columns: schema.feature_columns.clone(),
            encoding,
            forest,
        })
    }
}

/// One feature row per dataset row, columns in `feature_columns` order.
fn feature_matrix(dataset: &Dataset, feature_columns: &[String]) -> Result<Vec<Array1<f64>>, SchemaError> {
    let indices = feature_columns
        .iter()
        .map(|name| {
            dataset
                .column_index(name)
                .ok_or_else(|| SchemaError::MissingColumn(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    dataset
        .rows()
        .enumerate()
        .map(|(row, cells)| {
            indices
                .iter()
                .zip(feature_columns)
                .map(|(&idx, name)| match &cells.values()[idx] {
                    Value::Number(n) if n.is_finite() => Ok(*n),
                    Value::Missing => Err(SchemaError::MissingValue {
                        column: name.clone(),
                        row,
                    }),
                    other => Err(SchemaError::NonNumeric {
                        column: name.clone(),
                        row,
                        found: other.to_string(),
                    }),
                })
                .collect::<Result<Array1<f64>, _>>()
        })
        .collect()
}

fn outcome_labels(dataset: &Dataset, column: &str) -> Result<Vec<String>, SchemaError> {
    let cells = dataset
        .column(column)
        .ok_or_else(|| SchemaError::MissingColumn(column.to_string()))?;
    cells
        .enumerate()
        .map(|(row, value)| {
            value.as_label().ok_or_else(|| SchemaError::MissingValue {
                column: column.to_string(),
                row,
            })
        })
        .collect()
}
