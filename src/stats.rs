//! Descriptive statistics for the dataset preview.

use std::cmp::Ordering;
use std::collections::HashMap;

use ndarray::Array1;
use ndarray_stats::QuantileExt;

use crate::dataset::{Dataset, Value};
use crate::error::SchemaError;

/// Summary of one numeric column, in the spirit of a dataframe `describe()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN for a single value.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summaries of every numeric column, in header order.
///
/// A column counts as numeric when all of its present cells are numbers and
/// at least one cell is present. Missing cells are skipped.
pub fn describe(dataset: &Dataset) -> Vec<ColumnSummary> {
    dataset
        .columns()
        .iter()
        .filter_map(|name| summarize(name, numeric_values(dataset, name)?))
        .collect()
}

/// Frequency of each label in `column`, most frequent first, ties by label.
pub fn value_counts(dataset: &Dataset, column: &str) -> Result<Vec<(String, usize)>, SchemaError> {
    let cells = dataset
        .column(column)
        .ok_or_else(|| SchemaError::MissingColumn(column.to_string()))?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in cells.filter_map(Value::as_label) {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(counts)
}

/// Observed `(min, max)` of a numeric column.
pub fn column_range(dataset: &Dataset, column: &str) -> Option<(f64, f64)> {
    let values = Array1::from(numeric_values(dataset, column)?);
    let min = *values.min().ok()?;
    let max = *values.max().ok()?;
    Some((min, max))
}

fn numeric_values(dataset: &Dataset, column: &str) -> Option<Vec<f64>> {
    let mut values = Vec::new();
    for cell in dataset.column(column)? {
        match cell {
            Value::Number(n) if n.is_finite() => values.push(*n),
            Value::Number(_) | Value::Missing => {}
            Value::Text(_) => return None,
        }
    }
    (!values.is_empty()).then_some(values)
}

fn summarize(column: &str, mut values: Vec<f64>) -> Option<ColumnSummary> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let array = Array1::from(values);
    let count = array.len();
    let mean = array.mean()?;
    let std = if count > 1 { array.std(1.0) } else { f64::NAN };
    let sorted = array.as_slice()?;

    Some(ColumnSummary {
        column: column.to_string(),
        count,
        mean,
        std,
        min: *array.min().ok()?,
        q25: quantile(sorted, 0.25),
        median: quantile(sorted, 0.5),
        q75: quantile(sorted, 0.75),
        max: *array.max().ok()?,
    })
}

/// Linear-interpolated quantile of sorted, non-empty data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn dataset() -> Dataset {
        let csv = "\
Region,Food_Risk,Temperature,Rainfall
A,High,30,120
B,Low,25,200
C,High,35,
D,Medium,20,80
";
        Dataset::from_csv_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_describe_numeric_columns_only() {
        let summaries = describe(&dataset());
        let names: Vec<&str> = summaries.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, ["Temperature", "Rainfall"]);

        let temp = &summaries[0];
        assert_eq!(temp.count, 4);
        assert_abs_diff_eq!(temp.mean, 27.5);
        assert_abs_diff_eq!(temp.std, 6.454972243679028, epsilon = 1e-12);
        assert_abs_diff_eq!(temp.min, 20.0);
        assert_abs_diff_eq!(temp.q25, 23.75);
        assert_abs_diff_eq!(temp.median, 27.5);
        assert_abs_diff_eq!(temp.q75, 31.25);
        assert_abs_diff_eq!(temp.max, 35.0);

        let rain = &summaries[1];
        assert_eq!(rain.count, 3);
        assert_abs_diff_eq!(rain.median, 120.0);
    }

    #[test]
    fn test_single_value_std_is_nan() {
        let data = Dataset::from_csv_reader("x\n4\n".as_bytes()).unwrap();
        let summaries = describe(&data);
        assert_eq!(summaries[0].count, 1);
        assert!(summaries[0].std.is_nan());
        assert_abs_diff_eq!(summaries[0].q75, 4.0);
    }

    #[test]
    fn test_non_finite_cells_are_skipped() {
        let data = Dataset::from_csv_reader("Temperature,Climate_Score\n30,0.5\ninf,NAN\n20,0.7\n".as_bytes()).unwrap();
        let summaries = describe(&data);
        let names: Vec<&str> = summaries.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(names, ["Temperature", "Climate_Score"]);
        assert_abs_diff_eq!(summaries[0].mean, 25.0);
        assert_eq!(summaries[1].count, 2);

        let built = Dataset::from_records(vec![
            vec![("x", Value::from(1.0))],
            vec![("x", Value::from(f64::INFINITY))],
        ]);
        assert_eq!(column_range(&built, "x"), Some((1.0, 1.0)));
    }

    #[test]
    fn test_value_counts() {
        let counts = value_counts(&dataset(), "Food_Risk").unwrap();
        assert_eq!(
            counts,
            vec![
                ("High".to_string(), 2),
                ("Low".to_string(), 1),
                ("Medium".to_string(), 1)
            ]
        );
        assert_eq!(
            value_counts(&dataset(), "Health_Risk").unwrap_err(),
            SchemaError::MissingColumn("Health_Risk".into())
        );
    }

    #[test]
    fn test_column_range() {
        let data = dataset();
        assert_eq!(column_range(&data, "Rainfall"), Some((80.0, 200.0)));
        assert_eq!(column_range(&data, "Region"), None);
        assert_eq!(column_range(&data, "Latitude"), None);
    }
}
