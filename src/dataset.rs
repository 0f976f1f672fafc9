//! In-memory tabular data.
//!
//! A [`Dataset`] is an ordered list of rows sharing one header. Cells are
//! typed loosely as numbers, text or missing, the way a CSV reader sees them.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::DatasetError;

/// Cell spellings read as a missing value.
const MISSING_MARKERS: [&str; 6] = ["", "NA", "N/A", "NaN", "nan", "null"];

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Interprets a raw CSV cell. Non-finite spellings such as `inf` or
    /// `NAN` are read as missing.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if MISSING_MARKERS.contains(&raw) {
            return Value::Missing;
        }
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            Ok(_) => Value::Missing,
            Err(_) => Value::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The cell as a category label; numbers are rendered in their shortest form.
    pub fn as_label(&self) -> Option<String> {
        match self {
            Value::Number(n) => Some(n.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Rows of cells under a shared header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Borrowed view of one row, addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    /// `(column, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl Dataset {
    /// An empty dataset with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a dataset from rows given as `(column, value)` pairs.
    ///
    /// Columns appear in the order they are first seen; cells a row does not
    /// mention are [`Value::Missing`].
    pub fn from_records<I, R, S>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut sparse: Vec<Vec<(usize, Value)>> = Vec::new();
        for record in records {
            let mut cells = Vec::new();
            for (name, value) in record {
                let name = name.into();
                let idx = match columns.iter().position(|c| *c == name) {
                    Some(idx) => idx,
                    None => {
                        columns.push(name);
                        columns.len() - 1
                    }
                };
                cells.push((idx, value));
            }
            sparse.push(cells);
        }

        let width = columns.len();
        let rows = sparse
            .into_iter()
            .map(|cells| {
                let mut row = vec![Value::Missing; width];
                for (idx, value) in cells {
                    row[idx] = value;
                }
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Reads a CSV document with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut dataset = Self::new(csv.headers()?.iter());
        for record in csv.records() {
            let record = record?;
            dataset.push_row(record.iter().map(Value::parse).collect())?;
        }
        debug!(
            rows = dataset.n_rows(),
            columns = dataset.columns.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Reads a CSV file with a header row.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    /// Appends a row; it must have one value per column.
    pub fn push_row(&mut self, values: Vec<Value>) -> Result<(), DatasetError> {
        if values.len() != self.columns.len() {
            return Err(DatasetError::RowArity {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        self.rows.push(values);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Region,Food_Risk,Health_Risk,Temperature,Rainfall,Climate_Score
A, High ,Low,30,120,0.6
B,Low,High,25,200,NA
";

    #[test]
    fn test_parse_cells() {
        assert_eq!(Value::parse(" 30 "), Value::Number(30.0));
        assert_eq!(Value::parse("0.45"), Value::Number(0.45));
        assert_eq!(Value::parse("High"), Value::Text("High".into()));
        assert_eq!(Value::parse(""), Value::Missing);
        assert_eq!(Value::parse("NaN"), Value::Missing);
        assert_eq!(Value::Number(2.0).as_label().as_deref(), Some("2"));
        assert_eq!(Value::Missing.as_label(), None);
    }

    #[test]
    fn test_non_finite_cells_are_missing() {
        for raw in ["inf", "-inf", "NAN", "infinity"] {
            assert_eq!(Value::parse(raw), Value::Missing, "{raw}");
        }
        let data = Dataset::from_csv_reader("Temperature,Climate_Score\ninf,NAN\n".as_bytes()).unwrap();
        let row = data.row(0).unwrap();
        assert!(row.values().iter().all(Value::is_missing));
    }

    #[test]
    fn test_from_csv_reader() {
        let dataset = Dataset::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.n_rows(), 2);
        assert_eq!(dataset.columns().len(), 6);
        assert!(dataset.has_column("Climate_Score"));
        assert!(!dataset.has_column("Latitude"));

        let first = dataset.row(0).unwrap();
        assert_eq!(first.get("Food_Risk"), Some(&Value::Text("High".into())));
        assert_eq!(first.get("Temperature"), Some(&Value::Number(30.0)));

        let scores: Vec<&Value> = dataset.column("Climate_Score").unwrap().collect();
        assert_eq!(scores, vec![&Value::Number(0.6), &Value::Missing]);
    }

    #[test]
    fn test_from_csv_rejects_ragged_rows() {
        let ragged = "a,b\n1,2\n3\n";
        assert!(matches!(
            Dataset::from_csv_reader(ragged.as_bytes()),
            Err(DatasetError::Csv(_))
        ));
    }

    #[test]
    fn test_from_csv_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(matches!(
            Dataset::from_csv_path(&path),
            Err(DatasetError::Io { .. })
        ));
    }

    #[test]
    fn test_from_csv_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("climate.csv");
        std::fs::write(&path, SAMPLE).unwrap();
        let dataset = Dataset::from_csv_path(&path).unwrap();
        assert_eq!(dataset.n_rows(), 2);
    }

    #[test]
    fn test_from_records_fills_missing() {
        let dataset = Dataset::from_records(vec![
            vec![("Region", Value::from("A")), ("Temperature", Value::from(30.0))],
            vec![("Region", Value::from("B")), ("Rainfall", Value::from(200.0))],
        ]);
        assert_eq!(dataset.columns(), &["Region", "Temperature", "Rainfall"]);
        let second = dataset.row(1).unwrap();
        assert_eq!(second.get("Temperature"), Some(&Value::Missing));
        assert_eq!(second.get("Rainfall"), Some(&Value::Number(200.0)));
        assert_eq!(second.iter().count(), 3);
    }

    #[test]
    fn test_push_row_arity() {
        let mut dataset = Dataset::new(["a", "b"]);
        assert!(dataset.push_row(vec![1.0.into(), 2.0.into()]).is_ok());
        assert!(matches!(
            dataset.push_row(vec![1.0.into()]),
            Err(DatasetError::RowArity { row: 1, expected: 2, found: 1 })
        ));
    }
}
