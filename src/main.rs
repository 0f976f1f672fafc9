//! Headless risk report: statistics, outcome distributions and a prediction
//! for one set of feature values.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use geomind::config::{self, CONFIG_FILE_NAME};
use geomind::{
    Dataset, FeatureVector, PredictorError, RiskConfig, RiskPredictor, RiskSchema, ShapeError,
    describe, logging, value_counts,
};
use tracing::{error, warn};

/// Summarize a regional climate-risk dataset and predict its two risk outcomes.
#[derive(Parser, Debug)]
#[command(name = "geomind")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Predictor configuration (TOML); defaults apply when the file is absent
    #[arg(long, short = 'c', default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// CSV file to analyze
    data: PathBuf,

    /// Feature values in schema order; the configured defaults when omitted
    #[arg(allow_negative_numbers = true)]
    values: Vec<f64>,
}

fn main() -> ExitCode {
    let _ = logging::init();
    let cli = Cli::parse();

    let config = match config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = check_value_count(&cli.values, &config.schema) {
        error!("{err}");
        return ExitCode::FAILURE;
    }
    let dataset = match Dataset::from_csv_path(&cli.data) {
        Ok(dataset) => dataset,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    print_overview(&dataset, &config);

    match report_prediction(&dataset, &config, &cli.values) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if is_degradable(&err) => {
            warn!("risk prediction unavailable: {err}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Values given on the command line must cover every feature column.
fn check_value_count(values: &[f64], schema: &RiskSchema) -> Result<(), ShapeError> {
    let expected = schema.feature_columns.len();
    if values.is_empty() || values.len() == expected {
        Ok(())
    } else {
        Err(ShapeError::Length {
            expected,
            found: values.len(),
        })
    }
}

/// Only a dataset that cannot support the model lets the report finish
/// without a prediction.
fn is_degradable(err: &PredictorError) -> bool {
    matches!(err, PredictorError::Schema(_))
}

fn print_overview(dataset: &Dataset, config: &RiskConfig) {
    println!(
        "{} rows, {} columns: {}",
        dataset.n_rows(),
        dataset.columns().len(),
        dataset.columns().join(", ")
    );

    println!();
    println!(
        "{:<16} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in describe(dataset) {
        println!(
            "{:<16} {:>6} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
            s.column, s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
        );
    }

    for column in &config.schema.outcome_columns {
        match value_counts(dataset, column) {
            Ok(counts) => {
                println!();
                println!("{column}");
                for (label, count) in counts {
                    println!("  {label:<14} {count}");
                }
            }
            Err(err) => warn!("{err}"),
        }
    }
}

fn report_prediction(dataset: &Dataset, config: &RiskConfig, values: &[f64]) -> Result<(), PredictorError> {
    let predictor = RiskPredictor::new(config.forest.to_params());
    let models = predictor.fit(dataset, &config.schema)?;

    let values = if values.is_empty() {
        config
            .feature_inputs(dataset)
            .iter()
            .map(|range| range.default)
            .collect()
    } else {
        values.to_vec()
    };
    let features = FeatureVector::new(values);
    let prediction = models.predict(&features)?;

    println!();
    let inputs: Vec<String> = models
        .feature_columns()
        .iter()
        .zip(features.values())
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    println!("prediction for {}", inputs.join(", "));
    for outcome in [&prediction.first, &prediction.second] {
        println!(
            "  {:<14} {} ({:.0}% of trees)",
            outcome.column,
            outcome.label,
            outcome.confidence * 100.0
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geomind::SchemaError;

    #[test]
    fn test_parse_data_and_values() {
        let cli = Cli::try_parse_from(["geomind", "data.csv", "30", "150", "0.5"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE_NAME));
        assert_eq!(cli.data, PathBuf::from("data.csv"));
        assert_eq!(cli.values, vec![30.0, 150.0, 0.5]);
    }

    #[test]
    fn test_parse_config_flag_and_negative_values() {
        let cli = Cli::try_parse_from(["geomind", "--config", "risk.toml", "data.csv", "-12.5"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("risk.toml"));
        assert_eq!(cli.values, vec![-12.5]);
    }

    #[test]
    fn test_help_is_not_a_usage_error() {
        let err = Cli::try_parse_from(["geomind", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Cli::try_parse_from(["geomind"]).is_err());
        assert!(Cli::try_parse_from(["geomind", "--config"]).is_err());
        assert!(Cli::try_parse_from(["geomind", "data.csv", "hot"]).is_err());
    }

    #[test]
    fn test_value_count_must_match_features() {
        let schema = RiskSchema::default();
        assert!(check_value_count(&[], &schema).is_ok());
        assert!(check_value_count(&[30.0, 150.0, 0.5], &schema).is_ok());
        assert_eq!(
            check_value_count(&[30.0, 150.0], &schema),
            Err(ShapeError::Length { expected: 3, found: 2 })
        );
    }

    #[test]
    fn test_only_schema_errors_degrade() {
        assert!(is_degradable(&PredictorError::Schema(SchemaError::EmptyDataset)));
        assert!(!is_degradable(&PredictorError::Shape(ShapeError::Length {
            expected: 3,
            found: 2
        })));
        assert!(!is_degradable(&PredictorError::UnknownCode {
            column: "Food_Risk".into(),
            code: 9
        }));
    }
}
