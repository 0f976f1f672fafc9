use crate::charts::ChartData;
use crate::ui;

use eframe::egui::{self, Color32};
use eframe::{App, Frame};
use ecolor::Hsva;
use geomind::{
    ColumnSummary, Dataset, FeatureVector, InputRange, PredictorError, RiskConfig, RiskModels,
    RiskPrediction, RiskPredictor, describe, value_counts,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Dataset shown when nothing else is loaded.
pub const SAMPLE_CSV: &str = include_str!("../../data/sample_climate_risk.csv");
pub const SAMPLE_NAME: &str = "sample_climate_risk.csv";

/// Whether the predictor panel can be shown for the current dataset.
#[derive(Debug)]
pub enum PredictorState {
    /// Nothing loaded yet.
    NoData,
    /// The dataset does not support the model; the rest of the page still works.
    Unavailable(PredictorError),
    Ready(RiskModels),
}

/// Session state for one dashboard window.
///
/// Everything derived from the dataset lives here and is rebuilt only when a
/// new dataset is loaded. Moving a slider only reruns inference.
pub struct DashboardApp {
    pub config: RiskConfig,
    pub dataset: Option<Dataset>,
    pub source: Option<PathBuf>,
    /// Last load failure, shown above the preview.
    pub status: Option<String>,

    // --- Derived from the dataset ---
    pub summaries: Vec<ColumnSummary>,
    pub distributions: Vec<(String, Vec<(String, usize)>)>,
    pub charts: ChartData,
    pub predictor: PredictorState,

    // --- Predictor inputs ---
    pub inputs: Vec<InputRange>,
    pub values: Vec<f64>,
    pub last_prediction: Option<Result<RiskPrediction, PredictorError>>,

    // --- UI State ---
    pub preview_rows: usize,
}

impl DashboardApp {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            dataset: None,
            source: None,
            status: None,
            summaries: Vec::new(),
            distributions: Vec::new(),
            charts: ChartData::default(),
            predictor: PredictorState::NoData,
            inputs: Vec::new(),
            values: Vec::new(),
            last_prediction: None,
            preview_rows: 20,
        }
    }

    /// Reads a CSV file and makes it the session dataset. On failure the
    /// previous dataset stays loaded.
    pub fn load_path(&mut self, path: &Path) {
        match Dataset::from_csv_path(path) {
            Ok(dataset) => {
                info!(path = %path.display(), rows = dataset.n_rows(), "dataset loaded");
                self.status = None;
                self.set_dataset(dataset, Some(path.to_path_buf()));
            }
            Err(err) => {
                warn!("{err}");
                self.status = Some(err.to_string());
            }
        }
    }

    /// Loads the bundled sample dataset.
    pub fn load_sample(&mut self) {
        match Dataset::from_csv_reader(SAMPLE_CSV.as_bytes()) {
            Ok(dataset) => {
                info!(rows = dataset.n_rows(), "bundled sample loaded");
                self.status = None;
                self.set_dataset(dataset, Some(PathBuf::from(SAMPLE_NAME)));
            }
            Err(err) => {
                warn!("{err}");
                self.status = Some(err.to_string());
            }
        }
    }

    /// Replaces the dataset, recomputes the statistics and refits the models.
    pub fn set_dataset(&mut self, dataset: Dataset, source: Option<PathBuf>) {
        self.summaries = describe(&dataset);
        self.distributions = self
            .config
            .schema
            .outcome_columns
            .iter()
            .filter_map(|column| {
                value_counts(&dataset, column)
                    .ok()
                    .map(|counts| (column.clone(), counts))
            })
            .collect();
        self.charts = ChartData::from_dataset(&dataset, &self.config.schema);
        self.inputs = self.config.feature_inputs(&dataset);
        self.values = self.inputs.iter().map(|range| range.default).collect();
        self.dataset = Some(dataset);
        self.source = source;
        self.refit();
    }

    /// Fits both outcome models on the current dataset.
    pub fn refit(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.predictor = PredictorState::NoData;
            self.last_prediction = None;
            return;
        };
        let predictor = RiskPredictor::new(self.config.forest.to_params());
        self.predictor = match predictor.fit(dataset, &self.config.schema) {
            Ok(models) => PredictorState::Ready(models),
            Err(err) => {
                warn!("risk prediction disabled: {err}");
                PredictorState::Unavailable(err)
            }
        };
        self.recalculate_prediction();
    }

    /// Reruns inference for the current slider values.
    pub fn recalculate_prediction(&mut self) {
        self.last_prediction = match &self.predictor {
            PredictorState::Ready(models) => {
                Some(models.predict(&FeatureVector::new(self.values.clone())))
            }
            _ => None,
        };
    }

    /// Stable color per label, so "High" looks the same in every panel.
    pub fn get_label_color(label: &str) -> Color32 {
        let hash = label
            .bytes()
            .fold(0u32, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte as u32));

        let golden_ratio_conjugate = 0.61803398875;
        let hue = (hash as f32 * golden_ratio_conjugate).fract();

        let hsva = Hsva { h: hue, s: 0.85, v: 0.9, a: 1.0 };
        Color32::from(hsva)
    }
}

impl App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        ui::draw_side_panel(self, ctx);
        ui::draw_central_panel(self, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "\
Region,Food_Risk,Health_Risk,Temperature,Rainfall,Climate_Score
North,High,Moderate,38,70,0.82
South,High,High,41,60,0.9
East,High,Moderate,36.5,90,0.75
Coast,Low,Low,24,240,0.2
Hills,Low,Low,21.5,280,0.15
Plains,Low,Low,23,260,0.25
";

    const NO_HEALTH: &str = "\
Region,Food_Risk,Temperature,Rainfall,Climate_Score
North,High,38,70,0.82
Coast,Low,24,240,0.2
";

    fn app_with(csv: &str) -> DashboardApp {
        let mut app = DashboardApp::new(RiskConfig::default());
        let dataset = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
        app.set_dataset(dataset, None);
        app
    }

    #[test]
    fn test_full_dataset_enables_predictor() {
        let app = app_with(FULL);
        assert!(matches!(app.predictor, PredictorState::Ready(_)));
        assert_eq!(app.values, vec![30.0, 150.0, 0.5]);
        assert_eq!(app.distributions.len(), 2);
        assert_eq!(app.summaries.len(), 3);
        assert!(matches!(app.last_prediction, Some(Ok(_))));
    }

    #[test]
    fn test_missing_outcome_degrades_to_statistics() {
        let app = app_with(NO_HEALTH);
        assert!(matches!(app.predictor, PredictorState::Unavailable(_)));
        assert!(app.last_prediction.is_none());
        assert_eq!(app.summaries.len(), 3);
        assert_eq!(app.distributions.len(), 1);
        assert_eq!(app.distributions[0].0, "Food_Risk");
    }

    #[test]
    fn test_slider_change_reruns_inference_only() {
        let mut app = app_with(FULL);
        let PredictorState::Ready(models) = &app.predictor else {
            panic!("predictor should be ready");
        };
        let seed = models.models()[0].seed();

        app.values = vec![40.0, 60.0, 0.9];
        app.recalculate_prediction();
        let prediction = app.last_prediction.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(prediction.first.label, "High");

        let PredictorState::Ready(models) = &app.predictor else {
            panic!("predictor should still be ready");
        };
        assert_eq!(models.models()[0].seed(), seed);
    }

    #[test]
    fn test_failed_load_keeps_previous_dataset() {
        let mut app = app_with(FULL);
        let dir = tempfile::tempdir().unwrap();
        app.load_path(&dir.path().join("missing.csv"));
        assert!(app.status.is_some());
        assert_eq!(app.dataset.as_ref().map(Dataset::n_rows), Some(6));
        assert!(matches!(app.predictor, PredictorState::Ready(_)));
    }

    #[test]
    fn test_load_path_reads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk.csv");
        std::fs::write(&path, FULL).unwrap();

        let mut app = DashboardApp::new(RiskConfig::default());
        app.load_path(&path);
        assert!(app.status.is_none());
        assert_eq!(app.source.as_deref(), Some(path.as_path()));
        assert!(matches!(app.predictor, PredictorState::Ready(_)));
    }

    #[test]
    fn test_bundled_sample_fills_every_panel() {
        let mut app = DashboardApp::new(RiskConfig::default());
        app.load_sample();
        assert!(app.status.is_none());
        assert_eq!(app.dataset.as_ref().map(Dataset::n_rows), Some(12));
        assert_eq!(app.source.as_deref(), Some(Path::new(SAMPLE_NAME)));
        assert!(matches!(app.predictor, PredictorState::Ready(_)));
        assert!(app.charts.first_by_region.is_some());
        assert!(app.charts.second_shares.is_some());
        assert!(app.charts.score_by_region.is_some());
        assert!(app.charts.map.is_some());
    }

    #[test]
    fn test_charts_follow_available_columns() {
        let app = app_with(NO_HEALTH);
        assert!(app.charts.first_by_region.is_some());
        assert!(app.charts.second_shares.is_none());
        assert!(app.charts.map.is_none());
    }

    #[test]
    fn test_label_colors_are_stable() {
        assert_eq!(
            DashboardApp::get_label_color("High"),
            DashboardApp::get_label_color("High")
        );
        assert_ne!(
            DashboardApp::get_label_color("High"),
            DashboardApp::get_label_color("Low")
        );
    }
}
