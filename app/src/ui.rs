use crate::app::{DashboardApp, PredictorState};
use crate::charts;

use eframe::egui::{self, Color32, Ui};
use geomind::Dataset;
use rfd::FileDialog;

/// Draws the left-side panel: data source and the risk predictor.
pub fn draw_side_panel(app: &mut DashboardApp, ctx: &egui::Context) {
    egui::SidePanel::left("controls_panel")
        .min_width(260.0)
        .show(ctx, |ui| {
            ui.heading("GeoMind");
            ui.separator();

            draw_source_controls(app, ui);
            ui.separator();

            ui.heading("Risk predictor");
            draw_predictor(app, ui);
        });
}

/// Draws the central panel with the dataset preview and statistics.
pub fn draw_central_panel(app: &mut DashboardApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::both().show(ui, |ui| {
            ui.heading("Dataset");
            if let Some(status) = &app.status {
                ui.colored_label(Color32::RED, status);
            }
            let Some(dataset) = &app.dataset else {
                ui.label("Open a CSV file to get started.");
                return;
            };
            ui.label(format!(
                "{} rows, {} columns",
                dataset.n_rows(),
                dataset.columns().len()
            ));

            egui::CollapsingHeader::new("Preview")
                .default_open(true)
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Rows:");
                        ui.add(egui::DragValue::new(&mut app.preview_rows).range(1..=500));
                    });
                    draw_preview_grid(dataset, app.preview_rows, ui);
                });

            egui::CollapsingHeader::new("Statistics")
                .default_open(true)
                .show(ui, |ui| draw_statistics(app, ui));

            egui::CollapsingHeader::new("Outcome distributions")
                .default_open(true)
                .show(ui, |ui| draw_distributions(app, ui));

            draw_charts(app, ui);
        });
    });
}

fn draw_source_controls(app: &mut DashboardApp, ui: &mut Ui) {
    ui.horizontal(|ui| {
        if ui.button("Open CSV…").clicked() {
            if let Some(path) = FileDialog::new().add_filter("CSV", &["csv"]).pick_file() {
                app.load_path(&path);
            }
        }
        if ui.button("Sample data").clicked() {
            app.load_sample();
        }
    });
    match &app.source {
        Some(path) => ui.label(path.display().to_string()),
        None => ui.label("No file loaded"),
    };
}

fn draw_predictor(app: &mut DashboardApp, ui: &mut Ui) {
    match &app.predictor {
        PredictorState::NoData => {
            ui.label("Load a dataset to enable predictions.");
            return;
        }
        PredictorState::Unavailable(err) => {
            ui.colored_label(Color32::YELLOW, format!("⚠ Prediction unavailable: {err}"));
            return;
        }
        PredictorState::Ready(_) => {}
    }

    let mut changed = false;
    for (range, value) in app.inputs.iter().zip(app.values.iter_mut()) {
        changed |= ui
            .add(egui::Slider::new(value, range.min..=range.max).text(range.column.as_str()))
            .changed();
    }
    if changed {
        app.recalculate_prediction();
    }
    ui.separator();

    match &app.last_prediction {
        Some(Ok(prediction)) => {
            for outcome in [&prediction.first, &prediction.second] {
                ui.horizontal(|ui| {
                    ui.label(format!("{}:", outcome.column));
                    ui.colored_label(DashboardApp::get_label_color(&outcome.label), &outcome.label);
                    ui.label(format!("({:.0}%)", outcome.confidence * 100.0));
                });
            }
        }
        Some(Err(err)) => {
            ui.colored_label(Color32::RED, format!("Error: {err}"));
        }
        None => {}
    }

    if let PredictorState::Ready(models) = &app.predictor {
        ui.separator();
        ui.label("Feature importance");
        for model in models.models() {
            ui.strong(model.column());
            for (name, importance) in model.feature_importances() {
                ui.add(
                    egui::ProgressBar::new(importance as f32)
                        .desired_width(200.0)
                        .text(format!("{name} {importance:.2}")),
                );
            }
        }
    }
}

/// Region charts and the map; each one only when its columns exist.
fn draw_charts(app: &DashboardApp, ui: &mut Ui) {
    let data = &app.charts;
    if data.is_empty() {
        return;
    }
    if let Some(bars) = &data.first_by_region {
        egui::CollapsingHeader::new(format!("{} by region", bars.column))
            .default_open(true)
            .show(ui, |ui| charts::draw_label_bars(ui, bars));
    }
    if let Some((column, shares)) = &data.second_shares {
        egui::CollapsingHeader::new(format!("{column} share"))
            .default_open(true)
            .show(ui, |ui| charts::draw_shares(ui, shares));
    }
    if let Some(series) = &data.score_by_region {
        egui::CollapsingHeader::new(format!("{} per region", series.column))
            .default_open(true)
            .show(ui, |ui| charts::draw_region_series(ui, series));
    }
    egui::CollapsingHeader::new("Risk map")
        .default_open(true)
        .show(ui, |ui| match &data.map {
            Some(points) => charts::draw_map(ui, points),
            None => {
                ui.label(format!(
                    "Map not shown: `{}` and `{}` columns are required.",
                    charts::LATITUDE_COLUMN,
                    charts::LONGITUDE_COLUMN
                ));
            }
        });
}

fn draw_preview_grid(dataset: &Dataset, rows: usize, ui: &mut Ui) {
    egui::Grid::new("preview_grid").striped(true).show(ui, |ui| {
        for column in dataset.columns() {
            ui.strong(column);
        }
        ui.end_row();
        for row in dataset.rows().take(rows) {
            for value in row.values() {
                ui.label(value.to_string());
            }
            ui.end_row();
        }
    });
}

fn draw_statistics(app: &DashboardApp, ui: &mut Ui) {
    if app.summaries.is_empty() {
        ui.label("No numeric columns.");
        return;
    }
    egui::Grid::new("stats_grid").striped(true).show(ui, |ui| {
        for header in ["column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
            ui.strong(header);
        }
        ui.end_row();
        for s in &app.summaries {
            ui.label(&s.column);
            ui.label(s.count.to_string());
            for value in [s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max] {
                ui.label(format!("{value:.3}"));
            }
            ui.end_row();
        }
    });
}

fn draw_distributions(app: &DashboardApp, ui: &mut Ui) {
    if app.distributions.is_empty() {
        ui.label("No outcome columns in this dataset.");
        return;
    }
    for (column, counts) in &app.distributions {
        ui.strong(column);
        let total: usize = counts.iter().map(|(_, n)| n).sum();
        egui::Grid::new(("distribution", column.as_str())).show(ui, |ui| {
            for (label, count) in counts {
                ui.colored_label(DashboardApp::get_label_color(label), label);
                ui.label(count.to_string());
                let share = *count as f32 / total.max(1) as f32;
                ui.add(egui::ProgressBar::new(share).desired_width(160.0).show_percentage());
                ui.end_row();
            }
        });
        ui.add_space(8.0);
    }
}
