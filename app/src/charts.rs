//! Region charts and the risk map, drawn directly with the painter.
//!
//! Each view is built once per dataset and only exists when the dataset has
//! the columns it needs.

use crate::app::DashboardApp;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2};
use eframe::egui::emath::remap;
use geomind::{CategoryEncoding, Dataset, RiskSchema, Value, value_counts};

pub const REGION_COLUMN: &str = "Region";
pub const SCORE_COLUMN: &str = "Climate_Score";
pub const LATITUDE_COLUMN: &str = "Latitude";
pub const LONGITUDE_COLUMN: &str = "Longitude";

const AXIS: Stroke = Stroke {
    width: 1.0,
    color: Color32::GRAY,
};

/// A categorical outcome per region, e.g. food risk.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelBars {
    pub column: String,
    pub encoding: CategoryEncoding,
    /// `(region, code)` in row order.
    pub bars: Vec<(String, usize)>,
}

/// A numeric value per region, e.g. climate score.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSeries {
    pub column: String,
    pub points: Vec<(String, f64)>,
}

/// One map marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub region: String,
    pub lat: f64,
    pub lon: f64,
    pub label: Option<String>,
}

/// Every chart the current dataset supports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub first_by_region: Option<LabelBars>,
    /// `(column, [(label, share)])` of the second outcome.
    pub second_shares: Option<(String, Vec<(String, f64)>)>,
    pub score_by_region: Option<RegionSeries>,
    pub map: Option<Vec<MapPoint>>,
}

impl ChartData {
    pub fn from_dataset(dataset: &Dataset, schema: &RiskSchema) -> Self {
        let [first, second] = &schema.outcome_columns;
        Self {
            first_by_region: label_bars(dataset, first),
            second_shares: shares(dataset, second).map(|s| (second.clone(), s)),
            score_by_region: region_series(dataset, SCORE_COLUMN),
            map: map_points(dataset, first),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_by_region.is_none()
            && self.second_shares.is_none()
            && self.score_by_region.is_none()
            && self.map.is_none()
    }
}

fn region_name(row: usize, cell: Option<&Value>) -> String {
    cell.and_then(Value::as_label)
        .unwrap_or_else(|| format!("row {}", row + 1))
}

fn finite(cell: &Value) -> Option<f64> {
    cell.as_number().filter(|v| v.is_finite())
}

/// Label of `column` for every region that has one.
pub fn label_bars(dataset: &Dataset, column: &str) -> Option<LabelBars> {
    if !dataset.has_column(column) {
        return None;
    }
    let (regions, labels): (Vec<String>, Vec<String>) = dataset
        .rows()
        .enumerate()
        .filter_map(|(i, row)| {
            let label = row.get(column)?.as_label()?;
            Some((region_name(i, row.get(REGION_COLUMN)), label))
        })
        .unzip();
    if labels.is_empty() {
        return None;
    }
    let (encoding, codes) = CategoryEncoding::fit_transform(&labels);
    Some(LabelBars {
        column: column.to_string(),
        encoding,
        bars: regions.into_iter().zip(codes).collect(),
    })
}

/// Fraction of rows holding each label of `column`, most frequent first.
pub fn shares(dataset: &Dataset, column: &str) -> Option<Vec<(String, f64)>> {
    let counts = value_counts(dataset, column).ok()?;
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return None;
    }
    Some(
        counts
            .into_iter()
            .map(|(label, n)| (label, n as f64 / total as f64))
            .collect(),
    )
}

/// Numeric `column` per region, skipping rows without a number.
pub fn region_series(dataset: &Dataset, column: &str) -> Option<RegionSeries> {
    if !dataset.has_column(column) {
        return None;
    }
    let points: Vec<(String, f64)> = dataset
        .rows()
        .enumerate()
        .filter_map(|(i, row)| {
            let value = finite(row.get(column)?)?;
            Some((region_name(i, row.get(REGION_COLUMN)), value))
        })
        .collect();
    (!points.is_empty()).then(|| RegionSeries {
        column: column.to_string(),
        points,
    })
}

/// Markers for every row with a latitude and longitude, labelled by
/// `label_column` when present.
pub fn map_points(dataset: &Dataset, label_column: &str) -> Option<Vec<MapPoint>> {
    if !dataset.has_column(LATITUDE_COLUMN) || !dataset.has_column(LONGITUDE_COLUMN) {
        return None;
    }
    let points: Vec<MapPoint> = dataset
        .rows()
        .enumerate()
        .filter_map(|(i, row)| {
            Some(MapPoint {
                region: region_name(i, row.get(REGION_COLUMN)),
                lat: finite(row.get(LATITUDE_COLUMN)?)?,
                lon: finite(row.get(LONGITUDE_COLUMN)?)?,
                label: row.get(label_column).and_then(Value::as_label),
            })
        })
        .collect();
    (!points.is_empty()).then_some(points)
}

/// `(min, max)` padded by `pad` of the span, widened when degenerate.
fn padded_range(values: impl Iterator<Item = f64>, pad: f64) -> Option<(f64, f64)> {
    let (lo, hi) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        None => Some((v, v)),
    })?;
    let span = if hi > lo { hi - lo } else { 1.0 };
    Some((lo - span * pad, hi + span * pad))
}

fn small_font() -> FontId {
    FontId::proportional(10.0)
}

fn chart_painter(ui: &mut Ui, height: f32) -> (Rect, egui::Painter) {
    let width = ui.available_width().clamp(240.0, 720.0);
    let (response, painter) = ui.allocate_painter(Vec2::new(width, height), Sense::hover());
    (response.rect, painter)
}

/// Region names under the x axis, staggered on two lines.
fn draw_region_ticks(painter: &egui::Painter, xs: &[(f32, &str)], y: f32, color: Color32) {
    for (i, (x, name)) in xs.iter().enumerate() {
        let offset = if i % 2 == 0 { 2.0 } else { 14.0 };
        painter.text(
            Pos2::new(*x, y + offset),
            Align2::CENTER_TOP,
            name,
            small_font(),
            color,
        );
    }
}

pub fn draw_label_bars(ui: &mut Ui, chart: &LabelBars) {
    let (rect, painter) = chart_painter(ui, 220.0);
    let text_color = ui.visuals().text_color();
    let plot = Rect::from_min_max(rect.min + Vec2::new(70.0, 8.0), rect.max - Vec2::new(8.0, 32.0));
    let n_levels = chart.encoding.len().max(1) as f32;

    for (code, label) in chart.encoding.iter() {
        let y = remap(code as f32 + 1.0, 0.0..=n_levels, plot.bottom()..=plot.top());
        painter.text(Pos2::new(plot.left() - 6.0, y), Align2::RIGHT_CENTER, label, small_font(), text_color);
        painter.hline(plot.x_range(), y, Stroke::new(0.5, Color32::from_gray(90)));
    }

    let slot = plot.width() / chart.bars.len().max(1) as f32;
    let mut ticks = Vec::with_capacity(chart.bars.len());
    for (i, (region, code)) in chart.bars.iter().enumerate() {
        let x = plot.left() + slot * (i as f32 + 0.5);
        let top = remap(*code as f32 + 1.0, 0.0..=n_levels, plot.bottom()..=plot.top());
        let bar = Rect::from_min_max(
            Pos2::new(x - slot * 0.35, top),
            Pos2::new(x + slot * 0.35, plot.bottom()),
        );
        let color = chart
            .encoding
            .decode(*code)
            .map_or(Color32::GRAY, DashboardApp::get_label_color);
        painter.rect_filled(bar, 2.0, color);
        ticks.push((x, region.as_str()));
    }
    painter.hline(plot.x_range(), plot.bottom(), AXIS);
    draw_region_ticks(&painter, &ticks, plot.bottom(), text_color);
}

pub fn draw_shares(ui: &mut Ui, shares: &[(String, f64)]) {
    let (rect, painter) = chart_painter(ui, 200.0);
    let text_color = ui.visuals().text_color();
    let radius = 85.0;
    let center = Pos2::new(rect.left() + radius + 10.0, rect.center().y);

    let mut start = -std::f32::consts::FRAC_PI_2;
    for (label, share) in shares {
        let sweep = *share as f32 * std::f32::consts::TAU;
        let color = DashboardApp::get_label_color(label);
        // Thin triangles keep every piece convex.
        let steps = ((sweep / 0.1).ceil() as usize).max(1);
        for step in 0..steps {
            let a = start + sweep * step as f32 / steps as f32;
            let b = start + sweep * (step + 1) as f32 / steps as f32;
            painter.add(Shape::convex_polygon(
                vec![
                    center,
                    center + radius * Vec2::angled(a),
                    center + radius * Vec2::angled(b),
                ],
                color,
                Stroke::NONE,
            ));
        }
        start += sweep;
    }
    painter.circle_stroke(center, radius, Stroke::new(1.0, Color32::BLACK));

    let legend_x = center.x + radius + 24.0;
    for (i, (label, share)) in shares.iter().enumerate() {
        let y = rect.top() + 20.0 + i as f32 * 18.0;
        let swatch = Rect::from_center_size(Pos2::new(legend_x, y), Vec2::splat(10.0));
        painter.rect_filled(swatch, 1.0, DashboardApp::get_label_color(label));
        painter.text(
            Pos2::new(legend_x + 10.0, y),
            Align2::LEFT_CENTER,
            format!("{label} {:.0}%", share * 100.0),
            FontId::proportional(13.0),
            text_color,
        );
    }
}

pub fn draw_region_series(ui: &mut Ui, series: &RegionSeries) {
    let (rect, painter) = chart_painter(ui, 220.0);
    let text_color = ui.visuals().text_color();
    let plot = Rect::from_min_max(rect.min + Vec2::new(50.0, 8.0), rect.max - Vec2::new(8.0, 32.0));
    let Some((lo, hi)) = padded_range(series.points.iter().map(|(_, v)| *v), 0.1) else {
        return;
    };

    for tick in [lo, (lo + hi) / 2.0, hi] {
        let y = remap(tick as f32, lo as f32..=hi as f32, plot.bottom()..=plot.top());
        painter.text(
            Pos2::new(plot.left() - 6.0, y),
            Align2::RIGHT_CENTER,
            format!("{tick:.2}"),
            small_font(),
            text_color,
        );
    }

    let slot = plot.width() / series.points.len() as f32;
    let positions: Vec<Pos2> = series
        .points
        .iter()
        .enumerate()
        .map(|(i, (_, v))| {
            Pos2::new(
                plot.left() + slot * (i as f32 + 0.5),
                remap(*v as f32, lo as f32..=hi as f32, plot.bottom()..=plot.top()),
            )
        })
        .collect();

    painter.add(Shape::line(positions.clone(), Stroke::new(2.0, Color32::LIGHT_BLUE)));
    for pos in &positions {
        painter.circle_filled(*pos, 4.0, Color32::LIGHT_BLUE);
        painter.circle_stroke(*pos, 4.0, Stroke::new(1.0, Color32::BLACK));
    }
    painter.hline(plot.x_range(), plot.bottom(), AXIS);
    painter.vline(plot.left(), plot.y_range(), AXIS);
    let ticks: Vec<(f32, &str)> = positions
        .iter()
        .zip(&series.points)
        .map(|(pos, (region, _))| (pos.x, region.as_str()))
        .collect();
    draw_region_ticks(&painter, &ticks, plot.bottom(), text_color);
}

/// Equirectangular scatter of the markers, colored by label.
pub fn draw_map(ui: &mut Ui, points: &[MapPoint]) {
    let (rect, painter) = chart_painter(ui, 320.0);
    let text_color = ui.visuals().text_color();
    let plot = rect.shrink(12.0);
    let (Some((lon_lo, lon_hi)), Some((lat_lo, lat_hi))) = (
        padded_range(points.iter().map(|p| p.lon), 0.08),
        padded_range(points.iter().map(|p| p.lat), 0.08),
    ) else {
        return;
    };

    painter.rect_filled(plot, 4.0, Color32::from_rgb(28, 48, 72));
    painter.rect_stroke(plot, 4.0, AXIS, egui::StrokeKind::Inside);

    let to_screen = |p: &MapPoint| {
        Pos2::new(
            remap(p.lon as f32, lon_lo as f32..=lon_hi as f32, plot.left()..=plot.right()),
            remap(p.lat as f32, lat_lo as f32..=lat_hi as f32, plot.bottom()..=plot.top()),
        )
    };

    let hover = ui.ctx().pointer_hover_pos();
    for point in points {
        let pos = to_screen(point);
        let color = point
            .label
            .as_deref()
            .map_or(Color32::RED, DashboardApp::get_label_color);
        painter.circle_filled(pos, 6.0, color);
        painter.circle_stroke(pos, 6.0, Stroke::new(1.5, Color32::BLACK));

        let near = hover.is_some_and(|h| h.distance(pos) < 10.0);
        let caption = match (&point.label, near) {
            (Some(label), true) => format!("{} ({label})", point.region),
            _ => point.region.clone(),
        };
        painter.text(
            pos + Vec2::new(8.0, -2.0),
            Align2::LEFT_BOTTOM,
            caption,
            small_font(),
            if near { Color32::YELLOW } else { text_color },
        );
    }
}
