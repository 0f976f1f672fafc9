mod app;
mod charts;
mod ui;

use std::path::{Path, PathBuf};

use app::DashboardApp;
use clap::Parser;
use geomind::config::{self, CONFIG_FILE_NAME};
use geomind::logging;
use tracing::warn;

/// Interactive climate, food and health risk dashboard.
#[derive(Parser, Debug)]
#[command(name = "geomind-dashboard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file to open; the bundled sample is shown when omitted
    data: Option<PathBuf>,

    /// Predictor configuration (TOML)
    #[arg(long, short = 'c', default_value = CONFIG_FILE_NAME)]
    config: PathBuf,
}

fn main() -> eframe::Result<()> {
    let _ = logging::init();
    let args = Args::parse();

    let config = config::load(Path::new(&args.config)).unwrap_or_else(|err| {
        warn!("{err}; using default settings");
        Default::default()
    });
    let mut dashboard = DashboardApp::new(config);
    match &args.data {
        Some(path) => dashboard.load_path(path),
        None => dashboard.load_sample(),
    }

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "GeoMind Risk Dashboard",
        native_options,
        Box::new(|_cc| Ok(Box::new(dashboard))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_path_is_optional() {
        let args = Args::try_parse_from(["geomind-dashboard"]).unwrap();
        assert!(args.data.is_none());
        assert_eq!(args.config, PathBuf::from(CONFIG_FILE_NAME));

        let args = Args::try_parse_from(["geomind-dashboard", "risk.csv", "-c", "alt.toml"]).unwrap();
        assert_eq!(args.data, Some(PathBuf::from("risk.csv")));
        assert_eq!(args.config, PathBuf::from("alt.toml"));
    }
}
