//! Hourly temperature charts rendered to PNG with plotters.
//!
//! Files are scoped: [`ChartStudio::render`] hands out a [`ChartFile`] whose
//! drop removes the image, so nothing accumulates on disk.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use meteo_core::HourlySeries;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::{error::ChartError, messages::title_case};

const SIZE: (u32, u32) = (1000, 500);
const FONT_FAMILY: &str = "sans-serif";

/// Fonts tried when no `chart.font_path` is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub trait ChartRenderer: Send + Sync {
    fn render(&self, series: &HourlySeries, title: &str, out: &Path) -> Result<(), ChartError>;
}

/// Line-with-markers renderer. Without a usable font it draws no text at all.
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    labels: bool,
}

static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

impl PlottersRenderer {
    /// Registers a font once per process: `font_path` if given, else the first
    /// system font found.
    pub fn new(font_path: Option<&Path>) -> Self {
        let labels = *FONT_REGISTERED.get_or_init(|| register_first_font(font_path));
        Self { labels }
    }

    #[cfg(test)]
    pub fn without_labels() -> Self {
        Self { labels: false }
    }

    pub fn has_labels(&self) -> bool {
        self.labels
    }
}

fn register_first_font(font_path: Option<&Path>) -> bool {
    let candidates: Vec<PathBuf> = match font_path {
        Some(path) => vec![path.to_path_buf()],
        None => SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
    };

    for path in candidates {
        let Ok(bytes) = fs::read(&path) else { continue };
        // plotters keeps registered fonts for the whole process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                info!(font = %path.display(), "Chart font registered");
                return true;
            }
            // plotters' InvalidFont carries no details and implements neither Debug nor Display
            Err(_) => warn!(font = %path.display(), "Unusable chart font"),
        }
    }

    warn!("No chart font found, charts will have no labels");
    false
}

fn draw_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Draw(e.to_string())
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, series: &HourlySeries, title: &str, out: &Path) -> Result<(), ChartError> {
        if series.is_empty() {
            return Err(ChartError::EmptySeries);
        }

        let hours: Vec<String> =
            series.points.iter().map(|p| p.time.format("%H:%M").to_string()).collect();
        let points: Vec<(usize, f64)> =
            series.points.iter().map(|p| p.temperature_c).enumerate().collect();

        let (lo, hi) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, t)| (lo.min(t), hi.max(t)));
        let pad = ((hi - lo) * 0.1).max(1.0);
        let x_max = points.len().max(2) - 1;

        let root = BitMapBackend::new(out, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20);
        if self.labels {
            builder
                .caption(title, (FONT_FAMILY, 24))
                .x_label_area_size(50)
                .y_label_area_size(60);
        }
        let mut chart = builder
            .build_cartesian_2d(0usize..x_max, (lo - pad)..(hi + pad))
            .map_err(draw_err)?;

        if self.labels {
            let label_for = |i: &usize| hours.get(*i).cloned().unwrap_or_default();
            chart
                .configure_mesh()
                .x_labels(hours.len())
                .x_label_formatter(&label_for)
                .x_desc("Orario")
                .y_desc("Temperatura (°C)")
                .label_style((FONT_FAMILY, 12))
                .draw()
                .map_err(draw_err)?;
        } else {
            let (w, h) = SIZE;
            let frame = [(0, 0), (w as i32 - 1, h as i32 - 1)];
            root.draw(&Rectangle::new(frame, &BLACK)).map_err(draw_err)?;
        }

        chart.draw_series(LineSeries::new(points.iter().copied(), &BLUE)).map_err(draw_err)?;
        chart
            .draw_series(points.iter().map(|&p| Circle::new(p, 4, BLUE.filled())))
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }
}

/// `{City}_{YYYY-MM-DD}_Grafico.png`, with path separators neutralised.
pub fn chart_file_name(city: &str, series: &HourlySeries) -> String {
    let city: String = title_case(city.trim())
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{city}_{}_Grafico.png", series.date.format("%Y-%m-%d"))
}

pub fn chart_title(series: &HourlySeries) -> String {
    format!("Temperatura oraria ({})", series.date.format("%Y-%m-%d"))
}

/// A rendered chart living in its own temporary directory.
/// Dropping it deletes the file.
#[derive(Debug)]
pub struct ChartFile {
    path: PathBuf,
    _dir: TempDir,
}

impl ChartFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Renders charts into scoped temporary files under a base directory.
#[derive(Clone)]
pub struct ChartStudio {
    renderer: Arc<dyn ChartRenderer>,
    base_dir: PathBuf,
}

impl ChartStudio {
    pub fn new(renderer: Arc<dyn ChartRenderer>, base_dir: impl Into<PathBuf>) -> Self {
        Self { renderer, base_dir: base_dir.into() }
    }

    pub async fn render(&self, city: &str, series: HourlySeries) -> Result<ChartFile, ChartError> {
        if series.is_empty() {
            return Err(ChartError::EmptySeries);
        }

        fs::create_dir_all(&self.base_dir)?;
        let dir = tempfile::Builder::new().prefix("meteo-chart-").tempdir_in(&self.base_dir)?;
        let path = dir.path().join(chart_file_name(city, &series));
        let title = chart_title(&series);

        let renderer = Arc::clone(&self.renderer);
        let out = path.clone();
        // on error `dir` is dropped here and takes any partial file with it
        tokio::task::spawn_blocking(move || renderer.render(&series, &title, &out)).await??;

        debug!(path = %path.display(), "Chart rendered");
        Ok(ChartFile { path, _dir: dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use meteo_core::HourlyPoint;

    fn series(points: usize) -> HourlySeries {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        HourlySeries {
            date,
            points: (0..points)
                .map(|h| HourlyPoint {
                    time: date.and_time(NaiveTime::from_hms_opt(h as u32, 0, 0).unwrap()),
                    temperature_c: 12.0 + h as f64,
                })
                .collect(),
        }
    }

    struct FailingRenderer;

    impl ChartRenderer for FailingRenderer {
        fn render(&self, _: &HourlySeries, _: &str, out: &Path) -> Result<(), ChartError> {
            fs::write(out, b"partial")?;
            Err(ChartError::Draw("boom".into()))
        }
    }

    #[test]
    fn file_name_uses_title_cased_city_and_date() {
        assert_eq!(chart_file_name("roma", &series(1)), "Roma_2026-10-16_Grafico.png");
        assert_eq!(chart_file_name("a/b", &series(1)), "A_B_2026-10-16_Grafico.png");
    }

    #[test]
    fn renders_png_without_labels() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("chart.png");

        PlottersRenderer::without_labels()
            .render(&series(5), "Temperatura oraria (2026-10-16)", &out)
            .expect("render");

        let bytes = fs::read(&out).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn single_point_series_renders() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("one.png");

        PlottersRenderer::without_labels().render(&series(1), "t", &out).expect("render");
        assert!(out.exists());
    }

    #[test]
    fn empty_series_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlottersRenderer::without_labels()
            .render(&series(0), "t", &dir.path().join("x.png"))
            .unwrap_err();
        assert!(matches!(err, ChartError::EmptySeries));
    }

    #[tokio::test]
    async fn chart_file_is_deleted_on_drop() {
        let base = tempfile::tempdir().unwrap();
        let studio = ChartStudio::new(Arc::new(PlottersRenderer::without_labels()), base.path());

        let chart = studio.render("roma", series(5)).await.expect("render");
        let path = chart.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.file_name().unwrap(), "Roma_2026-10-16_Grafico.png");

        drop(chart);
        assert!(!path.exists());
        assert_eq!(fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_render_leaves_nothing_behind() {
        let base = tempfile::tempdir().unwrap();
        let studio = ChartStudio::new(Arc::new(FailingRenderer), base.path());

        let err = studio.render("roma", series(3)).await.unwrap_err();

        assert!(matches!(err, ChartError::Draw(_)));
        assert_eq!(fs::read_dir(base.path()).unwrap().count(), 0);
    }
}
