// ============================================================
// Layer 6 — Chart Writer
// ============================================================
// Renders line charts of (normalised or °C) series to PNG so a
// training run can be inspected without a notebook:
//
//   graph/
//     train_test_data.png        ← train split + val split
//     transformer-epoch10.png    ← one-step predictions vs truth
//     transformer-future10.png   ← 200-step roll-forward
//     holdout_forecast.png       ← 12-month forecast vs real
//
// Each line is a list of (x, y) points. Index-based lines place
// values at consecutive x positions; dated lines use months since
// an origin date, so the overview reads as °C against time. Both
// axes are scaled to the min/max over all lines with a small y
// margin; a grid and (when in range) the zero axis are drawn
// underneath.
//
// A failed write is never fatal for training: callers go
// through `render_or_warn`, which logs and moves on.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use image::{Rgb, RgbImage};
use std::{fs, path::PathBuf};

use crate::domain::observation::Observation;

pub mod colors {
    use image::Rgb;

    pub const WHITE:      Rgb<u8> = Rgb([255, 255, 255]);
    pub const BLACK:      Rgb<u8> = Rgb([0, 0, 0]);
    pub const LIGHT_GRAY: Rgb<u8> = Rgb([220, 220, 220]);
    pub const BLUE:       Rgb<u8> = Rgb([33, 150, 243]);
    pub const RED:        Rgb<u8> = Rgb([229, 57, 53]);
    pub const GREEN:      Rgb<u8> = Rgb([0, 170, 80]);
}

const WIDTH:      u32 = 1000;
const HEIGHT:     u32 = 420;
const MARGIN:     u32 = 20;
const GRID_LINES: u32 = 10;

/// One polyline on a chart.
#[derive(Debug, Clone)]
pub struct Line {
    pub points: Vec<(f64, f64)>,
    pub color:  Rgb<u8>,
}

impl Line {
    /// `values` at x = 0, 1, 2, ...
    pub fn new(values: Vec<f64>, color: Rgb<u8>) -> Self {
        let points = values.into_iter().enumerate().map(|(i, v)| (i as f64, v)).collect();
        Self { points, color }
    }

    /// Shift every point right by `start`.
    pub fn starting_at(mut self, start: usize) -> Self {
        for point in &mut self.points {
            point.0 += start as f64;
        }
        self
    }

    /// Observed values with x = whole months elapsed since `origin`.
    pub fn dated(observations: &[Observation], origin: NaiveDate, color: Rgb<u8>) -> Self {
        let points = observations
            .iter()
            .map(|o| (months_between(origin, o.date) as f64, o.value))
            .collect();
        Self { points, color }
    }
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() - from.year()) as i64 * 12 + to.month() as i64 - from.month() as i64
}

pub struct ChartWriter {
    dir: PathBuf,
}

impl ChartWriter {
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create graph dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Draw `lines` into `{dir}/{name}.png`.
    pub fn render(&self, name: &str, lines: &[Line]) -> Result<PathBuf> {
        let path = self.dir.join(format!("{name}.png"));
        let img  = draw(lines);
        img.save(&path)
            .with_context(|| format!("Cannot write chart '{}'", path.display()))?;
        tracing::debug!("Wrote chart '{}'", path.display());
        Ok(path)
    }

    pub fn render_or_warn(&self, name: &str, lines: &[Line]) {
        if let Err(e) = self.render(name, lines) {
            tracing::warn!("Skipping chart '{}': {:#}", name, e);
        }
    }

    // ─── Named charts ─────────────────────────────────────────────────────────

    /// Truth (blue), one-step predictions (red) and their difference (green).
    pub fn prediction_vs_truth(&self, epoch: usize, truth: &[f32], predictions: &[f32]) {
        let difference = predictions.iter().zip(truth).map(|(p, t)| (p - t) as f64).collect();
        self.render_or_warn(
            &format!("transformer-epoch{epoch}"),
            &[
                Line::new(widen(truth), colors::BLUE),
                Line::new(widen(predictions), colors::RED),
                Line::new(difference, colors::GREEN),
            ],
        );
    }

    /// The seed window (blue) followed by the rolled-forward values (red).
    pub fn future_forecast(&self, epoch: usize, buffer: &[f32], window: usize) {
        let split = window.min(buffer.len());
        self.render_or_warn(
            &format!("transformer-future{epoch}"),
            &[
                Line::new(widen(&buffer[..split]), colors::BLUE),
                Line::new(widen(&buffer[split..]), colors::RED).starting_at(split),
            ],
        );
    }

    /// Train split (blue) and validation split (red) in °C against date.
    pub fn train_val_overview(&self, train: &[Observation], val: &[Observation]) {
        let Some(origin) = train.first().or(val.first()).map(|o| o.date) else {
            tracing::warn!("Skipping chart 'train_test_data': no observations");
            return;
        };
        self.render_or_warn(
            "train_test_data",
            &[
                Line::dated(train, origin, colors::BLUE),
                Line::dated(val, origin, colors::RED),
            ],
        );
    }

    /// Real holdout values (blue) against the forecast (red), in °C.
    pub fn holdout_forecast(&self, truth: &[f64], forecast: &[f64]) {
        self.render_or_warn(
            "holdout_forecast",
            &[
                Line::new(truth.to_vec(), colors::BLUE),
                Line::new(forecast.to_vec(), colors::RED),
            ],
        );
    }
}

fn widen(values: &[f32]) -> Vec<f64> {
    values.iter().map(|&v| v as f64).collect()
}

// ─── Rasterising ──────────────────────────────────────────────────────────────

/// Maps data coordinates onto the pixel grid.
struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn fit(lines: &[Line]) -> Self {
        let finite = || {
            lines
                .iter()
                .flat_map(|l| l.points.iter().copied())
                .filter(|(x, y)| x.is_finite() && y.is_finite())
        };
        let (x_lo, x_hi) = span(finite().map(|(x, _)| x)).unwrap_or((0.0, 1.0));
        let (y_lo, y_hi) = span(finite().map(|(_, y)| y)).unwrap_or((-1.0, 1.0));

        let x_max = if x_hi > x_lo { x_hi } else { x_lo + 1.0 };
        let pad   = if y_hi > y_lo { (y_hi - y_lo) * 0.05 } else { 1.0 };
        Self { x_min: x_lo, x_max, y_min: y_lo - pad, y_max: y_hi + pad }
    }

    fn px(&self, x: f64) -> i64 {
        let span = (WIDTH - 2 * MARGIN) as f64;
        let t = (x - self.x_min) / (self.x_max - self.x_min);
        MARGIN as i64 + (t * span).round() as i64
    }

    fn py(&self, y: f64) -> i64 {
        let span = (HEIGHT - 2 * MARGIN) as f64;
        let t = (y - self.y_min) / (self.y_max - self.y_min);
        (HEIGHT - MARGIN) as i64 - (t * span).round() as i64
    }
}

/// Smallest and largest of `values`, or `None` when empty.
fn span(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None           => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn draw(lines: &[Line]) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, colors::WHITE);
    let frame   = Frame::fit(lines);

    for k in 0..=GRID_LINES {
        let x = (MARGIN + k * (WIDTH - 2 * MARGIN) / GRID_LINES) as i64;
        let y = (MARGIN + k * (HEIGHT - 2 * MARGIN) / GRID_LINES) as i64;
        segment(&mut img, (x, MARGIN as i64), (x, (HEIGHT - MARGIN) as i64), colors::LIGHT_GRAY);
        segment(&mut img, (MARGIN as i64, y), ((WIDTH - MARGIN) as i64, y), colors::LIGHT_GRAY);
    }
    if frame.y_min < 0.0 && frame.y_max > 0.0 {
        let y0 = frame.py(0.0);
        segment(&mut img, (MARGIN as i64, y0), ((WIDTH - MARGIN) as i64, y0), colors::BLACK);
    }

    for line in lines {
        let points: Vec<(i64, i64)> = line
            .points
            .iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|&(x, y)| (frame.px(x), frame.py(y)))
            .collect();
        for pair in points.windows(2) {
            segment(&mut img, pair[0], pair[1], line.color);
        }
        if let [only] = points.as_slice() {
            plot(&mut img, only.0, only.1, line.color);
        }
    }
    img
}

/// Bresenham line between two pixel positions, clipped to the image.
fn segment(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx  =  (to.0 - x).abs();
    let dy  = -(to.1 - y).abs();
    let sx  = if x < to.0 { 1 } else { -1 };
    let sy  = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        plot(img, x, y, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x   += sx;
        }
        if e2 <= dx {
            err += dx;
            y   += sy;
        }
    }
}

fn plot(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn monthly(year: i32, values: &[f64]) -> Vec<Observation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| Observation {
                date: NaiveDate::from_ymd_opt(year, i as u32 + 1, 1).unwrap(),
                value,
            })
            .collect()
    }

    #[test]
    fn test_render_writes_png_of_fixed_size() {
        let tmp    = tempdir().unwrap();
        let charts = ChartWriter::new(tmp.path().to_string_lossy().to_string()).unwrap();

        let path = charts
            .render("sine", &[Line::new((0..50).map(|i| (i as f64 * 0.2).sin()).collect(), colors::BLUE)])
            .unwrap();

        assert!(path.ends_with("sine.png"));
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
        assert!(img.pixels().any(|p| *p == colors::BLUE));
    }

    #[test]
    fn test_named_charts_land_in_graph_dir() {
        let tmp    = tempdir().unwrap();
        let charts = ChartWriter::new(tmp.path().to_string_lossy().to_string()).unwrap();

        charts.prediction_vs_truth(10, &[0.1, 0.2, 0.3], &[0.0, 0.25, 0.3]);
        charts.future_forecast(10, &[0.0, 0.1, 0.2, 0.3, 0.4], 3);
        charts.train_val_overview(&monthly(2000, &[14.1, 14.5]), &monthly(2003, &[14.4]));

        for name in ["transformer-epoch10.png", "transformer-future10.png", "train_test_data.png"] {
            assert!(tmp.path().join(name).exists(), "{name} missing");
        }
    }

    #[test]
    fn test_constant_and_empty_lines_do_not_panic() {
        let img = draw(&[Line::new(vec![2.0; 5], colors::RED), Line::new(vec![], colors::BLUE)]);
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
    }

    #[test]
    fn test_segment_is_clipped_to_image() {
        let mut img = RgbImage::from_pixel(10, 10, colors::WHITE);
        segment(&mut img, (-5, 5), (20, 5), colors::BLACK);
        assert_eq!(*img.get_pixel(0, 5), colors::BLACK);
        assert_eq!(*img.get_pixel(9, 5), colors::BLACK);
    }

    #[test]
    fn test_dated_line_uses_months_and_raw_values() {
        let origin = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let mut obs = monthly(2000, &[8.5, 9.25]);
        obs.extend(monthly(2001, &[7.75]));

        let line = Line::dated(&obs, origin, colors::BLUE);
        assert_eq!(line.points, vec![(0.0, 8.5), (1.0, 9.25), (12.0, 7.75)]);
    }

    #[test]
    fn test_overview_places_validation_after_train_in_time() {
        let train = monthly(2000, &[14.0, 15.0, 16.0]);
        let val   = monthly(2000, &[15.0; 6])[3..].to_vec();
        let origin = train[0].date;

        let lines = [Line::dated(&train, origin, colors::BLUE), Line::dated(&val, origin, colors::RED)];
        let frame = Frame::fit(&lines);
        assert_eq!((frame.x_min, frame.x_max), (0.0, 5.0));
        assert!(frame.y_min < 14.0 && frame.y_max > 16.0);
    }

    #[test]
    fn test_unwritable_chart_is_not_fatal() {
        let tmp    = tempdir().unwrap();
        let charts = ChartWriter::new(tmp.path().to_string_lossy().to_string()).unwrap();
        // A directory where the file should go makes the PNG write fail.
        fs::create_dir(tmp.path().join("blocked.png")).unwrap();
        fs::create_dir(tmp.path().join("transformer-epoch3.png")).unwrap();

        let line = Line::new(vec![0.0, 1.0], colors::RED);
        assert!(charts.render("blocked", &[line.clone()]).is_err());

        charts.render_or_warn("blocked", &[line]);
        charts.prediction_vs_truth(3, &[0.1, 0.2], &[0.1, 0.3]);
        assert!(tmp.path().join("transformer-epoch3.png").is_dir());
    }
}
