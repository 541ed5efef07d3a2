// ============================================================
// Layer 4 — Windowing Engine
// ============================================================
// Slides a window of W values across a normalised series with
// stride 1 and pairs each window with the same window shifted
// forward by the horizon H.
//
// Example with W = 4, H = 1 on a series of length L = 7:
//
//   series:      0 1 2 3 4 5 6
//   candidates:  start ∈ [0, L - W) = {0, 1, 2}
//
//   start 0:  input 0 1 2 3   target 1 2 3 4
//   start 1:  input 1 2 3 4   target 2 3 4 5
//   start 2:  input 2 3 4 5   target 3 4 5 6   ← dropped
//
// The last H candidates are always dropped, which leaves
// exactly L - W - H pairs. The trim happens here, before any
// pair is built, so a target can never read past the end of
// the series.
//
// L ≤ W + H would leave nothing to train on. That is a
// configuration error and is reported as one instead of
// silently producing an empty set.

use crate::domain::error::ForecastError;
use crate::domain::window::WindowPair;

/// Prediction horizon. The model forecasts exactly one step ahead.
pub const HORIZON: usize = 1;

/// Number of usable pairs for a series of length `series_len`.
pub fn pair_count(series_len: usize, window: usize, horizon: usize) -> usize {
    series_len.saturating_sub(window).saturating_sub(horizon)
}

/// Build every (input, target) pair for `series`.
pub fn sliding_windows(
    series:  &[f32],
    window:  usize,
    horizon: usize,
) -> Result<Vec<WindowPair>, ForecastError> {
    if window == 0 {
        return Err(ForecastError::InvalidConfig("window length must be positive".into()));
    }
    if series.len() <= window + horizon {
        return Err(ForecastError::WindowTooLong {
            series_len: series.len(),
            window,
            horizon,
        });
    }

    let candidates = series.len() - window;
    let usable     = candidates - horizon;

    let pairs = (0..usable)
        .map(|start| {
            WindowPair::new(
                series[start..start + window].to_vec(),
                series[start + horizon..start + window + horizon].to_vec(),
            )
        })
        .collect();

    Ok(pairs)
}
