use burn::data::dataset::Dataset;

use crate::data::windowing::sliding_windows;
use crate::domain::error::ForecastError;
use crate::domain::window::WindowPair;

/// An ordered set of window pairs cut from one split of the series.
/// Order matters: pair i starts at series index i.
#[derive(Debug, Clone)]
pub struct WindowDataset {
    pairs:  Vec<WindowPair>,
    window: usize,
}

impl WindowDataset {
    pub fn from_series(series: &[f32], window: usize, horizon: usize) -> Result<Self, ForecastError> {
        let pairs = sliding_windows(series, window, horizon)?;
        Ok(Self { pairs, window })
    }

    pub fn window(&self) -> usize { self.window }

    pub fn pair_count(&self) -> usize { self.pairs.len() }

    /// The pair at `index`, borrowed.
    pub fn pair(&self, index: usize) -> Option<&WindowPair> {
        self.pairs.get(index)
    }
}

impl Dataset<WindowPair> for WindowDataset {
    fn get(&self, index: usize) -> Option<WindowPair> {
        self.pairs.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.pairs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_exposes_pairs_in_order() {
        let series: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let ds = WindowDataset::from_series(&series, 4, 1).unwrap();
        assert_eq!(ds.len(), 7);
        assert_eq!(ds.window(), 4);
        assert_eq!(ds.get(3).unwrap().input, vec![3.0, 4.0, 5.0, 6.0]);
        assert!(ds.get(7).is_none());
    }
}
