// ============================================================
// Layer 3 — Observation Domain Type
// ============================================================
// One reading of the source series: a calendar date and the
// monthly average land temperature (°C) recorded for it.
//
// Observations always travel in chronological order. By the
// time a Vec<Observation> leaves the data layer it has no
// missing values, so the windowing code can treat the values
// as a dense series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date:  NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Strip the dates and keep the raw values, in order.
pub fn values(observations: &[Observation]) -> Vec<f64> {
    observations.iter().map(|o| o.value).collect()
}
