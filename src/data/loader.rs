// ============================================================
// Layer 4 — Series Loader
// ============================================================
// Loads a dated temperature series from a CSV file using the
// `csv` crate, with dates parsed by `chrono`.
//
// Expected layout (Berkeley Earth GlobalTemperatures.csv):
//
//   dt,LandAverageTemperature,LandAverageTemperatureUncertainty,...
//   1750-01-01,3.034,3.574,...
//   1750-02-01,3.083,3.702,...
//
// Only two columns matter: the date column and the value
// column. Both are looked up by header name so extra columns
// and column order don't matter.
//
// Cleaning rules:
//   - a row whose date or value cell is empty is DROPPED
//     (early records have gaps; dropping them keeps the series
//     dense so windowing never sees a hole)
//   - a row whose date or value cannot be parsed is FATAL,
//     reported with its line number
//   - dates must be strictly increasing
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

use crate::domain::error::ForecastError;
use crate::domain::observation::Observation;
use crate::domain::traits::SeriesSource;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reads observations from a CSV file with a header row.
/// Implements the SeriesSource trait from Layer 3.
pub struct CsvSeriesSource {
    path:         PathBuf,
    date_column:  String,
    value_column: String,
}

impl CsvSeriesSource {
    pub fn new(
        path:         impl Into<PathBuf>,
        date_column:  impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            path:         path.into(),
            date_column:  date_column.into(),
            value_column: value_column.into(),
        }
    }
}

impl SeriesSource for CsvSeriesSource {
    fn load(&self) -> Result<Vec<Observation>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Cannot open data file '{}'", self.path.display()))?;

        let headers   = reader.headers()?.clone();
        let date_idx  = column_index(&headers, &self.date_column)?;
        let value_idx = column_index(&headers, &self.value_column)?;

        let mut observations: Vec<Observation> = Vec::new();
        let mut dropped = 0usize;

        for (row, record) in reader.records().enumerate() {
            // +2: one for the header, one because humans count from 1
            let line   = row + 2;
            let record = record.with_context(|| format!("Malformed CSV record on line {line}"))?;

            let raw_date  = record.get(date_idx).unwrap_or("").trim();
            let raw_value = record.get(value_idx).unwrap_or("").trim();
            if raw_date.is_empty() || raw_value.is_empty() {
                dropped += 1;
                continue;
            }

            let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
                .with_context(|| format!("Bad date '{raw_date}' on line {line}"))?;
            let value: f64 = raw_value
                .parse()
                .with_context(|| format!("Bad value '{raw_value}' on line {line}"))?;
            if !value.is_finite() {
                bail!("Non-finite value '{raw_value}' on line {line}");
            }

            if let Some(prev) = observations.last() {
                if date <= prev.date {
                    bail!(
                        "Dates must be strictly increasing: {} follows {} on line {line}",
                        date, prev.date
                    );
                }
            }
            observations.push(Observation::new(date, value));
        }

        if observations.is_empty() {
            return Err(ForecastError::EmptySeries)
                .with_context(|| format!("No usable rows in '{}'", self.path.display()));
        }

        tracing::info!(
            "Loaded {} observations from '{}' ({} rows with missing values dropped)",
            observations.len(),
            self.path.display(),
            dropped,
        );
        Ok(observations)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .with_context(|| format!("Column '{name}' not found in CSV header"))
}
