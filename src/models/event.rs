//! Row types for the raw and cleaned event CSVs.

use serde::{Deserialize, Serialize};

/// One row of the source catalogue. Only the columns the pipeline reads are
/// declared; the rest (depth, significance, tsunami, time, status, place,
/// state, ...) are skipped by the deserializer and never written back out.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub date: String,
    // The public dataset spells the column `magnitudo`.
    #[serde(alias = "magnitudo", default, deserialize_with = "csv::invalid_option")]
    pub magnitude: Option<f64>,
    #[serde(default)]
    pub data_type: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub longitude: Option<f64>,
}

impl RawEvent {
    /// Year taken from the first four characters of `date`.
    pub fn year(&self) -> Option<i32> {
        self.date.get(..4).and_then(|prefix| prefix.parse().ok())
    }
}

/// A retained row. Every instance satisfies the cleaning filter
/// (`data_type == event type` and `magnitude >= threshold`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedEvent {
    #[serde(rename = "date")]
    pub year: i32,
    pub magnitude: f64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub longitude: Option<f64>,
    pub data_type: String,
}

impl CleanedEvent {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}
