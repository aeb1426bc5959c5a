use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::TrainingConfig;
use crate::error::ForecastError;
use crate::models::{CleanedEvent, RawEvent};
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

/// Row filter applied while cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningFilter {
    pub event_type: String,
    pub min_magnitude: f64,
}

impl Default for CleaningFilter {
    fn default() -> Self {
        TrainingConfig::default().into()
    }
}

impl From<TrainingConfig> for CleaningFilter {
    fn from(config: TrainingConfig) -> Self {
        Self {
            event_type: config.event_type,
            min_magnitude: config.min_magnitude,
        }
    }
}

impl CleaningFilter {
    /// Turn a raw row into a cleaned one, or `None` when it is filtered out.
    /// Malformed rows (no year, no magnitude) are also `None`; the caller
    /// tells them apart with [`RawEvent::year`].
    pub fn apply(&self, raw: &RawEvent) -> Option<CleanedEvent> {
        let year = raw.year()?;
        let magnitude = raw.magnitude?;

        if raw.data_type != self.event_type || !(magnitude >= self.min_magnitude) {
            return None;
        }

        Some(CleanedEvent {
            year,
            magnitude,
            latitude: raw.latitude,
            longitude: raw.longitude,
            data_type: raw.data_type.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_malformed: usize,
}

/// Reduce the raw catalogue at `source` to the cleaned CSV at `destination`.
///
/// The destination is only created once the source has been fully read, so a
/// missing or unreadable source leaves no partial output behind.
pub fn clean_events(
    source: &Path,
    destination: &Path,
    filter: &CleaningFilter,
) -> Result<CleaningReport> {
    if !source.exists() {
        return Err(ForecastError::missing("raw event CSV", source).into());
    }

    let mut reader = csv::Reader::from_path(source)
        .with_context(|| format!("failed to open {}", source.display()))?;

    let mut report = CleaningReport::default();
    let mut kept = Vec::new();

    for (index, record) in reader.deserialize::<RawEvent>().enumerate() {
        report.rows_read += 1;
        let raw = match record {
            Ok(raw) => raw,
            Err(err) => {
                log_warn!("Skipping unreadable row {}: {}", index + 1, err);
                report.rows_malformed += 1;
                continue;
            }
        };

        if raw.year().is_none() || raw.magnitude.is_none() {
            report.rows_malformed += 1;
            continue;
        }

        if let Some(event) = filter.apply(&raw) {
            kept.push(event);
        }
    }

    write_cleaned_events(destination, &kept)?;
    report.rows_kept = kept.len();

    if report.rows_malformed > 0 {
        log_warn!(
            "Dropped {} malformed rows from {}",
            report.rows_malformed,
            source.display()
        );
    }
    log_info!(
        "Cleaned {}: kept {} of {} rows (type={}, magnitude>={}) -> {}",
        source.display(),
        report.rows_kept,
        report.rows_read,
        filter.event_type,
        filter.min_magnitude,
        destination.display()
    );

    Ok(report)
}

fn write_cleaned_events(destination: &Path, events: &[CleanedEvent]) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(destination)
        .with_context(|| format!("failed to create {}", destination.display()))?;
    if events.is_empty() {
        writer.write_record(["date", "magnitude", "latitude", "longitude", "data_type"])?;
    }
    for event in events {
        writer.serialize(event)?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", destination.display()))?;
    Ok(())
}

/// Load the cleaned CSV written by [`clean_events`].
pub fn read_cleaned_events(path: &Path) -> Result<Vec<CleanedEvent>> {
    if !path.exists() {
        return Err(ForecastError::missing("cleaned event CSV", path).into());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut events = Vec::new();
    let mut skipped = 0usize;
    for record in reader.deserialize::<CleanedEvent>() {
        match record {
            Ok(event) => events.push(event),
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        log_warn!("Skipped {} unparseable rows in {}", skipped, path.display());
    }
    Ok(events)
}
