use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};

use crate::error::ForecastError;
use crate::log_info;
use crate::models::{CleanedEvent, YearFrequency};

use super::cleaner::read_cleaned_events;

const ENABLE_LOGS: bool = true;

/// Events per year, one entry per distinct year, ordered by year ascending.
pub fn count_by_year(events: &[CleanedEvent]) -> Vec<YearFrequency> {
    let mut counts: BTreeMap<i32, u64> = BTreeMap::new();
    for event in events {
        *counts.entry(event.year).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(year, count)| YearFrequency { year, count })
        .collect()
}

/// Read the cleaned CSV, count events per year and write the `year,count`
/// table to `destination`.
pub fn build_frequency_table(cleaned: &Path, destination: &Path) -> Result<Vec<YearFrequency>> {
    let events = read_cleaned_events(cleaned)?;
    let table = count_by_year(&events);
    write_frequency_table(destination, &table)?;

    log_info!(
        "Wrote {} yearly counts from {} events to {}",
        table.len(),
        events.len(),
        destination.display()
    );
    Ok(table)
}

pub fn write_frequency_table(destination: &Path, table: &[YearFrequency]) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(destination)
        .with_context(|| format!("failed to create {}", destination.display()))?;
    writer.write_record(["year", "count"])?;
    for row in table {
        writer.write_record([row.year.to_string(), row.count.to_string()])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", destination.display()))?;
    Ok(())
}

/// Load a frequency table. Duplicate years are rejected since each year must
/// appear once.
pub fn read_frequency_table(path: &Path) -> Result<Vec<YearFrequency>> {
    if !path.exists() {
        return Err(ForecastError::missing("frequency table", path).into());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut merged: BTreeMap<i32, u64> = BTreeMap::new();
    for (index, record) in reader.deserialize::<YearFrequency>().enumerate() {
        let row = record.map_err(|err| {
            ForecastError::MalformedInput(format!(
                "{} row {}: {}",
                path.display(),
                index + 1,
                err
            ))
        })?;
        if merged.insert(row.year, row.count).is_some() {
            return Err(ForecastError::MalformedInput(format!(
                "{} lists year {} more than once",
                path.display(),
                row.year
            ))
            .into());
        }
    }

    Ok(merged
        .into_iter()
        .map(|(year, count)| YearFrequency { year, count })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(year: i32) -> CleanedEvent {
        CleanedEvent {
            year,
            magnitude: 4.0,
            latitude: Some(10.0),
            longitude: Some(20.0),
            data_type: "earthquake".into(),
        }
    }

    #[test]
    fn counts_each_year_once_sorted_by_year() {
        let events: Vec<_> = [2021, 2019, 2021, 2020, 2021, 2019]
            .into_iter()
            .map(event)
            .collect();

        let table = count_by_year(&events);
        assert_eq!(
            table,
            vec![
                YearFrequency { year: 2019, count: 2 },
                YearFrequency { year: 2020, count: 1 },
                YearFrequency { year: 2021, count: 3 },
            ]
        );
    }

    #[test]
    fn empty_input_gives_empty_table() {
        assert!(count_by_year(&[]).is_empty());
    }

    #[test]
    fn written_table_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frequency.csv");
        let table = vec![
            YearFrequency { year: 2000, count: 7 },
            YearFrequency { year: 2001, count: 0 },
        ];

        write_frequency_table(&path, &table).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "year,count\n2000,7\n2001,0\n"
        );
        assert_eq!(read_frequency_table(&path).unwrap(), table);
    }

    #[test]
    fn duplicate_years_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frequency.csv");
        fs::write(&path, "year,count\n2000,1\n2000,2\n").unwrap();

        let err = read_frequency_table(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::MalformedInput(_))
        ));
    }

    #[test]
    fn builds_table_from_cleaned_csv() {
        let dir = tempfile::tempdir().unwrap();
        let cleaned = dir.path().join("training.csv");
        fs::write(
            &cleaned,
            "date,magnitude,latitude,longitude,data_type\n\
             2010,4.0,1.0,2.0,earthquake\n\
             2012,3.9,,,earthquake\n\
             2010,5.5,3.0,4.0,earthquake\n",
        )
        .unwrap();
        let destination = dir.path().join("frequency.csv");

        let table = build_frequency_table(&cleaned, &destination).unwrap();
        assert_eq!(
            table,
            vec![
                YearFrequency { year: 2010, count: 2 },
                YearFrequency { year: 2012, count: 1 },
            ]
        );
        assert!(destination.exists());
    }
}
