use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::cleaning::{count_by_year, read_cleaned_events, read_frequency_table};
use crate::config::{ClusteringConfig, PipelineConfig};
use crate::db::Database;
use crate::error::ForecastError;
use crate::models::{
    CleanedEvent, ClusterRun, ClusterSample, ClusterSummary, MetricSplit, ModelMetadata,
    TrainingRun, YearFrequency,
};
use crate::{log_info, log_warn};

use super::{
    kmeans::{kmeans, KMeansResult},
    metadata::write_metadata,
    regression::{fit_linear, holdout_split, score},
};

const ENABLE_LOGS: bool = true;

/// Where the (year, count) training points come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrainingSource {
    /// Aggregate the cleaned event CSV.
    #[default]
    CleanedEvents,
    /// Use the frequency table as written by the aggregator.
    FrequencyTable,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub run: TrainingRun,
    pub metadata: ModelMetadata,
    pub points: Vec<YearFrequency>,
}

fn load_points(config: &PipelineConfig, source: TrainingSource) -> Result<Vec<YearFrequency>> {
    match source {
        TrainingSource::CleanedEvents => {
            let events = read_cleaned_events(&config.cleaned_csv)?;
            Ok(count_by_year(&events))
        }
        TrainingSource::FrequencyTable => read_frequency_table(&config.frequency_csv),
    }
}

/// Fit the trend line, then persist it to the model store and the metadata
/// file. Nothing is persisted when fitting fails.
pub fn train_model(config: &PipelineConfig, source: TrainingSource) -> Result<TrainingReport> {
    let points = load_points(config, source)?;
    let holdout = config.training.holdout_years;

    let (model, metrics, fitted_on) = match holdout_split(&points, holdout) {
        Some((train, test)) => {
            let model = fit_linear(&train)?;
            let metrics = score(&model, &test, MetricSplit::Holdout)?;
            log_info!(
                "Fitted on {} years, scored on the latest {} held-out years",
                train.len(),
                test.len()
            );
            (model, metrics, train)
        }
        None => {
            if holdout > 0 {
                log_warn!(
                    "Only {} years available; hold-out of {} disabled, scoring on training data",
                    points.len(),
                    holdout
                );
            }
            let model = fit_linear(&points)?;
            let metrics = score(&model, &points, MetricSplit::Training)?;
            (model, metrics, points.clone())
        }
    };

    let (first_year, last_year) = match (fitted_on.first(), fitted_on.last()) {
        (Some(first), Some(last)) => (first.year, last.year),
        _ => {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                found: 0,
            }
            .into())
        }
    };

    let trained_at = Utc::now();
    let run = TrainingRun {
        id: Uuid::new_v4().to_string(),
        trained_at,
        model,
        metrics,
        sample_count: fitted_on.len() as u64,
        first_year,
        last_year,
    };

    let db = Database::open(config.model_db.clone())?;
    db.insert_training_run(&run)?;

    let metadata = ModelMetadata::new(model, metrics, trained_at.date_naive(), Some(run.id.clone()));
    write_metadata(&config.metadata_json, &metadata)?;

    log_info!(
        "Trained run {}: count = {:.4} * year + {:.4} (R²={:.4}, RMSE={:.2}, {})",
        run.id,
        model.slope,
        model.intercept,
        metrics.r2_score,
        metrics.rmse,
        metrics.evaluation.as_str()
    );

    Ok(TrainingReport {
        run,
        metadata,
        points,
    })
}

/// Per-cluster sizes, centers and the first few member points in input order.
pub fn summarize_clusters(
    events: &[&CleanedEvent],
    result: &KMeansResult,
    samples_per_cluster: usize,
) -> Vec<ClusterSummary> {
    let sizes = result.cluster_sizes();
    let mut clusters: Vec<ClusterSummary> = result
        .centers
        .iter()
        .enumerate()
        .map(|(index, &center)| ClusterSummary {
            index,
            size: sizes[index],
            center,
            samples: Vec::new(),
        })
        .collect();

    for (event, &label) in events.iter().zip(&result.labels) {
        let cluster = &mut clusters[label];
        if cluster.samples.len() >= samples_per_cluster {
            continue;
        }
        if let Some((latitude, longitude)) = event.coordinates() {
            cluster.samples.push(ClusterSample {
                latitude,
                longitude,
                year: event.year,
            });
        }
    }

    clusters
}

/// Cluster events with usable coordinates. Rows without them are dropped.
pub fn cluster_cleaned_events(
    events: &[CleanedEvent],
    config: &ClusteringConfig,
) -> Result<ClusterRun> {
    config.validate()?;

    let located: Vec<&CleanedEvent> = events
        .iter()
        .filter(|event| event.coordinates().is_some())
        .collect();

    let dropped = events.len() - located.len();
    if dropped > 0 {
        log_warn!("Dropped {} events without usable coordinates", dropped);
    }

    let points: Vec<(f64, f64)> = located.iter().filter_map(|e| e.coordinates()).collect();
    let result = kmeans(&points, config)?;

    Ok(ClusterRun {
        id: Uuid::new_v4().to_string(),
        created_at: Utc::now(),
        seed: config.seed,
        point_count: points.len(),
        inertia: result.inertia,
        clusters: summarize_clusters(&located, &result, config.samples_per_cluster),
    })
}

/// Exploratory k-means over the cleaned events; the run is kept in the model
/// store for later inspection.
pub fn cluster_events(config: &PipelineConfig) -> Result<ClusterRun> {
    let events = read_cleaned_events(&config.cleaned_csv)?;
    let run = cluster_cleaned_events(&events, &config.clustering)?;

    let mut db = Database::open(config.model_db.clone())?;
    db.insert_cluster_run(&run)?;

    log_info!(
        "Clustered {} points into {} groups (inertia {:.3})",
        run.point_count,
        run.clusters.len(),
        run.inertia
    );
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::metadata::read_metadata;
    use std::fs;

    fn cleaned_csv(rows: &[(i32, f64, f64)]) -> String {
        let mut out = String::from("date,magnitude,latitude,longitude,data_type\n");
        for (year, lat, lon) in rows {
            out.push_str(&format!("{year},4.2,{lat},{lon},earthquake\n"));
        }
        out
    }

    fn config_in(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig::rooted(dir)
    }

    #[test]
    fn training_persists_store_row_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(config.cleaned_csv.parent().unwrap()).unwrap();

        // 1, 2, 3 events in 2000, 2001, 2002
        let rows = [
            (2000, 1.0, 1.0),
            (2001, 1.0, 1.0),
            (2001, 1.0, 1.0),
            (2002, 1.0, 1.0),
            (2002, 1.0, 1.0),
            (2002, 1.0, 1.0),
        ];
        fs::write(&config.cleaned_csv, cleaned_csv(&rows)).unwrap();

        let report = train_model(&config, TrainingSource::CleanedEvents).unwrap();
        assert!((report.run.model.slope - 1.0).abs() < 1e-6);
        assert!((report.run.model.intercept + 1999.0).abs() < 1e-3);
        assert_eq!(report.run.sample_count, 3);
        assert_eq!((report.run.first_year, report.run.last_year), (2000, 2002));

        let metadata = read_metadata(&config.metadata_json).unwrap();
        assert_eq!(metadata.features, vec!["year".to_string()]);
        assert_eq!(metadata.target, "earthquake_count");
        assert_eq!(metadata.run_id.as_deref(), Some(report.run.id.as_str()));
        assert_eq!(metadata.performance_metrics.evaluation, MetricSplit::Training);

        let db = Database::open_existing(config.model_db.clone()).unwrap();
        let stored = db.latest_training_run().unwrap().unwrap();
        assert_eq!(stored.id, report.run.id);
    }

    #[test]
    fn holdout_scores_on_latest_years() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.training.holdout_years = 1;
        fs::create_dir_all(config.frequency_csv.parent().unwrap()).unwrap();
        fs::write(
            &config.frequency_csv,
            "year,count\n2000,10\n2001,20\n2002,30\n2003,100\n",
        )
        .unwrap();

        let report = train_model(&config, TrainingSource::FrequencyTable).unwrap();
        assert_eq!(report.run.metrics.evaluation, MetricSplit::Holdout);
        assert_eq!(report.run.last_year, 2002);
        // Line through the first three years predicts 40 for 2003.
        assert!((report.run.metrics.rmse - 60.0).abs() < 1e-4);
    }

    #[test]
    fn failed_fit_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(config.cleaned_csv.parent().unwrap()).unwrap();
        fs::write(&config.cleaned_csv, cleaned_csv(&[(2000, 1.0, 1.0)])).unwrap();

        let err = train_model(&config, TrainingSource::CleanedEvents).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::InsufficientData { .. })
        ));
        assert!(!config.model_db.exists());
        assert!(!config.metadata_json.exists());
    }

    #[test]
    fn clustering_reports_sizes_and_samples() {
        let mut events = Vec::new();
        for i in 0..6 {
            let jitter = f64::from(i) * 0.01;
            events.push(CleanedEvent {
                year: 2000 + i,
                magnitude: 4.0,
                latitude: Some(35.0 + jitter),
                longitude: Some(-118.0),
                data_type: "earthquake".into(),
            });
            events.push(CleanedEvent {
                year: 2000 + i,
                magnitude: 4.0,
                latitude: Some(-33.0 - jitter),
                longitude: Some(151.0),
                data_type: "earthquake".into(),
            });
        }
        events.push(CleanedEvent {
            year: 2010,
            magnitude: 4.0,
            latitude: None,
            longitude: None,
            data_type: "earthquake".into(),
        });

        let config = ClusteringConfig {
            cluster_count: 2,
            samples_per_cluster: 3,
            ..ClusteringConfig::default()
        };
        let run = cluster_cleaned_events(&events, &config).unwrap();

        assert_eq!(run.point_count, 12);
        assert_eq!(run.seed, 42);
        let mut sizes: Vec<usize> = run.clusters.iter().map(|c| c.size).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![6, 6]);
        for cluster in &run.clusters {
            assert_eq!(cluster.samples.len(), 3);
            assert_eq!(cluster.samples[0].year, 2000);
            assert_eq!(cluster.samples[2].year, 2002);
        }
    }

    #[test]
    fn cluster_run_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.clustering.cluster_count = 2;
        fs::create_dir_all(config.cleaned_csv.parent().unwrap()).unwrap();
        fs::write(
            &config.cleaned_csv,
            cleaned_csv(&[(2000, 10.0, 10.0), (2001, 10.1, 10.1), (2002, -40.0, 100.0)]),
        )
        .unwrap();

        let run = cluster_events(&config).unwrap();
        let db = Database::open_existing(config.model_db.clone()).unwrap();
        let stored = db.latest_cluster_run().unwrap().unwrap();
        assert_eq!(stored.id, run.id);
        assert_eq!(stored.clusters.len(), 2);
    }

    #[test]
    fn unstorable_seed_fails_before_clustering() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.clustering.seed = u64::MAX;
        fs::create_dir_all(config.cleaned_csv.parent().unwrap()).unwrap();
        fs::write(&config.cleaned_csv, cleaned_csv(&[(2000, 10.0, 10.0), (2001, -40.0, 100.0)]))
            .unwrap();

        let err = cluster_events(&config).unwrap_err();
        assert!(format!("{err:#}").contains("clustering.seed"));
        assert!(!config.model_db.exists());
    }
}
