//! k-means over (latitude, longitude) pairs, k-means++ seeded.
//!
//! Distances are plain Euclidean in degree space. That is fine for the
//! exploratory grouping this feeds and keeps the centroids comparable with the
//! input coordinates.

use anyhow::{anyhow, Result};
use linfa::prelude::*;
use linfa_clustering::{KMeans, KMeansInit};
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, SeedableRng};

use crate::config::ClusteringConfig;
use crate::error::ForecastError;
use crate::models::GeoPoint;

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    pub centers: Vec<GeoPoint>,
    /// Cluster index for every input point, in input order.
    pub labels: Vec<usize>,
    /// Sum of squared distances from each point to its center.
    pub inertia: f64,
}

impl KMeansResult {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centers.len()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

fn distinct_points(points: &[(f64, f64)]) -> usize {
    let mut keys: Vec<(u64, u64)> = points
        .iter()
        .map(|&(lat, lon)| (lat.to_bits(), lon.to_bits()))
        .collect();
    keys.sort_unstable();
    keys.dedup();
    keys.len()
}

pub fn kmeans(points: &[(f64, f64)], config: &ClusteringConfig) -> Result<KMeansResult> {
    let k = config.cluster_count;
    if k == 0 {
        return Err(ForecastError::MalformedInput("cluster count must be positive".into()).into());
    }
    let distinct = distinct_points(points);
    if distinct < k {
        return Err(ForecastError::InsufficientData {
            needed: k,
            found: distinct,
        }
        .into());
    }

    let records = Array2::from_shape_fn((points.len(), 2), |(row, col)| {
        if col == 0 {
            points[row].0
        } else {
            points[row].1
        }
    });
    let dataset = DatasetBase::from(records.clone());

    let model = KMeans::params_with_rng(k, StdRng::seed_from_u64(config.seed))
        .init_method(KMeansInit::KMeansPlusPlus)
        .max_n_iterations(config.max_iterations.max(1) as u64)
        .tolerance(config.tolerance)
        .fit(&dataset)
        .map_err(|err| anyhow!("k-means failed: {err}"))?;

    let labels: Array1<usize> = model.predict(&records);
    let centers: Vec<GeoPoint> = model
        .centroids()
        .rows()
        .into_iter()
        .map(|row| GeoPoint {
            latitude: row[0],
            longitude: row[1],
        })
        .collect();

    let inertia: f64 = points
        .iter()
        .zip(labels.iter())
        .map(|(&(lat, lon), &label)| {
            let center = centers[label];
            (lat - center.latitude).powi(2) + (lon - center.longitude).powi(2)
        })
        .sum();

    Ok(KMeansResult {
        centers,
        labels: labels.to_vec(),
        inertia,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(k: usize) -> ClusteringConfig {
        ClusteringConfig {
            cluster_count: k,
            ..ClusteringConfig::default()
        }
    }

    fn two_blobs() -> Vec<(f64, f64)> {
        let mut points = Vec::new();
        for i in 0..10 {
            let jitter = i as f64 * 0.01;
            points.push((35.0 + jitter, -118.0 - jitter));
            points.push((61.0 - jitter, -150.0 + jitter));
        }
        points
    }

    #[test]
    fn separates_distant_groups() {
        let points = two_blobs();
        let result = kmeans(&points, &config(2)).unwrap();

        assert_eq!(result.cluster_sizes(), vec![10, 10]);
        // Points alternate between blobs, so labels must alternate too.
        for pair in result.labels.chunks(2) {
            assert_ne!(pair[0], pair[1]);
        }
        for center in &result.centers {
            let near_ca = (center.latitude - 35.045).abs() < 1e-6;
            let near_ak = (center.latitude - 60.955).abs() < 1e-6;
            assert!(near_ca || near_ak, "unexpected center {center:?}");
        }
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let points: Vec<(f64, f64)> = (0..200)
            .map(|i| {
                let t = i as f64;
                ((t * 7.3) % 90.0 - 45.0, (t * 13.7) % 360.0 - 180.0)
            })
            .collect();

        let first = kmeans(&points, &config(8)).unwrap();
        let second = kmeans(&points, &config(8)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.centers.len(), 8);
        assert_eq!(first.labels.len(), 200);
        assert_eq!(first.cluster_sizes().iter().sum::<usize>(), 200);
    }

    #[test]
    fn fewer_points_than_clusters_is_rejected() {
        let err = kmeans(&[(0.0, 0.0), (1.0, 1.0)], &config(8)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::InsufficientData { needed: 8, found: 2 })
        ));
    }

    #[test]
    fn duplicates_do_not_count_towards_k() {
        let points = vec![(1.0, 1.0); 5];
        let err = kmeans(&points, &config(3)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::InsufficientData { needed: 3, found: 1 })
        ));
    }

    #[test]
    fn zero_clusters_is_malformed() {
        let err = kmeans(&two_blobs(), &config(0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::MalformedInput(_))
        ));
    }
}
