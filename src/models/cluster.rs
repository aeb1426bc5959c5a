//! Exploratory spatial clustering results. Informational only; neither the
//! predictor nor the exporter reads these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterModel {
    pub centers: Vec<GeoPoint>,
    pub cluster_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterSample {
    pub latitude: f64,
    pub longitude: f64,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub index: usize,
    pub size: usize,
    pub center: GeoPoint,
    pub samples: Vec<ClusterSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRun {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub seed: u64,
    pub point_count: usize,
    pub inertia: f64,
    pub clusters: Vec<ClusterSummary>,
}

impl ClusterRun {
    pub fn model(&self) -> ClusterModel {
        ClusterModel {
            centers: self.clusters.iter().map(|cluster| cluster.center).collect(),
            cluster_count: self.clusters.len(),
        }
    }
}
