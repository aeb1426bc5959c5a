use anyhow::{Context, Result};
use rusqlite::params;
use serde_json::{from_str, to_string};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, to_i64, to_u64, to_usize},
};
use crate::models::{ClusterRun, ClusterSample, ClusterSummary, GeoPoint};

impl Database {
    /// Store a k-means run and its centers in one transaction.
    pub fn insert_cluster_run(&mut self, run: &ClusterRun) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .context("failed to open cluster run transaction")?;

        tx.execute(
            "INSERT INTO cluster_runs (id, created_at, seed, cluster_count, point_count, inertia)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run.id,
                run.created_at.to_rfc3339(),
                to_i64(run.seed)?,
                to_i64(run.clusters.len() as u64)?,
                to_i64(run.point_count as u64)?,
                run.inertia,
            ],
        )
        .context("failed to insert cluster run")?;

        for cluster in &run.clusters {
            let samples_json =
                to_string(&cluster.samples).context("failed to serialize cluster samples")?;
            tx.execute(
                "INSERT INTO cluster_centers (run_id, cluster_index, latitude, longitude, size, samples_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    run.id,
                    to_i64(cluster.index as u64)?,
                    cluster.center.latitude,
                    cluster.center.longitude,
                    to_i64(cluster.size as u64)?,
                    samples_json,
                ],
            )
            .with_context(|| format!("failed to insert center {}", cluster.index))?;
        }

        tx.commit().context("failed to commit cluster run")?;
        Ok(())
    }

    pub fn latest_cluster_run(&self) -> Result<Option<ClusterRun>> {
        let header = {
            let mut stmt = self.conn.prepare(
                "SELECT id, created_at, seed, point_count, inertia
                 FROM cluster_runs
                 ORDER BY rowid DESC
                 LIMIT 1",
            )?;
            let mut rows = stmt.query([])?;
            match rows.next()? {
                Some(row) => Some((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, f64>(4)?,
                )),
                None => None,
            }
        };

        let Some((id, created_at, seed, point_count, inertia)) = header else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT cluster_index, latitude, longitude, size, samples_json
             FROM cluster_centers
             WHERE run_id = ?1
             ORDER BY cluster_index ASC",
        )?;
        let mut rows = stmt.query(params![id])?;
        let mut clusters = Vec::new();
        while let Some(row) = rows.next()? {
            let samples_json: String = row.get(4)?;
            let samples: Vec<ClusterSample> =
                from_str(&samples_json).context("failed to parse cluster samples")?;
            clusters.push(ClusterSummary {
                index: to_usize(row.get(0)?, "cluster_index")?,
                center: GeoPoint {
                    latitude: row.get(1)?,
                    longitude: row.get(2)?,
                },
                size: to_usize(row.get(3)?, "size")?,
                samples,
            });
        }

        Ok(Some(ClusterRun {
            id,
            created_at: parse_datetime(&created_at, "created_at")?,
            seed: to_u64(seed, "seed")?,
            point_count: to_usize(point_count, "point_count")?,
            inertia,
            clusters,
        }))
    }
}
