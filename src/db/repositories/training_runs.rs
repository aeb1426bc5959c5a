use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_split, to_i64, to_u64},
};
use crate::models::{linear::MODEL_TYPE, LinearModel, PerformanceMetrics, TrainingRun};

const SELECT_COLUMNS: &str = "SELECT id, trained_at, slope, intercept, r2_score, rmse, mse, mae,
        evaluation, sample_count, first_year, last_year
     FROM training_runs";

fn row_to_training_run(row: &Row) -> Result<TrainingRun> {
    let trained_at: String = row.get("trained_at")?;
    let evaluation: String = row.get("evaluation")?;
    let sample_count: i64 = row.get("sample_count")?;

    Ok(TrainingRun {
        id: row.get("id")?,
        trained_at: parse_datetime(&trained_at, "trained_at")?,
        model: LinearModel {
            intercept: row.get("intercept")?,
            slope: row.get("slope")?,
        },
        metrics: PerformanceMetrics {
            r2_score: row.get("r2_score")?,
            rmse: row.get("rmse")?,
            mse: row.get("mse")?,
            mae: row.get("mae")?,
            evaluation: parse_split(&evaluation)?,
        },
        sample_count: to_u64(sample_count, "sample_count")?,
        first_year: row.get("first_year")?,
        last_year: row.get("last_year")?,
    })
}

impl Database {
    pub fn insert_training_run(&self, run: &TrainingRun) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO training_runs (id, trained_at, model_type, slope, intercept, r2_score, rmse, mse, mae, evaluation, sample_count, first_year, last_year)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    run.id,
                    run.trained_at.to_rfc3339(),
                    MODEL_TYPE,
                    run.model.slope,
                    run.model.intercept,
                    run.metrics.r2_score,
                    run.metrics.rmse,
                    run.metrics.mse,
                    run.metrics.mae,
                    run.metrics.evaluation.as_str(),
                    to_i64(run.sample_count)?,
                    run.first_year,
                    run.last_year,
                ],
            )
            .context("failed to insert training run")?;
        Ok(())
    }

    /// Most recently inserted training run, if any.
    pub fn latest_training_run(&self) -> Result<Option<TrainingRun>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY rowid DESC LIMIT 1"))?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_training_run(row)?)),
            None => Ok(None),
        }
    }

    pub fn get_training_run(&self, run_id: &str) -> Result<Option<TrainingRun>> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
        stmt.query_row(params![run_id], |row| Ok(row_to_training_run(row)))
            .optional()?
            .transpose()
    }

    /// Training runs, newest first.
    pub fn list_training_runs(&self, limit: usize) -> Result<Vec<TrainingRun>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY rowid DESC LIMIT ?1"))?;
        let mut rows = stmt.query(params![limit as i64])?;
        let mut runs = Vec::new();
        while let Some(row) = rows.next()? {
            runs.push(row_to_training_run(row)?);
        }
        Ok(runs)
    }
}
