use anyhow::{anyhow, Result};
use linfa::metrics::SingleTargetRegression;
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

use crate::error::ForecastError;
use crate::models::{LinearModel, MetricSplit, PerformanceMetrics, YearFrequency};

fn years(points: &[YearFrequency]) -> Array2<f64> {
    Array2::from_shape_fn((points.len(), 1), |(row, _)| f64::from(points[row].year))
}

fn counts(points: &[YearFrequency]) -> Array1<f64> {
    points.iter().map(|p| p.count as f64).collect()
}

/// Least-squares line through `(year, count)` points.
pub fn fit_linear(points: &[YearFrequency]) -> Result<LinearModel> {
    if points.len() < 2 {
        return Err(ForecastError::InsufficientData {
            needed: 2,
            found: points.len(),
        }
        .into());
    }
    if points.iter().all(|p| p.year == points[0].year) {
        return Err(ForecastError::MalformedInput(
            "all training points share the same year".into(),
        )
        .into());
    }

    let dataset = Dataset::new(years(points), counts(points));
    let fitted = LinearRegression::new()
        .fit(&dataset)
        .map_err(|err| ForecastError::MalformedInput(format!("linear fit failed: {err}")))?;

    let model = LinearModel::new(fitted.params()[0], fitted.intercept());
    if !model.slope.is_finite() || !model.intercept.is_finite() {
        return Err(ForecastError::MalformedInput(
            "linear fit produced non-finite coefficients".into(),
        )
        .into());
    }
    Ok(model)
}

/// R², MSE, RMSE and MAE of `model` against `points`.
///
/// R² is clamped into `[0, 1]`; a constant target scores 1 when the line
/// reproduces it and 0 otherwise.
pub fn score(
    model: &LinearModel,
    points: &[YearFrequency],
    split: MetricSplit,
) -> Result<PerformanceMetrics> {
    if points.is_empty() {
        return Ok(PerformanceMetrics {
            r2_score: 0.0,
            rmse: 0.0,
            mse: Some(0.0),
            mae: Some(0.0),
            evaluation: split,
        });
    }

    let observed = counts(points);
    let predicted: Array1<f64> = points
        .iter()
        .map(|p| model.evaluate(f64::from(p.year)))
        .collect();

    let metric_error = |err: linfa::Error| anyhow!("failed to score model: {err}");
    let mse = predicted.mean_squared_error(&observed).map_err(metric_error)?;
    let mae = predicted.mean_absolute_error(&observed).map_err(metric_error)?;
    let r2 = if observed.iter().all(|&y| y == observed[0]) {
        if mse <= f64::EPSILON {
            1.0
        } else {
            0.0
        }
    } else {
        predicted.r2(&observed).map_err(metric_error)?
    };

    Ok(PerformanceMetrics {
        r2_score: r2.clamp(0.0, 1.0),
        rmse: mse.sqrt(),
        mse: Some(mse),
        mae: Some(mae),
        evaluation: split,
    })
}

/// Split off the latest `holdout_years` points for evaluation.
///
/// Returns `None` when the split is disabled or would leave fewer than two
/// years to fit on.
pub fn holdout_split(
    points: &[YearFrequency],
    holdout_years: usize,
) -> Option<(Vec<YearFrequency>, Vec<YearFrequency>)> {
    if holdout_years == 0 || points.len() < holdout_years + 2 {
        return None;
    }

    let mut ordered = points.to_vec();
    ordered.sort_by_key(|p| p.year);
    let test = ordered.split_off(ordered.len() - holdout_years);
    Some((ordered, test))
}
