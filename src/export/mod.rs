//! Standalone JavaScript artifacts generated from the model metadata.
//!
//! The exported module only needs the two coefficients, so it runs without
//! the model store. Its forecast rule is the one [`LinearModel::predict_count`]
//! implements, and `getModelInfo()` returns the record [`Predictor::model_info`]
//! builds, embedded verbatim.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context as _, Result};
use chrono::Datelike;
use serde::Serialize;
use tera::{Context, Tera};

use crate::log_info;
use crate::models::{LinearModel, ModelMetadata};
use crate::predictor::validation::{
    MAX_TYPICAL_YEAR, MIN_TYPICAL_YEAR, NOT_A_NUMBER, OUT_OF_RANGE,
};
use crate::predictor::{Predictor, MAX_RANGE_YEARS};
use crate::training::read_metadata;

const ENABLE_LOGS: bool = true;

pub const MODEL_JS: &str = "earthquake_model.js";
pub const DEMO_HTML: &str = "earthquake_demo.html";
pub const NODE_EXAMPLE: &str = "nodejs_example.js";

const MODEL_TEMPLATE: &str = include_str!("templates/earthquake_model.js");
const DEMO_TEMPLATE: &str = include_str!("templates/earthquake_demo.html");
const NODE_TEMPLATE: &str = include_str!("templates/nodejs_example.js");

/// Rendered file contents, keyed by output file name.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifacts {
    pub model_js: String,
    pub demo_html: String,
    pub node_example: String,
}

impl ExportArtifacts {
    fn files(&self) -> [(&'static str, &str); 3] {
        [
            (MODEL_JS, self.model_js.as_str()),
            (DEMO_HTML, self.demo_html.as_str()),
            (NODE_EXAMPLE, self.node_example.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub files: Vec<PathBuf>,
    pub model: LinearModel,
    pub r2_score: f64,
}

/// Shortest round-trip form, which is also a valid JavaScript literal.
fn js_number(value: f64, name: &str) -> Result<String> {
    if !value.is_finite() {
        bail!("{name} is not a finite number ({value})");
    }
    Ok(format!("{value}"))
}

fn templates() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_templates(vec![
        (MODEL_JS, MODEL_TEMPLATE),
        (DEMO_HTML, DEMO_TEMPLATE),
        (NODE_EXAMPLE, NODE_TEMPLATE),
    ])
    .context("failed to load export templates")?;
    Ok(tera)
}

fn model_context(metadata: &ModelMetadata) -> Result<Context> {
    let model = metadata.model_coefficients;
    let metrics = metadata.performance_metrics;
    let info = Predictor::from_parts(model, metadata.clone()).model_info();
    let model_info = serde_json::to_string_pretty(&info)
        .context("failed to serialize model info")?
        .replace('\n', "\n        ");

    let mut context = Context::new();
    context.insert("slope", &js_number(model.slope, "slope")?);
    context.insert("intercept", &js_number(model.intercept, "intercept")?);
    context.insert("r2_score", &js_number(metrics.r2_score, "r2_score")?);
    context.insert("slope_fixed", &format!("{:.4}", model.slope));
    context.insert("intercept_fixed", &format!("{:.4}", model.intercept));
    context.insert("r2_fixed", &format!("{:.4}", metrics.r2_score));
    context.insert("evaluation", metrics.evaluation.as_str());
    context.insert("training_date", &metadata.training_date.to_string());
    context.insert("model_info", &model_info);
    context.insert("not_a_number", &serde_json::to_string(NOT_A_NUMBER)?);
    context.insert("out_of_range", &serde_json::to_string(OUT_OF_RANGE)?);
    context.insert("min_year", &MIN_TYPICAL_YEAR);
    context.insert("max_year", &MAX_TYPICAL_YEAR);
    context.insert("max_range_years", &MAX_RANGE_YEARS);
    Ok(context)
}

fn example_context(metadata: &ModelMetadata) -> Context {
    let next_year = metadata.training_date.year() + 1;
    let example_years = (next_year..next_year + 6)
        .map(|year| year.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut context = Context::new();
    context.insert("example_year", &next_year);
    context.insert("example_years", &example_years);
    context.insert("range_start", &next_year);
    context.insert("range_end", &(next_year + 10));
    context
}

/// Render all artifacts in memory.
pub fn render(metadata: &ModelMetadata) -> Result<ExportArtifacts> {
    let tera = templates()?;
    let model = model_context(metadata)?;

    let mut demo = Context::new();
    demo.insert("min_year", &MIN_TYPICAL_YEAR);
    demo.insert("max_year", &MAX_TYPICAL_YEAR);

    Ok(ExportArtifacts {
        model_js: tera
            .render(MODEL_JS, &model)
            .with_context(|| format!("failed to render {MODEL_JS}"))?,
        demo_html: tera
            .render(DEMO_HTML, &demo)
            .with_context(|| format!("failed to render {DEMO_HTML}"))?,
        node_example: tera
            .render(NODE_EXAMPLE, &example_context(metadata))
            .with_context(|| format!("failed to render {NODE_EXAMPLE}"))?,
    })
}

/// Read the metadata at `metadata_path` and write the artifacts into
/// `export_dir`. Nothing is written unless the metadata loads and every
/// artifact renders.
pub fn export_model(metadata_path: &Path, export_dir: &Path) -> Result<ExportReport> {
    let metadata = read_metadata(metadata_path)?;
    let artifacts = render(&metadata)?;

    fs::create_dir_all(export_dir)
        .with_context(|| format!("failed to create {}", export_dir.display()))?;

    let mut files = Vec::new();
    for (name, contents) in artifacts.files() {
        let path = export_dir.join(name);
        fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        files.push(path);
    }

    log_info!(
        "Exported model (slope {:.4}, intercept {:.4}) to {}",
        metadata.model_coefficients.slope,
        metadata.model_coefficients.intercept,
        export_dir.display()
    );

    Ok(ExportReport {
        files,
        model: metadata.model_coefficients,
        r2_score: metadata.performance_metrics.r2_score,
    })
}
