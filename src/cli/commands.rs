use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::cleaning::{build_frequency_table, clean_events, CleaningFilter};
use crate::config::{PipelineConfig, CONFIG_FILE_NAME};
use crate::db::Database;
use crate::export::export_model;
use crate::models::YearPrediction;
use crate::predictor::Predictor;
use crate::server;
use crate::training::{cluster_events, train_model, TrainingSource};

use super::{Command, OutputArgs, PredictArgs, TrainArgs};

/// `12345` -> `"12,345"`
pub fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_predictions(predictions: &[YearPrediction]) {
    for prediction in predictions {
        println!(
            "  {}: {} earthquakes",
            prediction.year,
            group_digits(prediction.predicted_earthquakes)
        );
    }
}

pub fn dispatch(command: Command, config: PipelineConfig, config_path: &Path) -> Result<()> {
    match command {
        Command::Clean => clean(&config),
        Command::Frequency => frequency(&config),
        Command::Train(args) => train(config, args),
        Command::Cluster => cluster(&config),
        Command::Predict(args) => predict(&config, args),
        Command::Info(args) => info(&config, args),
        Command::History { limit } => history(&config, limit),
        Command::Export => export(&config),
        Command::Serve { port, no_browser } => {
            let port = port.unwrap_or(config.server.port);
            let open_browser = config.server.open_browser && !no_browser;
            server::serve_blocking(config.export_dir.clone(), port, open_browser)
        }
        Command::Pipeline => pipeline(config),
        Command::InitConfig { force } => init_config(config_path, force),
    }
}

fn clean(config: &PipelineConfig) -> Result<()> {
    let filter = CleaningFilter::from(config.training.clone());
    let report = clean_events(&config.raw_csv, &config.cleaned_csv, &filter)?;
    println!(
        "Kept {} of {} rows ({} malformed) -> {}",
        report.rows_kept,
        report.rows_read,
        report.rows_malformed,
        config.cleaned_csv.display()
    );
    Ok(())
}

fn frequency(config: &PipelineConfig) -> Result<()> {
    let table = build_frequency_table(&config.cleaned_csv, &config.frequency_csv)?;
    println!(
        "Wrote {} yearly counts -> {}",
        table.len(),
        config.frequency_csv.display()
    );
    Ok(())
}

fn train(mut config: PipelineConfig, args: TrainArgs) -> Result<()> {
    if let Some(holdout) = args.holdout_years {
        config.training.holdout_years = holdout;
    }
    let source = if args.from_frequency {
        TrainingSource::FrequencyTable
    } else {
        TrainingSource::CleanedEvents
    };

    let report = train_model(&config, source)?;
    let metrics = report.run.metrics;
    println!("Training run {}", report.run.id);
    println!(
        "  Years: {}-{} ({} points)",
        report.run.first_year, report.run.last_year, report.run.sample_count
    );
    println!(
        "  Equation: count = {:.4} × year + {:.4}",
        report.run.model.slope, report.run.model.intercept
    );
    println!(
        "  R² = {:.4}, RMSE = {:.2} ({} set)",
        metrics.r2_score,
        metrics.rmse,
        metrics.evaluation.as_str()
    );
    println!("  Metadata -> {}", config.metadata_json.display());
    Ok(())
}

fn cluster(config: &PipelineConfig) -> Result<()> {
    let run = cluster_events(config)?;

    println!("Cluster sizes:");
    for cluster in &run.clusters {
        println!("  Cluster {}: {} points", cluster.index, cluster.size);
    }

    println!("\nCluster centers (latitude, longitude):");
    for cluster in &run.clusters {
        println!(
            "  Cluster {}: {:.6}, {:.6}",
            cluster.index, cluster.center.latitude, cluster.center.longitude
        );
    }

    println!("\nSample locations per cluster:");
    for cluster in &run.clusters {
        println!("  Cluster {} samples:", cluster.index);
        if cluster.samples.is_empty() {
            println!("    (no samples)");
        }
        for sample in &cluster.samples {
            println!(
                "    {:.6}, {:.6}  (year={})",
                sample.latitude, sample.longitude, sample.year
            );
        }
    }

    println!("\nSaved cluster run {} to {}", run.id, config.model_db.display());
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    single: Option<YearPrediction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    multiple: Vec<YearPrediction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    range: Vec<YearPrediction>,
}

fn predict(config: &PipelineConfig, args: PredictArgs) -> Result<()> {
    let predictor = Predictor::load(config)?;

    if args.interactive {
        return interactive(&predictor);
    }

    let mut output = PredictOutput {
        single: None,
        multiple: Vec::new(),
        range: Vec::new(),
    };

    if let Some(raw) = args.year.as_deref() {
        let validation = predictor.validate_year(raw);
        let Some(year) = validation.year else {
            bail!(
                "{}: {raw}",
                validation.error.as_deref().unwrap_or("invalid year")
            );
        };
        if validation.warning {
            eprintln!(
                "Warning: {}",
                validation.error.as_deref().unwrap_or("unusual year")
            );
        }
        output.single = Some(YearPrediction {
            year,
            predicted_earthquakes: predictor.predict_single_year(year),
        });
    }

    if !args.years.is_empty() {
        output.multiple = predictor.predict_year_predictions(&args.years);
    }

    if let (Some(start), Some(end)) = (args.from, args.to) {
        output.range = predictor.predict_year_range(start, end)?;
    }

    if output.single.is_none() && output.multiple.is_empty() && output.range.is_empty() {
        bail!("nothing to predict: pass --year, --years, --from/--to or --interactive");
    }

    if args.output.json {
        return print_json(&output);
    }

    if let Some(single) = output.single {
        println!(
            "Predicted earthquakes in {}: {}",
            single.year,
            group_digits(single.predicted_earthquakes)
        );
    }
    if !output.multiple.is_empty() {
        println!("Multi-year predictions:");
        print_predictions(&output.multiple);
    }
    if let (Some(start), Some(end)) = (args.from, args.to) {
        println!("Range prediction ({start}-{end}):");
        print_predictions(&output.range);
    }
    Ok(())
}

fn interactive(predictor: &Predictor) -> Result<()> {
    println!("Enter a year to predict earthquake frequency (or 'quit' to exit):");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "\nEnter year: ")?;
        stdout.flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("quit") {
            break;
        }

        let validation = predictor.validate_year(input);
        match validation.year {
            Some(year) => {
                if validation.warning {
                    println!("Warning: Year is outside typical range (1900-2100)");
                }
                println!(
                    "Predicted earthquakes in {}: {}",
                    year,
                    group_digits(predictor.predict_single_year(year))
                );
            }
            None => println!("Please enter a valid year (number) or 'quit'"),
        }
    }
    Ok(())
}

fn info(config: &PipelineConfig, args: OutputArgs) -> Result<()> {
    let predictor = Predictor::load(config)?;
    let info = predictor.model_info();

    if args.json {
        return print_json(&info);
    }

    let metadata = &info.full_info;
    println!("Model Type: {}", metadata.model_type);
    println!("Training Date: {}", metadata.training_date);
    println!("Features: {}", metadata.features.join(", "));
    println!("Target: {}", metadata.target);
    if let Some(run_id) = &metadata.run_id {
        println!("Run: {run_id}");
    }
    println!("\nModel Equation:\n  {}", info.equation);
    println!("\nInterpretation:");
    println!("  • {}", info.interpretation);
    println!("  • Model explains {} of the variance", info.variance_explained);
    println!(
        "  • RMSE: {:.2} ({} set)",
        metadata.performance_metrics.rmse,
        metadata.performance_metrics.evaluation.as_str()
    );
    Ok(())
}

fn history(config: &PipelineConfig, limit: usize) -> Result<()> {
    let db = Database::open_existing(config.model_db.clone())?;
    let runs = db.list_training_runs(limit)?;

    if runs.is_empty() {
        println!("No training runs recorded in {}", db.path().display());
        return Ok(());
    }

    for run in runs {
        println!(
            "{}  {}  slope={:.4} intercept={:.4} R²={:.4} years={}-{}",
            run.trained_at.format("%Y-%m-%d %H:%M:%S"),
            run.id,
            run.model.slope,
            run.model.intercept,
            run.metrics.r2_score,
            run.first_year,
            run.last_year
        );
    }
    Ok(())
}

fn export(config: &PipelineConfig) -> Result<()> {
    let report = export_model(&config.metadata_json, &config.export_dir)?;
    println!("JavaScript files created:");
    for file in &report.files {
        println!("  {}", file.display());
    }
    println!("\nModel coefficients exported:");
    println!("  - Intercept: {:.4}", report.model.intercept);
    println!("  - Slope: {:.4}", report.model.slope);
    println!("  - R² Score: {:.4}", report.r2_score);
    Ok(())
}

fn pipeline(config: PipelineConfig) -> Result<()> {
    clean(&config)?;
    frequency(&config)?;
    train(
        config.clone(),
        TrainArgs {
            from_frequency: false,
            holdout_years: None,
        },
    )?;
    export(&config)
}

/// Relative paths are written as-is so the file stays portable.
fn init_config(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            config_path.display()
        );
    }
    PipelineConfig::default().persist(config_path)?;
    println!("Wrote {} -> {}", CONFIG_FILE_NAME, config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1234567), "1,234,567");
    }
}
