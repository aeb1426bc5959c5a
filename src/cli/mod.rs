pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "quaketrend")]
#[command(about = "Clean an earthquake catalogue, fit a yearly trend, and export forecasts")]
#[command(version)]
pub struct Cli {
    /// Directory that relative paths in the config are resolved against
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Config file (defaults to <root>/quaketrend.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Filter the raw catalogue down to the cleaned event CSV
    Clean,
    /// Count cleaned events per year into the frequency table
    Frequency,
    /// Fit the yearly trend line and persist it
    Train(TrainArgs),
    /// Run exploratory k-means over event coordinates
    Cluster,
    /// Forecast event counts with the persisted model
    Predict(PredictArgs),
    /// Describe the persisted model
    Info(OutputArgs),
    /// List previous training runs
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Write the standalone JavaScript module, demo page and Node example
    Export,
    /// Serve the exported demo page over HTTP
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Do not try to open a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Run clean, frequency, train and export in order
    Pipeline,
    /// Write the default config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct TrainArgs {
    /// Train from the frequency table instead of the cleaned events
    #[arg(long)]
    pub from_frequency: bool,

    /// Hold out the latest N years for scoring
    #[arg(long)]
    pub holdout_years: Option<usize>,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PredictArgs {
    /// Single year to forecast
    #[arg(long, allow_hyphen_values = true)]
    pub year: Option<String>,

    /// Comma-separated years, e.g. 2025,2026,2030
    #[arg(long, value_delimiter = ',')]
    pub years: Vec<i32>,

    /// First year of an inclusive range
    #[arg(long, requires = "to")]
    pub from: Option<i32>,

    /// Last year of an inclusive range
    #[arg(long, requires = "from")]
    pub to: Option<i32>,

    /// Read years from stdin until `quit`
    #[arg(long, short)]
    pub interactive: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_predict_range_and_years() {
        let cli = Cli::parse_from([
            "quaketrend", "--root", "/data", "predict", "--years", "2025,2027", "--from", "2030",
            "--to", "2032",
        ]);
        assert_eq!(cli.root, PathBuf::from("/data"));
        match cli.command {
            Command::Predict(args) => {
                assert_eq!(args.years, vec![2025, 2027]);
                assert_eq!((args.from, args.to), (Some(2030), Some(2032)));
                assert!(!args.output.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn serve_port_is_optional() {
        let cli = Cli::parse_from(["quaketrend", "serve", "--port", "9000"]);
        assert!(matches!(cli.command, Command::Serve { port: Some(9000), no_browser: false }));
    }

    #[test]
    fn range_needs_both_ends() {
        assert!(Cli::try_parse_from(["quaketrend", "predict", "--from", "2030"]).is_err());
    }
}
