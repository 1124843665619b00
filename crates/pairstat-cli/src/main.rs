//! CLI for pairstat — paired statistical comparison of two-study experiment tables.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pairstat")]
#[command(about = "pairstat — paired statistical comparison of two-study experiment tables")]
#[command(version = pairstat_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the table, run every configured metric × row-kind comparison,
    /// print a summary, and write the CSV results table
    Compare {
        /// Input table file (whitespace-delimited, header line first)
        #[arg(long)]
        input: String,

        /// Output CSV path
        #[arg(long, default_value = "statistical_comparison_results.csv")]
        output: String,

        /// Also write full results as pretty-printed JSON
        #[arg(long)]
        json: Option<String>,

        /// JSON configuration file (defaults filled in for absent keys)
        #[arg(long)]
        config: Option<String>,

        /// Override: fixed column count rows are truncated/padded to
        #[arg(long)]
        expected_cols: Option<usize>,

        /// Override: comma-separated metric columns to compare
        #[arg(long)]
        metrics: Option<String>,

        /// Override: comma-separated row kinds to compare per metric
        #[arg(long)]
        kinds: Option<String>,

        /// Override: comma-separated fields with the zero-means-missing convention
        #[arg(long)]
        zero_missing: Option<String>,

        /// Override: first study token
        #[arg(long)]
        study_first: Option<String>,

        /// Override: second study token
        #[arg(long)]
        study_second: Option<String>,

        /// Override: significance level for the comparison verdict
        #[arg(long)]
        alpha: Option<f64>,

        /// Override: Shapiro-Wilk gate level for test selection
        #[arg(long)]
        normality_alpha: Option<f64>,

        /// Write the cleaned intermediate table (TSV) as a diagnostic artifact
        #[arg(long)]
        dump_clean: Option<String>,
    },

    /// Parse the table and summarize structure and paired-data coverage
    /// without running any tests
    Inspect {
        /// Input table file (whitespace-delimited, header line first)
        #[arg(long)]
        input: String,

        /// JSON configuration file (defaults filled in for absent keys)
        #[arg(long)]
        config: Option<String>,

        /// Override: fixed column count rows are truncated/padded to
        #[arg(long)]
        expected_cols: Option<usize>,

        /// Override: comma-separated metric columns to summarize
        #[arg(long)]
        metrics: Option<String>,

        /// Override: comma-separated row kinds to summarize per metric
        #[arg(long)]
        kinds: Option<String>,

        /// Override: first study token
        #[arg(long)]
        study_first: Option<String>,

        /// Override: second study token
        #[arg(long)]
        study_second: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            input,
            output,
            json,
            config,
            expected_cols,
            metrics,
            kinds,
            zero_missing,
            study_first,
            study_second,
            alpha,
            normality_alpha,
            dump_clean,
        } => commands::compare::run(commands::compare::CompareCommandConfig {
            input: &input,
            output: &output,
            json_path: json.as_deref(),
            dump_clean: dump_clean.as_deref(),
            config_path: config.as_deref(),
            overrides: commands::ConfigOverrides {
                expected_cols,
                metrics: metrics.as_deref(),
                kinds: kinds.as_deref(),
                zero_missing: zero_missing.as_deref(),
                study_first: study_first.as_deref(),
                study_second: study_second.as_deref(),
                alpha,
                normality_alpha,
            },
        }),
        Commands::Inspect {
            input,
            config,
            expected_cols,
            metrics,
            kinds,
            study_first,
            study_second,
        } => commands::inspect::run(commands::inspect::InspectCommandConfig {
            input: &input,
            config_path: config.as_deref(),
            overrides: commands::ConfigOverrides {
                expected_cols,
                metrics: metrics.as_deref(),
                kinds: kinds.as_deref(),
                zero_missing: None,
                study_first: study_first.as_deref(),
                study_second: study_second.as_deref(),
                alpha: None,
                normality_alpha: None,
            },
        }),
    }
}
