//! Cricket Match Prediction CLI
//!
//! Trains a random forest on historical IPL matches and predicts winners
//! with the exact encoders the model was trained with.

use clap::{Parser, Subcommand};
use cricket::{Config, Result};

#[derive(Parser)]
#[command(name = "cricket")]
#[command(about = "IPL match winner prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model from a CSV of historical matches
    Train {
        /// Match CSV (defaults to data.matches_path)
        #[arg(long)]
        input: Option<String>,
        /// Override number of trees
        #[arg(long)]
        trees: Option<usize>,
        /// Override random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Override holdout fraction (0 trains on every row)
        #[arg(long)]
        holdout: Option<f64>,
        /// Write the evaluation report as JSON to this path
        #[arg(long)]
        report_json: Option<String>,
    },
    /// Predict the winner of a match
    Predict {
        /// First team
        team1: String,
        /// Second team
        team2: String,
        /// Team that won the toss (must be team1 or team2)
        #[arg(long)]
        toss_winner: String,
        /// Toss decision: bat or field
        #[arg(long)]
        toss_decision: cricket::TossDecision,
        /// Venue name
        #[arg(long)]
        venue: String,
        /// City (defaults to the most common training city)
        #[arg(long)]
        city: Option<String>,
        /// Match date, e.g. 2024-04-12 (defaults to training medians)
        #[arg(long)]
        date: Option<String>,
        /// Season year
        #[arg(long)]
        season: Option<i32>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Evaluate the saved model on a CSV of matches
    Report {
        /// Match CSV (defaults to data.matches_path)
        #[arg(long)]
        input: Option<String>,
        /// Write the report as JSON to this path
        #[arg(long)]
        json: Option<String>,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show encoders, feature order and defaults
    Info,
    /// Copy the model file
    Export {
        /// Output path
        output: String,
    },
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Train {
            input,
            trees,
            seed,
            holdout,
            report_json,
        } => commands::train(&config, input, trees, seed, holdout, report_json),
        Commands::Predict {
            team1,
            team2,
            toss_winner,
            toss_decision,
            venue,
            city,
            date,
            season,
            format,
        } => {
            let request = cricket::PredictionRequest {
                team1,
                team2,
                toss_winner,
                toss_decision,
                venue,
                date: None,
                city,
                season,
            };
            commands::predict(&config, request, date, format)
        }
        Commands::Report { input, json } => commands::report(&config, input, json),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
            ModelCommands::Export { output } => commands::model_export(&config, &output),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use cricket::data::{load_matches, DerivedDataset};
    use cricket::model::TrainedArtifact;
    use cricket::predict::{format_prediction, Predictor};
    use cricket::report::{EvaluationReport, Reporter};
    use cricket::training::TrainingPipeline;
    use cricket::{CricketError, PredictionRequest};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Place match data at {}", config.data.matches_path);
        println!("  2. Run 'cricket train' to train the model");
        println!(
            "  3. Run 'cricket predict \"Team A\" \"Team B\" --toss-winner \"Team A\" --toss-decision bat --venue \"Ground\"'"
        );

        Ok(())
    }

    pub fn train(
        config: &Config,
        input: Option<String>,
        trees: Option<usize>,
        seed: Option<u64>,
        holdout: Option<f64>,
        report_json: Option<String>,
    ) -> Result<()> {
        let mut training_config = config.clone();
        if let Some(t) = trees {
            training_config.training.n_trees = t;
        }
        if let Some(s) = seed {
            training_config.training.seed = s;
        }
        if let Some(h) = holdout {
            training_config.training.holdout_fraction = h;
        }
        training_config.validate()?;

        let path = input.unwrap_or_else(|| config.data.matches_path.clone());
        let records = load_matches(&path)?;
        if records.is_empty() {
            return Err(CricketError::Config(format!("No matches in {}", path)));
        }

        println!("Training on {} matches from {}...", records.len(), path);
        let outcome = TrainingPipeline::new(training_config.training.clone()).run(&records)?;

        println!("  {}", outcome.summary);
        if outcome.holdout.is_empty() {
            println!("  No holdout rows; evaluating on training rows");
        }

        let reporter = Reporter::new(training_config.report.clone());
        let report =
            reporter.evaluate(outcome.evaluation_artifact(), outcome.evaluation_rows())?;
        println!("\n{}", report);
        if let Some(out) = report_json {
            write_report(&report, &out)?;
        }

        println!("Saving model to {}...", config.data.model_path);
        outcome.artifact.save(&config.data.model_path)?;
        println!("\nTraining complete!");

        Ok(())
    }

    pub fn predict(
        config: &Config,
        mut request: PredictionRequest,
        date: Option<String>,
        format: OutputFormat,
    ) -> Result<()> {
        if let Some(d) = date {
            request.date = Some(
                cricket::data::loader::parse_date(&d)
                    .ok_or_else(|| CricketError::Parse(format!("Invalid date: {}", d)))?,
            );
        }

        let artifact = TrainedArtifact::load(&config.data.model_path)?;
        let prediction = Predictor::new(&artifact).predict(&request)?;

        match format {
            OutputFormat::Table => {
                print!("{}", format_prediction(&prediction, &request));
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "team1": prediction.team1,
                    "team2": prediction.team2,
                    "toss_winner": request.toss_winner,
                    "toss_decision": request.toss_decision,
                    "venue": request.venue,
                    "winner": prediction.winner,
                    "defaulted": prediction.defaulted,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }

        Ok(())
    }

    pub fn report(config: &Config, input: Option<String>, json: Option<String>) -> Result<()> {
        let artifact = TrainedArtifact::load(&config.data.model_path)?;

        let path = input.unwrap_or_else(|| config.data.matches_path.clone());
        let records = load_matches(&path)?;
        let derived =
            DerivedDataset::build(&records, artifact.registry(), artifact.feature_names())?;
        println!(
            "Evaluating on {} of {} matches (dropped: {})",
            derived.rows.len(),
            records.len(),
            derived.dropped
        );

        let report = Reporter::new(config.report.clone()).evaluate(&artifact, &derived.rows)?;
        println!("\n{}", report);
        if let Some(out) = json {
            write_report(&report, &out)?;
        }

        Ok(())
    }

    fn write_report(report: &EvaluationReport, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, report)?;
        println!("Report written to {}", path);
        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let artifact = TrainedArtifact::load(&config.data.model_path)?;
        let defaults = artifact.defaults();

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:          {}", config.data.model_path);
        println!("  Training rows: {}", artifact.trained_rows());
        println!("  Checksum:      {}", artifact.checksum());
        println!("  Features:      {}", artifact.feature_names().join(", "));
        println!(
            "  Defaults:      {}-{:02}-{:02}, season {}, city {}",
            defaults.match_year,
            defaults.match_month,
            defaults.match_day,
            defaults.season,
            defaults.city
        );

        for encoder in artifact.registry().encoders() {
            println!("\n  {} ({}):", encoder.domain(), encoder.len());
            for (code, value) in encoder.values().iter().enumerate() {
                println!("    {:>3}  {}", code, value);
            }
        }

        Ok(())
    }

    pub fn model_export(config: &Config, output: &str) -> Result<()> {
        // Validate before copying so a broken bundle is never exported
        TrainedArtifact::load(&config.data.model_path)?;
        std::fs::copy(&config.data.model_path, output)?;
        println!("Model exported to {}", output);

        Ok(())
    }
}
