use crate::commands::{run_calibration, run_recommend, CalibrateArgs, RecommendArgs};
use crate::server;
use career_match::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Career Match",
    about = "Score psychometric profiles against occupational element tables",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Rank occupations for a profile and print them as a table (JSON with --json)
    Recommend(RecommendArgs),
    /// Tune the engine against a labeled validation dataset
    Calibrate {
        #[command(subcommand)]
        command: CalibrateCommand,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum CalibrateCommand {
    /// Search importance thresholds and requirement ratios (percentiles without a dataset)
    Thresholds(CalibrateArgs),
    /// Search dimension and combination weights
    Weights(CalibrateArgs),
    /// Fit Platt scaling on raw scores
    Scores(CalibrateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the directory holding the element tables
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Recommend(args) => run_recommend(args),
        Command::Calibrate { command } => run_calibration(command),
    }
}
