use crate::cli::CalibrateCommand;
use career_match::config::AppConfig;
use career_match::error::AppError;
use career_match::scoring::{
    CalibrationRequest, Recommendation, RecommendationRequest, RecommendationService,
    ScoreCalibrationRequest, WeightOptimizationRequest,
};
use career_match::telemetry::{self, LogSink};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    /// Profile document: inline JSON or a path to a JSON file. May carry a
    /// `strategy` override next to the category ratings.
    #[arg(long)]
    pub(crate) profile: String,
    /// Override the directory holding the element tables
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Print the full recommendation document instead of the ranked table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CalibrateArgs {
    /// Validation dataset name (defaults to the configured one)
    #[arg(long)]
    pub(crate) dataset: Option<String>,
    /// Override the directory holding the element tables
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let request = load_request(&args.profile)?;
    let service = prepare_service(args.data_dir)?;
    let recommendation = service.handle_request(&request)?;
    if args.json {
        return print_json(&recommendation);
    }
    print!("{}", render_table(&recommendation));
    Ok(())
}

/// Calibration results are printed, not persisted; a running server keeps its own state.
pub(crate) fn run_calibration(command: CalibrateCommand) -> Result<(), AppError> {
    match command {
        CalibrateCommand::Thresholds(args) => {
            let service = prepare_service(args.data_dir)?;
            let request = CalibrationRequest {
                dataset_name: args.dataset,
                ..CalibrationRequest::default()
            };
            print_json(&service.calibrate(&request)?)
        }
        CalibrateCommand::Weights(args) => {
            let service = prepare_service(args.data_dir)?;
            let request = WeightOptimizationRequest {
                dataset_name: args.dataset,
                ..WeightOptimizationRequest::default()
            };
            print_json(&service.optimize_weights(&request)?)
        }
        CalibrateCommand::Scores(args) => {
            let service = prepare_service(args.data_dir)?;
            let request = ScoreCalibrationRequest {
                dataset_name: args.dataset,
                ..ScoreCalibrationRequest::default()
            };
            print_json(&service.calibrate_scores(&request)?)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn prepare_service(data_dir: Option<PathBuf>) -> Result<RecommendationService, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = data_dir {
        config.data.dir = dir;
    }

    telemetry::init_with_sink(&config.telemetry, LogSink::Stderr)?;
    info!(data_dir = %config.data.dir.display(), "loading element tables on demand");

    Ok(RecommendationService::from_app_config(&config))
}

pub(crate) fn load_request(raw: &str) -> Result<RecommendationRequest, AppError> {
    let document = if raw.trim_start().starts_with('{') {
        raw.to_string()
    } else {
        std::fs::read_to_string(raw)?
    };
    Ok(serde_json::from_str(&document)?)
}

pub(crate) fn render_table(recommendation: &Recommendation) -> String {
    let categories: Vec<&str> = recommendation
        .categories_used
        .iter()
        .map(|category| category.as_str())
        .collect();
    let mut out = format!(
        "{} ({} occupations analyzed; categories: {})\n",
        recommendation.methodology,
        recommendation.total_occupations_analyzed,
        categories.join(", ")
    );
    if !recommendation.skipped_categories.is_empty() {
        let skipped: Vec<&str> = recommendation
            .skipped_categories
            .iter()
            .map(|category| category.as_str())
            .collect();
        out.push_str(&format!("skipped: {}\n", skipped.join(", ")));
    }

    out.push_str(&format!("{:>4}  {:>6}  {:>6}  {}\n", "rank", "score", "raw", "occupation"));
    for (rank, entry) in recommendation.matches.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:>6.3}  {:>6.3}  {}\n",
            rank + 1,
            entry.score,
            entry.raw_score,
            entry.title
        ));
        out.push_str(&format!("{:>22}{}\n", "", entry.description));
    }
    out
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use career_match::scoring::{Category, MatchStrategy, OccupationMatch};

    #[test]
    fn ranked_table_lists_matches_in_order() {
        let recommendation = Recommendation {
            matches: vec![
                OccupationMatch {
                    title: "Software Developers".to_string(),
                    score: 0.91,
                    raw_score: 0.91,
                    calibrated: false,
                    description: "Strong match based on your skills".to_string(),
                    contributions: Vec::new(),
                },
                OccupationMatch {
                    title: "Statisticians".to_string(),
                    score: 0.74,
                    raw_score: 0.74,
                    calibrated: false,
                    description: "Strong match based on your skills".to_string(),
                    contributions: Vec::new(),
                },
            ],
            category: "combined".to_string(),
            methodology: "Multi-dimensional analysis using 1 assessment types".to_string(),
            total_occupations_analyzed: 6,
            categories_used: vec![Category::Skills],
            skipped_categories: vec![Category::Knowledge],
        };

        let table = render_table(&recommendation);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].contains("6 occupations analyzed; categories: skills"));
        assert_eq!(lines[1], "skipped: knowledge");
        assert!(lines[3].trim_start().starts_with("1   0.910"));
        assert!(lines[3].ends_with("Software Developers"));
        assert!(lines[5].ends_with("Statisticians"));
    }

    #[test]
    fn inline_profile_documents_are_parsed() {
        let request = load_request(
            r#"{"skills":[{"name":"Programming","rating":90}],"strategy":{"kind":"correlation"}}"#,
        )
        .expect("inline profile");

        assert_eq!(request.profile.ratings(Category::Skills).len(), 1);
        assert!(matches!(
            request.strategy,
            Some(MatchStrategy::Correlation { .. })
        ));
    }

    #[test]
    fn profile_files_are_read_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "career-match-profile-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"interests":[{"name":"Investigative","rating":7}]}"#,
        )
        .expect("write profile");

        let request = load_request(path.to_str().expect("utf-8 path")).expect("file profile");
        assert_eq!(request.profile.ratings(Category::Interests).len(), 1);
        assert!(request.strategy.is_none());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_profiles_are_invalid_input() {
        match load_request("{\"skills\": [") {
            Err(AppError::InvalidInput(_)) => {}
            other => panic!("expected invalid input, got {other:?}"),
        }
        match load_request("/does/not/exist.json") {
            Err(AppError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
