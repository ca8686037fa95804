use super::domain::Category;
use super::source::DataUnavailable;

/// Failures surfaced by the scoring engine. Degenerate metrics and singular
/// covariances are recovered inside the engine and never appear here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    DataUnavailable(#[from] DataUnavailable),
    #[error("profile contains no ratings")]
    EmptyProfile,
    #[error("profile shares too few elements with the occupation data for: {}", category_list(.categories))]
    InsufficientOverlap { categories: Vec<Category> },
    #[error("validation dataset '{dataset}' yielded no usable labeled predictions")]
    CalibrationDataInsufficient { dataset: String },
}

fn category_list(categories: &[Category]) -> String {
    categories
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
