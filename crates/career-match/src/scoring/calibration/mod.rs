//! Threshold, weight and score calibration against labeled outcomes.

mod auc;
mod dataset;
mod platt;
mod search;
mod thresholds;

pub use auc::compute_auc;
pub use dataset::{
    parse_rating_items, parse_sample, parse_samples, ValidationSample, LABEL_COLUMNS,
    OCCUPATION_COLUMNS,
};
pub use platt::{platt_scale, sigmoid, PlattFit, PlattParams};
pub use search::{
    calibrate_scores, default_combination_candidates, default_dimension_candidates,
    gate_for, generate_predictions, optimize_thresholds, optimize_weights, Predictions,
    ScoreCalibrationOutcome, ThresholdSearchOutcome, WeightSearchOutcome,
    DEFAULT_IMPORTANCE_CANDIDATES, DEFAULT_RATIO_CANDIDATES,
};
pub use thresholds::{
    derive_thresholds, percentile, ThresholdDerivation, DEFAULT_IMPORTANCE_PERCENTILE,
    DEFAULT_LEVEL_PERCENTILE,
};
