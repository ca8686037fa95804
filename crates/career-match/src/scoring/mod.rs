//! Career-match scoring engine.
//!
//! Element tables are pulled from a [`DataSource`], pivoted into aligned
//! Level / Importance matrices, and compared against a user's ratings one
//! category at a time. Category scores are then combined into a ranked list
//! with per-category contributions. The calibration routines tune thresholds,
//! weights and score scaling against labeled outcomes and install the winning
//! configuration through [`ConfigHandle`].

pub mod aggregate;
pub mod calibration;
pub mod config;
pub mod domain;
pub mod error;
pub mod gate;
pub mod matcher;
pub mod matrix;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod router;
pub mod service;
pub mod source;

#[cfg(test)]
mod tests;

pub use aggregate::{aggregate, build_recommendation, describe};
pub use config::{
    CombinationWeights, ConfigHandle, DimensionWeights, EngineConfig, GateConfig, MatchStrategy,
    OverlapThresholds, ScoreCalibration,
};
pub use domain::{
    AggregatedMatch, Category, CategoryContribution, CategoryMatches, MatchResult,
    MetricBreakdown, OccupationMatch, RatingEntry, Recommendation, UserProfile,
};
pub use error::EngineError;
pub use gate::{base_rules, calibrate_rules, passes_gate, CriticalRequirementRule};
pub use matcher::CategoryMatcher;
pub use matrix::{MatrixStore, OccupationMatrix};
pub use normalize::{normalize_against, NormalizationMethod, NormalizedView};
pub use pipeline::{CategoryScores, Pipeline};
pub use router::career_router;
pub use service::{
    CalibrationRequest, CalibrationSnapshot, RecommendationRequest, RecommendationService,
    ScoreCalibrationRequest, ThresholdOrigin, WeightOptimizationRequest,
};
pub use source::{
    CsvDirectorySource, DataSource, DataUnavailable, ElementRow, InMemorySource,
    ValidationRecord,
};
