use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::aggregate::build_recommendation;
use super::calibration::{
    self, default_combination_candidates, default_dimension_candidates, derive_thresholds,
    gate_for, parse_samples, PlattParams, ScoreCalibrationOutcome, ThresholdDerivation,
    ThresholdSearchOutcome, ValidationSample, WeightSearchOutcome, DEFAULT_IMPORTANCE_CANDIDATES,
    DEFAULT_IMPORTANCE_PERCENTILE, DEFAULT_LEVEL_PERCENTILE, DEFAULT_RATIO_CANDIDATES,
};
use super::config::{
    CombinationWeights, ConfigHandle, DimensionWeights, EngineConfig, GateConfig, MatchStrategy,
    ScoreCalibration,
};
use super::domain::{Category, CategoryMatches, Recommendation, UserProfile};
use super::error::EngineError;
use super::gate::{CriticalRequirementRule, DEFAULT_RULE_TOP_K};
use super::matcher::CategoryMatcher;
use super::matrix::MatrixStore;
use super::metrics::CovarianceCache;
use super::pipeline::Pipeline;
use super::source::{CsvDirectorySource, DataSource};
use crate::config::{AppConfig, DEFAULT_COVARIANCE_CACHE_CAPACITY, DEFAULT_VALIDATION_DATASET};

/// Rules echoed back in a calibration snapshot.
const SAMPLE_RULES: usize = 5;

/// Profile plus an optional per-request strategy override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MatchStrategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationRequest {
    pub importance_percentile: f64,
    pub level_percentile: f64,
    pub top_k: usize,
    pub dataset_name: Option<String>,
    pub importance_candidates: Option<Vec<f64>>,
    pub ratio_candidates: Option<Vec<f64>>,
}

impl Default for CalibrationRequest {
    fn default() -> Self {
        Self {
            importance_percentile: DEFAULT_IMPORTANCE_PERCENTILE,
            level_percentile: DEFAULT_LEVEL_PERCENTILE,
            top_k: DEFAULT_RULE_TOP_K,
            dataset_name: None,
            importance_candidates: None,
            ratio_candidates: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightOptimizationRequest {
    pub dataset_name: Option<String>,
    pub dimension_candidates: Option<Vec<DimensionWeights>>,
    pub combination_candidates: Option<Vec<CombinationWeights>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreCalibrationRequest {
    pub dataset_name: Option<String>,
    #[serde(flatten)]
    pub params: PlattParams,
}

/// How the active thresholds were last set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdOrigin {
    Configured,
    ValidationSearch,
    Percentiles,
    Defaults,
}

/// Active calibration values as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSnapshot {
    pub importance_critical_threshold: f64,
    pub min_requirement_ratio: f64,
    pub rules_count: usize,
    pub sample_rules: Vec<CriticalRequirementRule>,
    pub dimension_weights: DimensionWeights,
    pub combination_weights: CombinationWeights,
    pub score_calibration: ScoreCalibration,
    pub threshold_origin: ThresholdOrigin,
    /// When a calibration routine last installed a configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibrated_at: Option<DateTime<Utc>>,
    /// Best AUC of the threshold search behind this response, if one ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluated_pairs: Option<usize>,
}

impl CalibrationSnapshot {
    fn from_config(config: &EngineConfig, history: CalibrationHistory) -> Self {
        Self {
            importance_critical_threshold: config.gate.importance_critical_threshold,
            min_requirement_ratio: config.gate.min_requirement_ratio,
            rules_count: config.gate.rules.len(),
            sample_rules: config.gate.rules.iter().take(SAMPLE_RULES).cloned().collect(),
            dimension_weights: config.dimension_weights,
            combination_weights: config.combination_weights,
            score_calibration: config.score_calibration,
            threshold_origin: history.threshold_origin,
            calibrated_at: history.calibrated_at,
            auc: None,
            evaluated_pairs: None,
        }
    }

    fn with_search(mut self, outcome: &ThresholdSearchOutcome) -> Self {
        self.auc = Some(outcome.auc);
        self.evaluated_pairs = Some(outcome.evaluated_pairs);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct CalibrationHistory {
    threshold_origin: ThresholdOrigin,
    calibrated_at: Option<DateTime<Utc>>,
}

impl Default for CalibrationHistory {
    fn default() -> Self {
        Self {
            threshold_origin: ThresholdOrigin::Configured,
            calibrated_at: None,
        }
    }
}

/// Facade owning the data caches and the active configuration.
pub struct RecommendationService {
    store: MatrixStore,
    covariance: CovarianceCache,
    config: ConfigHandle,
    history: RwLock<CalibrationHistory>,
    validation_dataset: String,
}

impl RecommendationService {
    pub fn new(source: Arc<dyn DataSource>, config: EngineConfig) -> Self {
        Self::with_cache_capacity(source, config, DEFAULT_COVARIANCE_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(
        source: Arc<dyn DataSource>,
        config: EngineConfig,
        covariance_capacity: u64,
    ) -> Self {
        Self {
            store: MatrixStore::new(source),
            covariance: CovarianceCache::new(covariance_capacity),
            config: ConfigHandle::new(config),
            history: RwLock::new(CalibrationHistory::default()),
            validation_dataset: DEFAULT_VALIDATION_DATASET.to_string(),
        }
    }

    /// CSV-backed service reading tables from the configured data directory.
    pub fn from_app_config(app: &AppConfig) -> Self {
        let source = Arc::new(CsvDirectorySource::new(&app.data.dir));
        Self::with_cache_capacity(
            source,
            EngineConfig::default(),
            app.data.covariance_cache_capacity,
        )
        .with_validation_dataset(&app.data.validation_dataset)
    }

    pub fn with_validation_dataset(mut self, dataset: &str) -> Self {
        self.validation_dataset = dataset.to_string();
        self
    }

    pub fn validation_dataset(&self) -> &str {
        &self.validation_dataset
    }

    pub fn config(&self) -> Arc<EngineConfig> {
        self.config.snapshot()
    }

    pub fn config_handle(&self) -> &ConfigHandle {
        &self.config
    }

    fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(&self.store, &self.covariance)
    }

    /// Ranked occupations under the active configuration.
    pub fn recommend(&self, profile: &UserProfile) -> Result<Recommendation, EngineError> {
        let config = self.config.snapshot();
        self.recommend_with(&config, profile)
    }

    /// Ranked occupations under an explicit configuration.
    pub fn recommend_with(
        &self,
        config: &EngineConfig,
        profile: &UserProfile,
    ) -> Result<Recommendation, EngineError> {
        let (aggregated, scores) = self.pipeline().aggregate(config, profile)?;
        let categories_used = scores.categories_used();

        info!(
            categories = categories_used.len(),
            skipped = scores.skipped.len(),
            occupations = aggregated.len(),
            "recommendation computed"
        );

        Ok(build_recommendation(
            aggregated,
            categories_used,
            scores.skipped,
            &config.score_calibration,
            config.max_results,
        ))
    }

    pub fn handle_request(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Recommendation, EngineError> {
        match request.strategy {
            Some(strategy) => {
                let config = self.config.snapshot().as_ref().clone().with_strategy(strategy);
                self.recommend_with(&config, &request.profile)
            }
            None => self.recommend(&request.profile),
        }
    }

    /// Matches of a single category under the active configuration.
    pub fn score_category(
        &self,
        category: Category,
        profile: &UserProfile,
    ) -> Result<CategoryMatches, EngineError> {
        let config = self.config.snapshot();
        CategoryMatcher::new(&self.store, &self.covariance, &config)
            .score(category, &profile.rating_map(category))
    }

    pub fn calibration_snapshot(&self) -> CalibrationSnapshot {
        CalibrationSnapshot::from_config(&self.config.snapshot(), self.history())
    }

    fn history(&self) -> CalibrationHistory {
        *self.history.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stamps a calibration run; `origin` replaces the recorded threshold origin when set.
    fn record_calibration(&self, origin: Option<ThresholdOrigin>) -> CalibrationHistory {
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(origin) = origin {
            history.threshold_origin = origin;
        }
        history.calibrated_at = Some(Utc::now());
        *history
    }

    /// Derives thresholds from the element tables' percentiles and installs
    /// them, with rule occupation lists re-derived under the new thresholds.
    pub fn derive_and_apply_thresholds(
        &self,
        importance_percentile: f64,
        level_percentile: f64,
        top_k: usize,
    ) -> (ThresholdDerivation, CalibrationSnapshot) {
        let derivation = derive_thresholds(&self.store, importance_percentile, level_percentile);
        let gate = gate_for(
            self.pipeline(),
            derivation.importance_threshold,
            derivation.min_requirement_ratio,
            top_k,
        );
        let installed = self.config.update(|current| current.clone().with_gate(gate));

        let origin = if derivation.derived_from_data {
            ThresholdOrigin::Percentiles
        } else {
            ThresholdOrigin::Defaults
        };
        let history = self.record_calibration(Some(origin));
        (derivation, CalibrationSnapshot::from_config(&installed, history))
    }

    /// Validation-driven threshold search when a dataset is named and yields a
    /// result; percentile derivation otherwise.
    pub fn calibrate(
        &self,
        request: &CalibrationRequest,
    ) -> Result<CalibrationSnapshot, EngineError> {
        if let Some(dataset) = &request.dataset_name {
            let samples = self.load_samples(dataset)?;
            let base = self.config.snapshot();
            let outcome = calibration::optimize_thresholds(
                self.pipeline(),
                &base,
                &samples,
                request
                    .importance_candidates
                    .as_deref()
                    .unwrap_or(&DEFAULT_IMPORTANCE_CANDIDATES[..]),
                request
                    .ratio_candidates
                    .as_deref()
                    .unwrap_or(&DEFAULT_RATIO_CANDIDATES[..]),
                request.top_k,
            )?;

            if let Some(outcome) = outcome {
                let installed = self.config.update(|current| {
                    current.clone().with_gate(GateConfig {
                        importance_critical_threshold: outcome.importance_threshold,
                        min_requirement_ratio: outcome.min_requirement_ratio,
                        rules: outcome.rules.clone(),
                    })
                });
                let history = self.record_calibration(Some(ThresholdOrigin::ValidationSearch));
                let snapshot = CalibrationSnapshot::from_config(&installed, history);
                return Ok(snapshot.with_search(&outcome));
            }
            info!(dataset = dataset.as_str(), "threshold search inconclusive; using percentiles");
        }

        let (_, snapshot) = self.derive_and_apply_thresholds(
            request.importance_percentile,
            request.level_percentile,
            request.top_k,
        );
        Ok(snapshot)
    }

    /// Searches weight candidates and installs the best-AUC pair.
    pub fn optimize_weights(
        &self,
        request: &WeightOptimizationRequest,
    ) -> Result<WeightSearchOutcome, EngineError> {
        let dataset = self.dataset_or_default(request.dataset_name.as_deref());
        let samples = self.load_samples(dataset)?;
        let base = self.config.snapshot();

        let dimension_candidates = request
            .dimension_candidates
            .clone()
            .unwrap_or_else(default_dimension_candidates);
        let combination_candidates = request
            .combination_candidates
            .clone()
            .unwrap_or_else(default_combination_candidates);

        let outcome = calibration::optimize_weights(
            self.pipeline(),
            &base,
            &samples,
            &dimension_candidates,
            &combination_candidates,
        )?
        .ok_or_else(|| insufficient(dataset))?;

        self.config.update(|current| {
            current
                .clone()
                .with_weights(outcome.dimension_weights, outcome.combination_weights)
        });
        self.record_calibration(None);
        Ok(outcome)
    }

    /// Fits Platt scaling on the active configuration's raw scores and enables it.
    pub fn calibrate_scores(
        &self,
        request: &ScoreCalibrationRequest,
    ) -> Result<ScoreCalibrationOutcome, EngineError> {
        let dataset = self.dataset_or_default(request.dataset_name.as_deref());
        let samples = self.load_samples(dataset)?;
        let base = self.config.snapshot();

        let outcome = calibration::calibrate_scores(self.pipeline(), &base, &samples, &request.params)?
            .ok_or_else(|| insufficient(dataset))?;

        self.config.update(|current| {
            current
                .clone()
                .with_score_calibration(ScoreCalibration::fitted(outcome.a, outcome.b))
        });
        self.record_calibration(None);
        Ok(outcome)
    }

    fn dataset_or_default<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(&self.validation_dataset)
    }

    fn load_samples(&self, dataset: &str) -> Result<Vec<ValidationSample>, EngineError> {
        let records = self.store.source().validation_rows(dataset)?;
        let samples = parse_samples(&records);
        info!(dataset, rows = records.len(), usable = samples.len(), "validation dataset loaded");
        Ok(samples)
    }
}

fn insufficient(dataset: &str) -> EngineError {
    EngineError::CalibrationDataInsufficient {
        dataset: dataset.to_string(),
    }
}
