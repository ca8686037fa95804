//! AUC-scored searches over candidate configurations.
//!
//! Every candidate is a full `EngineConfig` value scored through the pipeline;
//! the active configuration is never touched here.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::auc::compute_auc;
use super::dataset::ValidationSample;
use super::platt::{platt_scale, sigmoid, PlattParams};
use crate::scoring::config::{CombinationWeights, DimensionWeights, EngineConfig, GateConfig};
use crate::scoring::domain::Category;
use crate::scoring::error::EngineError;
use crate::scoring::gate::{base_rules, calibrate_rules, CriticalRequirementRule};
use crate::scoring::pipeline::Pipeline;
use crate::scoring::source::DataUnavailable;

pub const DEFAULT_IMPORTANCE_CANDIDATES: [f64; 5] = [60.0, 70.0, 80.0, 85.0, 90.0];
pub const DEFAULT_RATIO_CANDIDATES: [f64; 5] = [0.6, 0.7, 0.8, 0.85, 0.9];

pub fn default_dimension_candidates() -> Vec<DimensionWeights> {
    vec![
        DimensionWeights::default(),
        DimensionWeights::new(0.30, 0.30, 0.20, 0.20),
        DimensionWeights::new(0.40, 0.25, 0.20, 0.15),
        DimensionWeights::new(0.33, 0.27, 0.20, 0.20),
    ]
}

pub fn default_combination_candidates() -> Vec<CombinationWeights> {
    vec![
        CombinationWeights::default(),
        CombinationWeights::new(0.50, 0.25, 0.25),
        CombinationWeights::new(0.45, 0.30, 0.25),
        CombinationWeights::new(0.35, 0.35, 0.30),
    ]
}

/// Labeled raw scores for the samples whose target occupation was matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predictions {
    pub labels: Vec<bool>,
    pub scores: Vec<f64>,
}

impl Predictions {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn auc(&self) -> Option<f64> {
        compute_auc(&self.labels, &self.scores)
    }
}

/// Aggregated (uncalibrated) score of each sample's target occupation under
/// `config`. Samples with no usable category or no match for their target are
/// left out; an unreadable table aborts the run.
pub fn generate_predictions(
    pipeline: Pipeline<'_>,
    config: &EngineConfig,
    samples: &[ValidationSample],
) -> Result<Predictions, DataUnavailable> {
    let mut predictions = Predictions::default();

    for sample in samples {
        let aggregated = match pipeline.aggregate(config, &sample.profile) {
            Ok((aggregated, _)) => aggregated,
            Err(EngineError::DataUnavailable(error)) => return Err(error),
            Err(_) => continue,
        };
        if let Some(entry) = aggregated
            .iter()
            .find(|entry| entry.title == sample.occupation)
        {
            predictions.labels.push(sample.label);
            predictions.scores.push(entry.score);
        }
    }

    Ok(predictions)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSearchOutcome {
    pub importance_threshold: f64,
    pub min_requirement_ratio: f64,
    pub auc: f64,
    pub evaluated_pairs: usize,
    #[serde(skip)]
    pub rules: Vec<CriticalRequirementRule>,
}

/// Gate configuration for one (threshold, ratio) pair, with rule occupation
/// lists re-derived from the abilities table when it is available.
pub fn gate_for(
    pipeline: Pipeline<'_>,
    importance_threshold: f64,
    min_requirement_ratio: f64,
    top_k: usize,
) -> GateConfig {
    let base = base_rules();
    let rules = match pipeline.store().matrix(Category::Abilities.dataset()) {
        Ok(abilities) => calibrate_rules(
            &abilities,
            &base,
            importance_threshold,
            min_requirement_ratio,
            top_k,
        ),
        Err(error) => {
            warn!(%error, "abilities table unavailable; using keyword rules");
            base
        }
    };

    GateConfig {
        importance_critical_threshold: importance_threshold,
        min_requirement_ratio,
        rules,
    }
}

/// Grid search over (importance threshold, minimum ratio). Candidates with an
/// undefined AUC are skipped; `None` when no candidate produced one.
pub fn optimize_thresholds(
    pipeline: Pipeline<'_>,
    base: &EngineConfig,
    samples: &[ValidationSample],
    importance_candidates: &[f64],
    ratio_candidates: &[f64],
    top_k: usize,
) -> Result<Option<ThresholdSearchOutcome>, DataUnavailable> {
    let mut best: Option<ThresholdSearchOutcome> = None;

    for importance_threshold in importance_candidates {
        for ratio in ratio_candidates {
            let gate = gate_for(pipeline, *importance_threshold, *ratio, top_k);
            let candidate = base.clone().with_gate(gate);
            let predictions = generate_predictions(pipeline, &candidate, samples)?;
            let Some(auc) = predictions.auc() else {
                continue;
            };

            if best.as_ref().map_or(true, |current| auc > current.auc) {
                best = Some(ThresholdSearchOutcome {
                    importance_threshold: *importance_threshold,
                    min_requirement_ratio: *ratio,
                    auc,
                    evaluated_pairs: predictions.len(),
                    rules: candidate.gate.rules,
                });
            }
        }
    }

    if let Some(outcome) = &best {
        info!(
            importance_threshold = outcome.importance_threshold,
            min_ratio = outcome.min_requirement_ratio,
            auc = outcome.auc,
            evaluated_pairs = outcome.evaluated_pairs,
            "threshold search finished"
        );
    }
    Ok(best)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSearchOutcome {
    pub dimension_weights: DimensionWeights,
    pub combination_weights: CombinationWeights,
    pub auc: f64,
    pub evaluated_pairs: usize,
}

/// Grid search over dimension × combination weight vectors, each normalized
/// to sum to one before it is scored.
pub fn optimize_weights(
    pipeline: Pipeline<'_>,
    base: &EngineConfig,
    samples: &[ValidationSample],
    dimension_candidates: &[DimensionWeights],
    combination_candidates: &[CombinationWeights],
) -> Result<Option<WeightSearchOutcome>, DataUnavailable> {
    let mut best: Option<WeightSearchOutcome> = None;

    for dimension in dimension_candidates {
        for combination in combination_candidates {
            let candidate = base.clone().with_weights(*dimension, *combination);
            let predictions = generate_predictions(pipeline, &candidate, samples)?;
            let Some(auc) = predictions.auc() else {
                continue;
            };

            if best.as_ref().map_or(true, |current| auc > current.auc) {
                best = Some(WeightSearchOutcome {
                    dimension_weights: candidate.dimension_weights,
                    combination_weights: candidate.combination_weights,
                    auc,
                    evaluated_pairs: predictions.len(),
                });
            }
        }
    }

    if let Some(outcome) = &best {
        info!(auc = outcome.auc, evaluated_pairs = outcome.evaluated_pairs, "weight search finished");
    }
    Ok(best)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCalibrationOutcome {
    pub a: f64,
    pub b: f64,
    pub iterations: usize,
    pub auc_before: f64,
    pub auc_after: Option<f64>,
    pub samples: usize,
}

/// Fits Platt parameters on the raw scores under `config`. `None` when the
/// predictions have no defined AUC.
pub fn calibrate_scores(
    pipeline: Pipeline<'_>,
    config: &EngineConfig,
    samples: &[ValidationSample],
    params: &PlattParams,
) -> Result<Option<ScoreCalibrationOutcome>, DataUnavailable> {
    let predictions = generate_predictions(pipeline, config, samples)?;
    let Some(auc_before) = predictions.auc() else {
        return Ok(None);
    };

    let fit = platt_scale(&predictions.scores, &predictions.labels, params);
    let calibrated: Vec<f64> = predictions
        .scores
        .iter()
        .map(|score| sigmoid(fit.a * score + fit.b))
        .collect();
    let auc_after = compute_auc(&predictions.labels, &calibrated);

    info!(
        a = fit.a,
        b = fit.b,
        iterations = fit.iterations,
        auc_before,
        auc_after,
        samples = predictions.len(),
        "score calibration fitted"
    );

    Ok(Some(ScoreCalibrationOutcome {
        a: fit.a,
        b: fit.b,
        iterations: fit.iterations,
        auc_before,
        auc_after,
        samples: predictions.len(),
    }))
}
