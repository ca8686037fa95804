use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::calibration::sigmoid;
use super::domain::Category;
use super::gate::{base_rules, CriticalRequirementRule};
use super::metrics::{DEFAULT_HEXAGON_BLEND, DEFAULT_REGULARIZATION, OVERQUALIFICATION_DAMPING};
use super::normalize::NormalizationMethod;

pub const DEFAULT_IMPORTANCE_CRITICAL_THRESHOLD: f64 = 80.0;
pub const DEFAULT_MIN_REQUIREMENT_RATIO: f64 = 0.75;
pub const DEFAULT_MAX_RESULTS: usize = 20;

/// Per-category weights used when aggregating category scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionWeights {
    pub interests: f64,
    pub abilities: f64,
    pub knowledge: f64,
    pub skills: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            interests: 0.35,
            abilities: 0.25,
            knowledge: 0.20,
            skills: 0.20,
        }
    }
}

impl DimensionWeights {
    pub fn new(interests: f64, abilities: f64, knowledge: f64, skills: f64) -> Self {
        Self {
            interests,
            abilities,
            knowledge,
            skills,
        }
    }

    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Interests => self.interests,
            Category::Abilities => self.abilities,
            Category::Knowledge => self.knowledge,
            Category::Skills => self.skills,
        }
    }

    /// Weights scaled to sum to one.
    pub fn normalized(&self) -> Self {
        let [interests, abilities, knowledge, skills] =
            normalize_weights([self.interests, self.abilities, self.knowledge, self.skills]);
        Self::new(interests, abilities, knowledge, skills)
    }
}

/// Blend of the per-occupation metrics inside a non-interest category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinationWeights {
    pub fit: f64,
    pub cosine: f64,
    pub mahalanobis: f64,
}

impl Default for CombinationWeights {
    fn default() -> Self {
        Self {
            fit: 0.4,
            cosine: 0.3,
            mahalanobis: 0.3,
        }
    }
}

impl CombinationWeights {
    pub fn new(fit: f64, cosine: f64, mahalanobis: f64) -> Self {
        Self {
            fit,
            cosine,
            mahalanobis,
        }
    }

    pub fn normalized(&self) -> Self {
        let [fit, cosine, mahalanobis] = normalize_weights([self.fit, self.cosine, self.mahalanobis]);
        Self::new(fit, cosine, mahalanobis)
    }
}

/// Negative or non-finite weights count as zero; an all-zero vector becomes uniform.
fn normalize_weights<const N: usize>(weights: [f64; N]) -> [f64; N] {
    let clipped = weights.map(|weight| if weight.is_finite() { weight.max(0.0) } else { 0.0 });
    let total: f64 = clipped.iter().sum();
    if total <= 0.0 {
        return [1.0 / N as f64; N];
    }
    clipped.map(|weight| weight / total)
}

/// Minimum number of shared elements for an occupation to be scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapThresholds {
    pub interests: usize,
    pub abilities: usize,
    pub knowledge: usize,
    pub skills: usize,
}

impl Default for OverlapThresholds {
    fn default() -> Self {
        Self {
            interests: 3,
            abilities: 5,
            knowledge: 4,
            skills: 4,
        }
    }
}

impl OverlapThresholds {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Interests => self.interests,
            Category::Abilities => self.abilities,
            Category::Knowledge => self.knowledge,
            Category::Skills => self.skills,
        }
    }
}

/// Hard requirement filters applied before any metric is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub importance_critical_threshold: f64,
    pub min_requirement_ratio: f64,
    pub rules: Vec<CriticalRequirementRule>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            importance_critical_threshold: DEFAULT_IMPORTANCE_CRITICAL_THRESHOLD,
            min_requirement_ratio: DEFAULT_MIN_REQUIREMENT_RATIO,
            rules: base_rules(),
        }
    }
}

/// How non-interest categories are scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Gate, then weighted fit, weighted cosine and Mahalanobis similarity.
    #[default]
    Blended,
    /// Pearson correlation over normalized Level vectors.
    Correlation {
        #[serde(default)]
        normalization: NormalizationMethod,
    },
}

/// Platt parameters mapping a raw score onto a probability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreCalibration {
    pub a: f64,
    pub b: f64,
    pub enabled: bool,
}

impl ScoreCalibration {
    pub fn fitted(a: f64, b: f64) -> Self {
        Self { a, b, enabled: true }
    }

    /// `sigmoid(a · score + b)` when enabled, the raw score otherwise.
    pub fn apply(&self, score: f64) -> f64 {
        if !self.enabled {
            return score;
        }
        sigmoid(self.a * score + self.b)
    }
}

/// Immutable tuning snapshot threaded through every scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dimension_weights: DimensionWeights,
    pub combination_weights: CombinationWeights,
    pub gate: GateConfig,
    pub min_overlap: OverlapThresholds,
    pub hexagon_blend: f64,
    pub overqualification_damping: f64,
    pub mahalanobis_regularization: f64,
    pub strategy: MatchStrategy,
    pub score_calibration: ScoreCalibration,
    pub max_results: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dimension_weights: DimensionWeights::default(),
            combination_weights: CombinationWeights::default(),
            gate: GateConfig::default(),
            min_overlap: OverlapThresholds::default(),
            hexagon_blend: DEFAULT_HEXAGON_BLEND,
            overqualification_damping: OVERQUALIFICATION_DAMPING,
            mahalanobis_regularization: DEFAULT_REGULARIZATION,
            strategy: MatchStrategy::default(),
            score_calibration: ScoreCalibration::default(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl EngineConfig {
    pub fn with_weights(
        mut self,
        dimension_weights: DimensionWeights,
        combination_weights: CombinationWeights,
    ) -> Self {
        self.dimension_weights = dimension_weights.normalized();
        self.combination_weights = combination_weights.normalized();
        self
    }

    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_score_calibration(mut self, calibration: ScoreCalibration) -> Self {
        self.score_calibration = calibration;
        self
    }
}

/// Holder of the active configuration. Readers take an `Arc` snapshot per
/// call; writers replace the whole snapshot at once.
#[derive(Debug, Default)]
pub struct ConfigHandle {
    current: RwLock<Arc<EngineConfig>>,
}

impl ConfigHandle {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn snapshot(&self) -> Arc<EngineConfig> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Installs `config`, returning the snapshot it replaced.
    pub fn replace(&self, config: EngineConfig) -> Arc<EngineConfig> {
        let next = Arc::new(config);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, next);
        info!(
            importance_threshold = guard.gate.importance_critical_threshold,
            min_ratio = guard.gate.min_requirement_ratio,
            calibrated = guard.score_calibration.enabled,
            "engine configuration replaced"
        );
        previous
    }

    /// Derives a new snapshot from the current one and installs it atomically.
    pub fn update<F>(&self, change: F) -> Arc<EngineConfig>
    where
        F: FnOnce(&EngineConfig) -> EngineConfig,
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(change(&guard));
        *guard = Arc::clone(&next);
        next
    }
}
