//! Pure similarity functions comparing one user vector with one occupation.

mod correlation;
mod fit;
mod holland;
mod mahalanobis;

pub use correlation::{correlation_similarity, pearson};
pub use fit::{weighted_cosine, weighted_fit, OVERQUALIFICATION_DAMPING};
pub use holland::{
    hexagon_distance, holland_congruence, normalize_proportions, top_codes,
    DEFAULT_HEXAGON_BLEND, RIASEC_ORDER,
};
pub use mahalanobis::{
    mahalanobis_similarity, CovarianceCache, CovarianceKey, InverseCovariance,
    DEFAULT_REGULARIZATION,
};

use super::config::CombinationWeights;

/// Weighted blend of the per-occupation metrics. A missing Mahalanobis score
/// drops out and the remaining weights are renormalized. Falls back to the
/// fit score when no weight is left.
pub fn combine_scores(
    fit: f64,
    cosine: f64,
    mahalanobis: Option<f64>,
    weights: &CombinationWeights,
) -> f64 {
    let weights = weights.normalized();
    let mut total = weights.fit * fit + weights.cosine * cosine;
    let mut weight_sum = weights.fit + weights.cosine;

    if let Some(score) = mahalanobis {
        total += weights.mahalanobis * score;
        weight_sum += weights.mahalanobis;
    }

    if weight_sum <= 0.0 {
        return fit;
    }
    total / weight_sum
}
