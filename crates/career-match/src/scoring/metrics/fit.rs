//! Importance-weighted comparisons of a user's levels against required levels.
//!
//! All three slices are aligned on the same element order. Levels are on the
//! 0-100 scale and importances are 0-100 weights.

/// Default scaling of the over-qualification penalty.
pub const OVERQUALIFICATION_DAMPING: f64 = 0.3;

/// Importance-weighted mean of per-element fit.
///
/// Shortfall is penalised quadratically (`(user / required)^2`). Overage costs
/// at most `(1 - required / 100) * damping` per element. Elements with zero
/// importance are ignored and elements with no requirement count as met.
///
/// Returns `(score, total_importance)`; a zero total means nothing was weighed.
pub fn weighted_fit(user: &[f64], required: &[f64], importance: &[f64], damping: f64) -> (f64, f64) {
    let mut weighted_score = 0.0;
    let mut total_weight = 0.0;

    for ((user_level, required_level), weight) in user.iter().zip(required).zip(importance) {
        if !(*weight > 0.0) {
            continue;
        }

        let fit = element_fit(*user_level, *required_level, damping);
        weighted_score += fit * weight;
        total_weight += weight;
    }

    if total_weight == 0.0 {
        return (0.0, 0.0);
    }

    (weighted_score / total_weight, total_weight)
}

pub(crate) fn element_fit(user_level: f64, required_level: f64, damping: f64) -> f64 {
    let fit = if required_level <= 0.0 {
        1.0
    } else if user_level < required_level {
        (user_level.max(0.0) / required_level).powi(2)
    } else {
        let overage = ((user_level - required_level) / 100.0).min(1.0);
        1.0 - (1.0 - required_level / 100.0) * overage * damping
    };

    fit.clamp(0.0, 1.0)
}

/// Cosine similarity of the importance-masked vectors, mapped onto [0, 1].
/// Zero when either masked vector has no length.
pub fn weighted_cosine(user: &[f64], required: &[f64], importance: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut user_norm = 0.0;
    let mut required_norm = 0.0;

    for ((user_level, required_level), weight) in user.iter().zip(required).zip(importance) {
        let mask = weight / 100.0;
        let u = user_level * mask;
        let r = required_level * mask;
        dot += u * r;
        user_norm += u * u;
        required_norm += r * r;
    }

    let denominator = user_norm.sqrt() * required_norm.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    let cosine = (dot / denominator).clamp(-1.0, 1.0);
    (cosine + 1.0) / 2.0
}
