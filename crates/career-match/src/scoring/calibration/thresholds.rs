use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::scoring::config::{DEFAULT_IMPORTANCE_CRITICAL_THRESHOLD, DEFAULT_MIN_REQUIREMENT_RATIO};
use crate::scoring::domain::Category;
use crate::scoring::matrix::MatrixStore;
use crate::scoring::source::IMPORTANCE_SCALE;

pub const DEFAULT_IMPORTANCE_PERCENTILE: f64 = 75.0;
pub const DEFAULT_LEVEL_PERCENTILE: f64 = 65.0;

const MIN_DERIVED_RATIO: f64 = 0.65;
const MAX_DERIVED_RATIO: f64 = 0.9;

/// Tables whose values feed the percentile derivation.
const THRESHOLD_CATEGORIES: [Category; 3] =
    [Category::Abilities, Category::Knowledge, Category::Skills];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdDerivation {
    pub importance_threshold: f64,
    pub min_requirement_ratio: f64,
    /// False when no table could be read and the defaults were kept.
    pub derived_from_data: bool,
}

/// Linear-interpolated percentile (`p` in 0..=100) of `values`.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Critical-importance threshold from the Importance distribution and minimum
/// requirement ratio from the (rescaled) Level distribution, clamped to
/// [0.65, 0.9]. Unreadable tables are skipped.
pub fn derive_thresholds(
    store: &MatrixStore,
    importance_percentile: f64,
    level_percentile: f64,
) -> ThresholdDerivation {
    let mut importance_values = Vec::new();
    let mut level_values = Vec::new();

    for category in THRESHOLD_CATEGORIES {
        let dataset = category.dataset();
        match store.source().element_rows(dataset) {
            Ok(rows) => importance_values.extend(
                rows.iter()
                    .filter(|row| row.scale_name == IMPORTANCE_SCALE)
                    .map(|row| row.data_value),
            ),
            Err(error) => {
                warn!(dataset, %error, "skipping table in threshold derivation");
                continue;
            }
        }
        match store.matrix(dataset) {
            Ok(matrix) => level_values.extend(matrix.level_values()),
            Err(error) => warn!(dataset, %error, "no level values for threshold derivation"),
        }
    }

    let importance_threshold = percentile(&importance_values, importance_percentile)
        .unwrap_or(DEFAULT_IMPORTANCE_CRITICAL_THRESHOLD);
    let min_requirement_ratio = percentile(&level_values, level_percentile)
        .map(|level| (level / 100.0).clamp(MIN_DERIVED_RATIO, MAX_DERIVED_RATIO))
        .unwrap_or(DEFAULT_MIN_REQUIREMENT_RATIO);
    let derived_from_data = !importance_values.is_empty() || !level_values.is_empty();

    if derived_from_data {
        info!(
            importance_threshold,
            min_requirement_ratio,
            importance_samples = importance_values.len(),
            level_samples = level_values.len(),
            "thresholds derived from element tables"
        );
    } else {
        warn!("no element tables available; keeping default thresholds");
    }

    ThresholdDerivation {
        importance_threshold,
        min_requirement_ratio,
        derived_from_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile(&values, 0.0), Some(10.0));
        assert_eq!(percentile(&values, 100.0), Some(50.0));
        assert_eq!(percentile(&values, 75.0), Some(40.0));
        assert_eq!(percentile(&[1.0, 2.0], 50.0), Some(1.5));
        assert_eq!(percentile(&[], 50.0), None);
    }
}
