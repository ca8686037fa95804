use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::matrix::OccupationMatrix;

/// Columns narrower than this are treated as constant.
const DEGENERATE_SPREAD: f64 = 1e-8;

/// Value both series take on a constant column under min-max scaling.
pub const NEUTRAL_MINMAX_VALUE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    #[default]
    #[serde(alias = "minmax")]
    MinMax,
    #[serde(alias = "zscore")]
    ZScore,
}

/// Level matrix and user vector restricted to their shared elements and
/// rescaled with the occupation columns' statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedView {
    pub elements: Vec<String>,
    /// One row per matrix occupation, in matrix order. `NaN` marks a missing Level.
    pub rows: Vec<Vec<f64>>,
    pub user: Vec<f64>,
}

impl NormalizedView {
    /// An empty view means no element is shared: no match is possible.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

pub fn normalize_against(
    matrix: &OccupationMatrix,
    user: &BTreeMap<String, f64>,
    method: NormalizationMethod,
) -> NormalizedView {
    let shared: Vec<(usize, &String, f64)> = user
        .iter()
        .filter_map(|(name, rating)| matrix.element_index(name).map(|idx| (idx, name, *rating)))
        .collect();

    if shared.is_empty() {
        debug!(dataset = matrix.dataset(), "no shared elements to normalize");
        return NormalizedView::default();
    }

    let mut rows = vec![Vec::with_capacity(shared.len()); matrix.occupations().len()];
    let mut scaled_user = Vec::with_capacity(shared.len());

    for (column, name, rating) in &shared {
        let values: Vec<f64> = matrix.level_column(*column).collect();
        let (scaled_column, scaled_rating) = match method {
            NormalizationMethod::MinMax => minmax_column(&values, *rating),
            NormalizationMethod::ZScore => zscore_column(&values, *rating),
        };
        if scaled_column.windows(2).all(|pair| pair[0] == pair[1]) {
            debug!(element = name.as_str(), ?method, "constant column after scaling");
        }
        for (row, value) in rows.iter_mut().zip(scaled_column) {
            row.push(value);
        }
        scaled_user.push(scaled_rating);
    }

    NormalizedView {
        elements: shared.into_iter().map(|(_, name, _)| name.clone()).collect(),
        rows,
        user: scaled_user,
    }
}

fn minmax_column(values: &[f64], rating: f64) -> (Vec<f64>, f64) {
    let (min, max) = values
        .iter()
        .filter(|value| !value.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| {
            (lo.min(*value), hi.max(*value))
        });
    let range = max - min;

    if !range.is_finite() || range < DEGENERATE_SPREAD {
        return (
            vec![NEUTRAL_MINMAX_VALUE; values.len()],
            NEUTRAL_MINMAX_VALUE,
        );
    }

    let scaled = values.iter().map(|value| (value - min) / range).collect();
    let user = ((rating - min) / range).clamp(0.0, 1.0);
    (scaled, user)
}

fn zscore_column(values: &[f64], rating: f64) -> (Vec<f64>, f64) {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let std = sample_std(&present);

    match std {
        Some((mean, std)) if std >= DEGENERATE_SPREAD => {
            let scaled = values.iter().map(|value| (value - mean) / std).collect();
            (scaled, (rating - mean) / std)
        }
        _ => (vec![0.0; values.len()], 0.0),
    }
}

/// Mean and sample (n - 1) standard deviation.
fn sample_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, variance.sqrt()))
}
