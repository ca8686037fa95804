//! Mahalanobis-derived similarity with a bounded inverse-covariance memo.

use std::sync::Arc;

use moka::sync::Cache;
use tracing::debug;

use crate::scoring::matrix::OccupationMatrix;

/// Ridge added to the covariance diagonal before inversion.
pub const DEFAULT_REGULARIZATION: f64 = 1e-3;

/// Pivots smaller than this make the matrix numerically singular.
const SINGULAR_PIVOT: f64 = 1e-12;

/// Inverse of a regularized sample covariance matrix over an element subset.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseCovariance {
    dim: usize,
    values: Vec<f64>,
}

impl InverseCovariance {
    /// Inverts the sample covariance of `samples` (one row per observation).
    ///
    /// Returns `None` when there are fewer observations than dimensions or
    /// the regularized matrix is still singular.
    pub fn from_samples(samples: &[Vec<f64>], regularization: f64) -> Option<Self> {
        let dim = samples.first()?.len();
        if dim == 0 || samples.len() < dim.max(2) {
            return None;
        }
        if samples.iter().any(|row| row.len() != dim) {
            return None;
        }

        let n = samples.len() as f64;
        let means: Vec<f64> = (0..dim)
            .map(|col| samples.iter().map(|row| row[col]).sum::<f64>() / n)
            .collect();

        let mut covariance = vec![0.0; dim * dim];
        for row in samples {
            for i in 0..dim {
                let di = row[i] - means[i];
                for j in i..dim {
                    covariance[i * dim + j] += di * (row[j] - means[j]);
                }
            }
        }
        for i in 0..dim {
            for j in i..dim {
                let value = covariance[i * dim + j] / (n - 1.0);
                covariance[i * dim + j] = value;
                covariance[j * dim + i] = value;
            }
            covariance[i * dim + i] += regularization;
        }

        invert(covariance, dim).map(|values| Self { dim, values })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// `(a - b)ᵀ Σ⁻¹ (a - b)`, or `None` on a length mismatch.
    pub fn squared_distance(&self, a: &[f64], b: &[f64]) -> Option<f64> {
        if a.len() != self.dim || b.len() != self.dim {
            return None;
        }

        let delta: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
        let mut total = 0.0;
        for i in 0..self.dim {
            let row = &self.values[i * self.dim..(i + 1) * self.dim];
            let projected: f64 = row.iter().zip(&delta).map(|(m, d)| m * d).sum();
            total += delta[i] * projected;
        }
        Some(total.max(0.0))
    }
}

/// Gauss-Jordan elimination with partial pivoting on a row-major square matrix.
fn invert(mut matrix: Vec<f64>, dim: usize) -> Option<Vec<f64>> {
    let mut inverse = vec![0.0; dim * dim];
    for i in 0..dim {
        inverse[i * dim + i] = 1.0;
    }

    for col in 0..dim {
        let pivot_row = (col..dim).max_by(|a, b| {
            matrix[a * dim + col]
                .abs()
                .total_cmp(&matrix[b * dim + col].abs())
        })?;
        let pivot = matrix[pivot_row * dim + col];
        if !pivot.is_finite() || pivot.abs() < SINGULAR_PIVOT {
            return None;
        }

        if pivot_row != col {
            for k in 0..dim {
                matrix.swap(pivot_row * dim + k, col * dim + k);
                inverse.swap(pivot_row * dim + k, col * dim + k);
            }
        }

        for k in 0..dim {
            matrix[col * dim + k] /= pivot;
            inverse[col * dim + k] /= pivot;
        }

        for row in 0..dim {
            if row == col {
                continue;
            }
            let factor = matrix[row * dim + col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..dim {
                matrix[row * dim + k] -= factor * matrix[col * dim + k];
                inverse[row * dim + k] -= factor * inverse[col * dim + k];
            }
        }
    }

    inverse.iter().all(|value| value.is_finite()).then_some(inverse)
}

/// Canonical cache key: dataset, sorted distinct element names, ridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CovarianceKey {
    dataset: String,
    elements: Vec<String>,
    regularization_bits: u64,
}

impl CovarianceKey {
    pub fn new<S: AsRef<str>>(dataset: &str, elements: &[S], regularization: f64) -> Self {
        let mut elements: Vec<String> = elements
            .iter()
            .map(|element| element.as_ref().to_string())
            .collect();
        elements.sort();
        elements.dedup();
        Self {
            dataset: dataset.to_string(),
            elements,
            regularization_bits: regularization.to_bits(),
        }
    }

    /// Element names in the order the inverse's rows and columns follow.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }
}

/// Bounded memo of inverse covariances. Ill-conditioned subsets are cached as `None`.
pub struct CovarianceCache {
    cache: Cache<CovarianceKey, Option<Arc<InverseCovariance>>>,
}

impl CovarianceCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_entries).build();
        Self { cache }
    }

    /// Inverse covariance of the Level columns named by `key`, across every
    /// occupation with a defined Level on all of them.
    pub fn inverse(
        &self,
        matrix: &OccupationMatrix,
        key: CovarianceKey,
    ) -> Option<Arc<InverseCovariance>> {
        self.cache
            .get_with(key.clone(), || build_inverse(matrix, &key).map(Arc::new))
    }

    pub fn contains(&self, key: &CovarianceKey) -> bool {
        self.cache.contains_key(key)
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

fn build_inverse(matrix: &OccupationMatrix, key: &CovarianceKey) -> Option<InverseCovariance> {
    let columns: Option<Vec<usize>> = key
        .elements()
        .iter()
        .map(|element| matrix.element_index(element))
        .collect();
    let columns = columns?;

    let samples: Vec<Vec<f64>> = (0..matrix.occupations().len())
        .map(|row| columns.iter().map(|col| matrix.level(row, *col)).collect::<Vec<f64>>())
        .filter(|values| values.iter().all(|value| value.is_finite()))
        .collect();

    let inverse = InverseCovariance::from_samples(&samples, f64::from_bits(key.regularization_bits));
    if inverse.is_none() {
        debug!(
            dataset = key.dataset.as_str(),
            elements = key.elements.len(),
            observations = samples.len(),
            "covariance not invertible; mahalanobis skipped"
        );
    }
    inverse
}

/// `exp(-0.5 · d² / n)` for the squared distance between the two vectors.
pub fn mahalanobis_similarity(
    inverse: &InverseCovariance,
    user: &[f64],
    required: &[f64],
) -> Option<f64> {
    let distance = inverse.squared_distance(user, required)?;
    let similarity = (-0.5 * distance / inverse.dim() as f64).exp();
    similarity.is_finite().then_some(similarity)
}
