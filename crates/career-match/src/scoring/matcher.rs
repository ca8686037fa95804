use std::collections::BTreeMap;

use tracing::debug;

use super::config::{EngineConfig, MatchStrategy};
use super::domain::{Category, CategoryMatches, MatchResult, MetricBreakdown};
use super::error::EngineError;
use super::gate::{evaluate_gate, ElementVectors};
use super::matrix::{MatrixStore, OccupationMatrix};
use super::metrics::{
    combine_scores, correlation_similarity, holland_congruence, mahalanobis_similarity,
    normalize_proportions, top_codes, weighted_cosine, weighted_fit, CovarianceCache,
    CovarianceKey, RIASEC_ORDER,
};
use super::normalize::{normalize_against, NormalizationMethod};

/// Number of leading RIASEC codes reported as an interest match's elements.
const INTEREST_CODES_REPORTED: usize = 3;

/// Scores every occupation of one category against a user's ratings under a
/// fixed configuration snapshot.
pub struct CategoryMatcher<'a> {
    store: &'a MatrixStore,
    covariance: &'a CovarianceCache,
    config: &'a EngineConfig,
}

impl<'a> CategoryMatcher<'a> {
    pub fn new(
        store: &'a MatrixStore,
        covariance: &'a CovarianceCache,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            store,
            covariance,
            config,
        }
    }

    /// Returns the surviving occupations, or `InsufficientOverlap` when the
    /// ratings share fewer elements with the whole table than the category minimum.
    pub fn score(
        &self,
        category: Category,
        ratings: &BTreeMap<String, f64>,
    ) -> Result<CategoryMatches, EngineError> {
        match category {
            Category::Interests => self.score_interests(ratings),
            _ => {
                let matrix = self.store.matrix(category.dataset())?;
                let min_overlap = self.config.min_overlap.get(category);
                let shared = ratings
                    .keys()
                    .filter(|name| matrix.element_index(name).is_some())
                    .count();
                if shared < min_overlap {
                    debug!(%category, shared, min_overlap, "category skipped for insufficient overlap");
                    return Err(EngineError::InsufficientOverlap {
                        categories: vec![category],
                    });
                }

                let matches = match self.config.strategy {
                    MatchStrategy::Blended => self.score_blended(category, &matrix, ratings),
                    MatchStrategy::Correlation { normalization } => {
                        self.score_correlation(category, &matrix, ratings, normalization)
                    }
                };
                Ok(matches)
            }
        }
    }

    fn score_interests(
        &self,
        ratings: &BTreeMap<String, f64>,
    ) -> Result<CategoryMatches, EngineError> {
        let category = Category::Interests;
        let profiles = self.store.interest_profiles(category.dataset())?;
        let min_overlap = self.config.min_overlap.get(category);

        let rated_codes = RIASEC_ORDER
            .iter()
            .filter(|code| ratings.contains_key(**code))
            .count();
        if rated_codes < min_overlap {
            debug!(%category, shared = rated_codes, min_overlap, "category skipped for insufficient overlap");
            return Err(EngineError::InsufficientOverlap {
                categories: vec![category],
            });
        }

        let user = normalize_proportions(ratings);
        let mut matches = CategoryMatches::new();
        for (title, occupation) in profiles.iter() {
            let overlap = RIASEC_ORDER
                .iter()
                .filter(|code| user.contains_key(**code) && occupation.contains_key(**code))
                .count();
            if overlap < min_overlap {
                continue;
            }

            let score = holland_congruence(&user, occupation, self.config.hexagon_blend);
            let elements = top_codes(occupation, INTEREST_CODES_REPORTED)
                .into_iter()
                .map(str::to_string)
                .collect();

            matches.insert(
                title.clone(),
                MatchResult {
                    score,
                    overlap,
                    elements,
                    metrics: None,
                },
            );
        }

        Ok(matches)
    }

    fn score_blended(
        &self,
        category: Category,
        matrix: &OccupationMatrix,
        ratings: &BTreeMap<String, f64>,
    ) -> CategoryMatches {
        let min_overlap = self.config.min_overlap.get(category);
        let shared: Vec<(usize, &String, f64)> = ratings
            .iter()
            .filter_map(|(name, rating)| matrix.element_index(name).map(|idx| (idx, name, *rating)))
            .collect();

        let mut matches = CategoryMatches::new();
        let mut gated = 0usize;

        for (row, title) in matrix.occupations().iter().enumerate() {
            let mut elements = Vec::with_capacity(shared.len());
            let mut user = Vec::with_capacity(shared.len());
            let mut required = Vec::with_capacity(shared.len());
            let mut importance = Vec::with_capacity(shared.len());

            for (column, name, rating) in &shared {
                let level = matrix.level(row, *column);
                if level.is_nan() {
                    continue;
                }
                elements.push((*name).clone());
                user.push(*rating);
                required.push(level);
                importance.push(matrix.importance(row, *column));
            }

            if elements.len() < min_overlap {
                continue;
            }

            let vectors = ElementVectors {
                elements: &elements,
                user: &user,
                required: &required,
                importance: &importance,
            };
            if evaluate_gate(title, category, vectors, &self.config.gate).is_err() {
                gated += 1;
                continue;
            }

            let (fit, importance_weight) = weighted_fit(
                &user,
                &required,
                &importance,
                self.config.overqualification_damping,
            );
            if importance_weight == 0.0 {
                continue;
            }

            let cosine = weighted_cosine(&user, &required, &importance);
            let key = CovarianceKey::new(
                matrix.dataset(),
                &elements,
                self.config.mahalanobis_regularization,
            );
            let mahalanobis = self
                .covariance
                .inverse(matrix, key)
                .and_then(|inverse| mahalanobis_similarity(&inverse, &user, &required));

            let score = combine_scores(
                fit,
                cosine,
                mahalanobis,
                &self.config.combination_weights,
            );

            matches.insert(
                title.clone(),
                MatchResult {
                    score,
                    overlap: elements.len(),
                    elements,
                    metrics: Some(MetricBreakdown {
                        fit,
                        cosine,
                        mahalanobis,
                        importance_weight,
                    }),
                },
            );
        }

        debug!(%category, matched = matches.len(), gated, "blended category scored");
        matches
    }

    fn score_correlation(
        &self,
        category: Category,
        matrix: &OccupationMatrix,
        ratings: &BTreeMap<String, f64>,
        normalization: NormalizationMethod,
    ) -> CategoryMatches {
        let view = normalize_against(matrix, ratings, normalization);
        let mut matches = CategoryMatches::new();
        if view.is_empty() {
            return matches;
        }

        for (title, row) in matrix.occupations().iter().zip(&view.rows) {
            if row.iter().any(|value| value.is_nan()) {
                continue;
            }
            let Some(score) = correlation_similarity(&view.user, row) else {
                continue;
            };

            matches.insert(
                title.clone(),
                MatchResult {
                    score,
                    overlap: view.elements.len(),
                    elements: view.elements.clone(),
                    metrics: None,
                },
            );
        }

        debug!(%category, matched = matches.len(), ?normalization, "correlation category scored");
        matches
    }
}
