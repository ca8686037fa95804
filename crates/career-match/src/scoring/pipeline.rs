use std::collections::BTreeMap;

use tracing::debug;

use super::aggregate::aggregate;
use super::config::EngineConfig;
use super::domain::{AggregatedMatch, Category, CategoryMatches, UserProfile};
use super::error::EngineError;
use super::matcher::CategoryMatcher;
use super::matrix::MatrixStore;
use super::metrics::CovarianceCache;

/// Per-category results of one profile, with the categories that could not be used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryScores {
    pub matches: BTreeMap<Category, CategoryMatches>,
    pub skipped: Vec<Category>,
}

impl CategoryScores {
    pub fn categories_used(&self) -> Vec<Category> {
        self.matches.keys().copied().collect()
    }
}

/// Loader, matcher and aggregator wired over shared caches. The configuration
/// is passed per call so candidate configurations can be scored side by side.
#[derive(Clone, Copy)]
pub struct Pipeline<'a> {
    store: &'a MatrixStore,
    covariance: &'a CovarianceCache,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a MatrixStore, covariance: &'a CovarianceCache) -> Self {
        Self { store, covariance }
    }

    pub fn store(&self) -> &'a MatrixStore {
        self.store
    }

    /// Scores every rated category. A category without enough shared elements,
    /// or with no surviving occupation, is skipped; if none remains the call
    /// fails with `InsufficientOverlap`.
    pub fn category_scores(
        &self,
        config: &EngineConfig,
        profile: &UserProfile,
    ) -> Result<CategoryScores, EngineError> {
        let requested = profile.non_empty_categories();
        if requested.is_empty() {
            return Err(EngineError::EmptyProfile);
        }

        let matcher = CategoryMatcher::new(self.store, self.covariance, config);
        let mut scores = CategoryScores::default();

        for category in requested {
            let ratings = profile.rating_map(category);
            match matcher.score(category, &ratings) {
                Ok(matches) if !matches.is_empty() => {
                    scores.matches.insert(category, matches);
                }
                Ok(_) | Err(EngineError::InsufficientOverlap { .. }) => {
                    scores.skipped.push(category);
                }
                Err(other) => return Err(other),
            }
        }

        if scores.matches.is_empty() {
            return Err(EngineError::InsufficientOverlap {
                categories: scores.skipped,
            });
        }

        Ok(scores)
    }

    pub fn aggregate(
        &self,
        config: &EngineConfig,
        profile: &UserProfile,
    ) -> Result<(Vec<AggregatedMatch>, CategoryScores), EngineError> {
        let scores = self.category_scores(config, profile)?;
        for (category, matches) in &scores.matches {
            debug!(%category, occupations = matches.len(), "category scored");
        }
        let aggregated = aggregate(&scores.matches, &config.dimension_weights);
        Ok((aggregated, scores))
    }
}
