use std::collections::{BTreeMap, BTreeSet};

use super::config::{DimensionWeights, ScoreCalibration};
use super::domain::{
    AggregatedMatch, Category, CategoryContribution, CategoryMatches, OccupationMatch,
    Recommendation,
};

/// Matched elements kept per contribution.
pub const MAX_CONTRIBUTION_ELEMENTS: usize = 5;

/// Weighted average of each occupation's category scores, renormalized over
/// the categories the occupation appears in. Categories with a non-positive
/// weight are ignored. Sorted by score descending, then title.
pub fn aggregate(
    category_matches: &BTreeMap<Category, CategoryMatches>,
    weights: &DimensionWeights,
) -> Vec<AggregatedMatch> {
    let titles: BTreeSet<&String> = category_matches
        .values()
        .flat_map(|matches| matches.keys())
        .collect();

    let mut aggregated: Vec<AggregatedMatch> = titles
        .into_iter()
        .filter_map(|title| {
            let present: Vec<(Category, f64, &_)> = category_matches
                .iter()
                .filter_map(|(category, matches)| {
                    let weight = weights.get(*category);
                    if !(weight > 0.0) {
                        return None;
                    }
                    matches.get(title).map(|result| (*category, weight, result))
                })
                .collect();

            let weight_sum: f64 = present.iter().map(|(_, weight, _)| weight).sum();
            if weight_sum <= 0.0 {
                return None;
            }

            let score = present
                .iter()
                .map(|(_, weight, result)| weight * result.score)
                .sum::<f64>()
                / weight_sum;

            let contributions = present
                .into_iter()
                .map(|(category, weight, result)| CategoryContribution {
                    category,
                    score: result.score,
                    weight: weight / weight_sum,
                    overlap_count: result.overlap,
                    elements_matched: result
                        .elements
                        .iter()
                        .take(MAX_CONTRIBUTION_ELEMENTS)
                        .cloned()
                        .collect(),
                })
                .collect();

            Some(AggregatedMatch {
                title: title.clone(),
                score,
                contributions,
            })
        })
        .collect();

    aggregated.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.title.cmp(&b.title)));
    aggregated
}

/// "Strong match based on your X and Y", naming the two categories with the
/// largest `weight × score`.
pub fn describe(contributions: &[CategoryContribution]) -> String {
    let mut ranked: Vec<&CategoryContribution> = contributions.iter().collect();
    ranked.sort_by(|a, b| (b.weight * b.score).total_cmp(&(a.weight * a.score)));
    let names: Vec<&str> = ranked
        .iter()
        .take(2)
        .map(|contribution| contribution.category.as_str())
        .collect();
    format!("Strong match based on your {}", names.join(" and "))
}

/// Top `max_results` aggregated matches with descriptions and, when enabled,
/// Platt-calibrated scores.
pub fn build_recommendation(
    aggregated: Vec<AggregatedMatch>,
    categories_used: Vec<Category>,
    skipped_categories: Vec<Category>,
    calibration: &ScoreCalibration,
    max_results: usize,
) -> Recommendation {
    let total_occupations_analyzed = aggregated.len();
    let matches = aggregated
        .into_iter()
        .take(max_results)
        .map(|entry| OccupationMatch {
            description: describe(&entry.contributions),
            score: calibration.apply(entry.score),
            raw_score: entry.score,
            calibrated: calibration.enabled,
            title: entry.title,
            contributions: entry.contributions,
        })
        .collect();

    Recommendation {
        matches,
        category: "combined".to_string(),
        methodology: format!(
            "Importance-weighted multi-category aggregation using {} assessment types",
            categories_used.len()
        ),
        total_occupations_analyzed,
        categories_used,
        skipped_categories,
    }
}
