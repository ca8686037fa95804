use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::config::GateConfig;
use super::domain::Category;
use super::matrix::OccupationMatrix;

/// Tag carried by rules whose occupation list was derived from the abilities table.
pub const SOC_DERIVED_SOURCE: &str = "soc-derived";

/// Default length of a derived occupation list.
pub const DEFAULT_RULE_TOP_K: usize = 20;

/// Stricter ratio for one element on a named set of occupations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalRequirementRule {
    pub element: String,
    pub threshold_ratio: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Occupation titles, matched case-insensitively before keywords.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub occupations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CriticalRequirementRule {
    pub fn new(element: &str, threshold_ratio: f64, keywords: &[&str]) -> Self {
        Self {
            element: element.to_string(),
            threshold_ratio,
            keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
            occupations: Vec::new(),
            source: None,
        }
    }

    /// Title in the explicit list (case-insensitive), else a keyword substring match.
    pub fn applies_to(&self, occupation: &str) -> bool {
        let lowered = occupation.to_lowercase();
        if self
            .occupations
            .iter()
            .any(|title| title.to_lowercase() == lowered)
        {
            return true;
        }
        self.keywords
            .iter()
            .any(|keyword| lowered.contains(&keyword.to_lowercase()))
    }
}

/// Seed rules; the keyword lists are illustrative and meant to be replaced by
/// data-derived occupation lists.
pub fn base_rules() -> Vec<CriticalRequirementRule> {
    vec![
        CriticalRequirementRule::new("Near Vision", 0.8, &["surgeon", "dentist", "jeweler"]),
        CriticalRequirementRule::new(
            "Physical Strength",
            0.82,
            &["firefighter", "construction", "responder"],
        ),
        CriticalRequirementRule::new(
            "Mathematical Reasoning",
            0.88,
            &["actuary", "statistician", "data scientist"],
        ),
    ]
}

/// Aligned per-element vectors for one (user, occupation) comparison.
#[derive(Debug, Clone, Copy)]
pub struct ElementVectors<'a> {
    pub elements: &'a [String],
    pub user: &'a [f64],
    pub required: &'a [f64],
    pub importance: &'a [f64],
}

impl ElementVectors<'_> {
    fn position(&self, element: &str) -> Option<usize> {
        self.elements.iter().position(|name| name == element)
    }
}

/// Why an occupation was dropped from a category.
#[derive(Debug, Clone, PartialEq)]
pub enum GateRejection {
    CriticalElement { element: String, user: f64, minimum: f64 },
    TargetedRule { element: String, user: f64, minimum: f64 },
}

/// Applies the global critical-importance rule and, for abilities, the
/// occupation-specific rules.
pub fn evaluate_gate(
    occupation: &str,
    category: Category,
    vectors: ElementVectors<'_>,
    gate: &GateConfig,
) -> Result<(), GateRejection> {
    let rows = vectors
        .elements
        .iter()
        .zip(vectors.user)
        .zip(vectors.required.iter().zip(vectors.importance));
    for ((element, user), (required, importance)) in rows {
        if *importance < gate.importance_critical_threshold {
            continue;
        }
        let minimum = required * gate.min_requirement_ratio;
        if *user < minimum {
            return Err(GateRejection::CriticalElement {
                element: element.clone(),
                user: *user,
                minimum,
            });
        }
    }

    if category != Category::Abilities {
        return Ok(());
    }

    for rule in &gate.rules {
        let Some(idx) = vectors.position(&rule.element) else {
            continue;
        };
        if !rule.applies_to(occupation) {
            continue;
        }
        let minimum = vectors.required[idx] * rule.threshold_ratio;
        if vectors.user[idx] < minimum {
            return Err(GateRejection::TargetedRule {
                element: rule.element.clone(),
                user: vectors.user[idx],
                minimum,
            });
        }
    }

    Ok(())
}

pub fn passes_gate(
    occupation: &str,
    category: Category,
    vectors: ElementVectors<'_>,
    gate: &GateConfig,
) -> bool {
    evaluate_gate(occupation, category, vectors, gate).is_ok()
}

/// Attaches to each rule the occupations (from the abilities matrix) where the
/// rule's element is critical and demanding: importance at or above
/// `importance_threshold` and Level at or above `level_ratio × 100`. The list
/// keeps the `top_k` highest Levels, lowercased. Rules with no qualifying
/// occupation are returned unchanged.
pub fn calibrate_rules(
    abilities: &OccupationMatrix,
    base: &[CriticalRequirementRule],
    importance_threshold: f64,
    level_ratio: f64,
    top_k: usize,
) -> Vec<CriticalRequirementRule> {
    base.iter()
        .map(|rule| {
            let Some(column) = abilities.element_index(&rule.element) else {
                return rule.clone();
            };

            let mut qualifying: Vec<(&String, f64)> = abilities
                .occupations()
                .iter()
                .enumerate()
                .filter_map(|(row, title)| {
                    let level = abilities.level(row, column);
                    let importance = abilities.importance(row, column);
                    (!level.is_nan()
                        && importance >= importance_threshold
                        && level >= level_ratio * 100.0)
                        .then_some((title, level))
                })
                .collect();
            qualifying.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

            if qualifying.is_empty() {
                return rule.clone();
            }

            CriticalRequirementRule {
                occupations: qualifying
                    .into_iter()
                    .take(top_k)
                    .map(|(title, _)| title.to_lowercase())
                    .collect(),
                source: Some(SOC_DERIVED_SOURCE.to_string()),
                ..rule.clone()
            }
        })
        .collect()
}
