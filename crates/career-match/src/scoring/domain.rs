use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Assessment dimension a user profile and an element table are scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Interests,
    Abilities,
    Knowledge,
    Skills,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Interests,
        Category::Abilities,
        Category::Knowledge,
        Category::Skills,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Interests => "interests",
            Category::Abilities => "abilities",
            Category::Knowledge => "knowledge",
            Category::Skills => "skills",
        }
    }

    /// Name of the element table backing this category.
    pub fn dataset(&self) -> &'static str {
        match self {
            Category::Interests => "elements-interests-csv",
            Category::Abilities => "elements-abilities-csv",
            Category::Knowledge => "elements-knowledge-2-csv",
            Category::Skills => "elements-skills-csv",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single self-reported rating, keyed by the element's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub name: String,
    pub rating: f64,
}

impl RatingEntry {
    pub fn new(name: impl Into<String>, rating: f64) -> Self {
        Self {
            name: name.into(),
            rating,
        }
    }
}

/// User ratings per category, built fresh for every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<RatingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<RatingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge: Vec<RatingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<RatingEntry>,
}

impl UserProfile {
    pub fn ratings(&self, category: Category) -> &[RatingEntry] {
        match category {
            Category::Interests => &self.interests,
            Category::Abilities => &self.abilities,
            Category::Knowledge => &self.knowledge,
            Category::Skills => &self.skills,
        }
    }

    pub fn ratings_mut(&mut self, category: Category) -> &mut Vec<RatingEntry> {
        match category {
            Category::Interests => &mut self.interests,
            Category::Abilities => &mut self.abilities,
            Category::Knowledge => &mut self.knowledge,
            Category::Skills => &mut self.skills,
        }
    }

    pub fn with(mut self, category: Category, entries: Vec<RatingEntry>) -> Self {
        *self.ratings_mut(category) = entries;
        self
    }

    /// Categories carrying at least one rating, in canonical order.
    pub fn non_empty_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|category| !self.ratings(*category).is_empty())
            .collect()
    }

    /// Rating lookup for a category. Non-finite ratings are dropped and
    /// negative ones floored at zero; a repeated name keeps its last rating.
    pub fn rating_map(&self, category: Category) -> BTreeMap<String, f64> {
        self.ratings(category)
            .iter()
            .filter(|entry| entry.rating.is_finite())
            .map(|entry| (entry.name.trim().to_string(), entry.rating.max(0.0)))
            .collect()
    }
}

/// Per-metric detail kept alongside a blended category score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBreakdown {
    pub fit: f64,
    pub cosine: f64,
    pub mahalanobis: Option<f64>,
    pub importance_weight: f64,
}

/// Score of one occupation within one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: f64,
    pub overlap: usize,
    pub elements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricBreakdown>,
}

/// All surviving occupations of one category, keyed by title.
pub type CategoryMatches = BTreeMap<String, MatchResult>;

/// Discrete contribution of a category to an occupation's final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryContribution {
    pub category: Category,
    pub score: f64,
    pub weight: f64,
    pub overlap_count: usize,
    pub elements_matched: Vec<String>,
}

/// Weighted combination of an occupation's category scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMatch {
    pub title: String,
    pub score: f64,
    pub contributions: Vec<CategoryContribution>,
}

/// Ranked entry surfaced to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupationMatch {
    pub title: String,
    /// Final score, passed through the Platt sigmoid when calibration is on.
    pub score: f64,
    pub raw_score: f64,
    pub calibrated: bool,
    pub description: String,
    pub contributions: Vec<CategoryContribution>,
}

/// Response envelope for a multi-category recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub matches: Vec<OccupationMatch>,
    pub category: String,
    pub methodology: String,
    pub total_occupations_analyzed: usize,
    pub categories_used: Vec<Category>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_categories: Vec<Category>,
}
