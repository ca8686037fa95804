use std::collections::BTreeMap;
use std::sync::Arc;

use crate::scoring::config::EngineConfig;
use crate::scoring::domain::{Category, RatingEntry, UserProfile};
use crate::scoring::matrix::{MatrixStore, OccupationMatrix};
use crate::scoring::metrics::CovarianceCache;
use crate::scoring::service::RecommendationService;
use crate::scoring::source::{ElementRow, InMemorySource, ValidationRecord};

pub(super) const SKILL_ELEMENTS: [&str; 5] = [
    "Programming",
    "Mathematics",
    "Critical Thinking",
    "Systems Analysis",
    "Writing",
];

pub(super) const ABILITY_ELEMENTS: [&str; 6] = [
    "Near Vision",
    "Physical Strength",
    "Mathematical Reasoning",
    "Oral Comprehension",
    "Stamina",
    "Finger Dexterity",
];

/// Pushes one Level and one Importance row per element.
fn occupation_rows(
    rows: &mut Vec<ElementRow>,
    title: &str,
    elements: &[&str],
    levels: &[f64],
    importances: &[f64],
) {
    for ((element, level), importance) in elements.iter().zip(levels).zip(importances) {
        rows.push(ElementRow::new(title, *element, "Level", *level));
        rows.push(ElementRow::new(title, *element, "Importance", *importance));
    }
}

pub(super) fn skills_rows() -> Vec<ElementRow> {
    let mut rows = Vec::new();
    let table: [(&str, [f64; 5], [f64; 5]); 6] = [
        (
            "Software Developers",
            [85.0, 80.0, 75.0, 72.0, 50.0],
            [90.0, 70.0, 75.0, 70.0, 40.0],
        ),
        (
            "Statisticians",
            [60.0, 90.0, 80.0, 65.0, 55.0],
            [60.0, 90.0, 80.0, 60.0, 50.0],
        ),
        (
            "Technical Writers",
            [30.0, 35.0, 60.0, 40.0, 85.0],
            [30.0, 30.0, 60.0, 35.0, 90.0],
        ),
        (
            "Chefs",
            [5.0, 30.0, 45.0, 20.0, 25.0],
            [10.0, 30.0, 50.0, 20.0, 30.0],
        ),
        (
            "Network Architects",
            [70.0, 60.0, 70.0, 85.0, 45.0],
            [70.0, 55.0, 70.0, 88.0, 40.0],
        ),
        (
            "Carpenters",
            [5.0, 45.0, 40.0, 15.0, 20.0],
            [5.0, 50.0, 45.0, 10.0, 20.0],
        ),
    ];
    for (title, levels, importances) in table {
        occupation_rows(&mut rows, title, &SKILL_ELEMENTS, &levels, &importances);
    }
    rows
}

pub(super) fn abilities_rows() -> Vec<ElementRow> {
    let mut rows = Vec::new();
    let table: [(&str, [f64; 6], [f64; 6]); 5] = [
        (
            "Dentists",
            [80.0, 30.0, 40.0, 60.0, 30.0, 75.0],
            [85.0, 40.0, 45.0, 70.0, 35.0, 78.0],
        ),
        (
            "Firefighters",
            [50.0, 80.0, 30.0, 60.0, 85.0, 40.0],
            [60.0, 75.0, 35.0, 70.0, 79.0, 50.0],
        ),
        (
            "Actuaries",
            [45.0, 10.0, 90.0, 60.0, 10.0, 20.0],
            [55.0, 15.0, 78.0, 65.0, 15.0, 25.0],
        ),
        (
            "Jewelers",
            [85.0, 20.0, 35.0, 40.0, 15.0, 85.0],
            [79.0, 25.0, 40.0, 45.0, 20.0, 78.0],
        ),
        (
            "Clerks",
            [50.0, 20.0, 40.0, 50.0, 20.0, 40.0],
            [55.0, 20.0, 50.0, 60.0, 25.0, 50.0],
        ),
    ];
    for (title, levels, importances) in table {
        occupation_rows(&mut rows, title, &ABILITY_ELEMENTS, &levels, &importances);
    }
    rows
}

pub(super) fn interests_rows() -> Vec<ElementRow> {
    let table: [(&str, [f64; 6]); 4] = [
        ("Software Developers", [4.0, 7.0, 2.0, 1.5, 2.0, 5.5]),
        ("Chefs", [5.5, 2.0, 6.0, 3.0, 5.0, 2.5]),
        ("Social Workers", [1.0, 3.0, 4.0, 7.0, 3.5, 2.0]),
        ("Statisticians", [2.5, 6.5, 2.0, 2.0, 2.5, 6.0]),
    ];
    let codes = [
        "Realistic",
        "Investigative",
        "Artistic",
        "Social",
        "Enterprising",
        "Conventional",
    ];

    let mut rows = Vec::new();
    for (title, values) in table {
        for (code, value) in codes.iter().zip(values) {
            rows.push(ElementRow::new(title, *code, "Occupational Interests", value));
        }
        rows.push(ElementRow::new(title, "First Interest High-Point", "Interest High-Point", 2.0));
    }
    rows
}

/// Interests, abilities and skills tables; knowledge is deliberately absent.
pub(super) fn source() -> InMemorySource {
    InMemorySource::new()
        .with_elements(Category::Interests.dataset(), interests_rows())
        .with_elements(Category::Abilities.dataset(), abilities_rows())
        .with_elements(Category::Skills.dataset(), skills_rows())
}

pub(super) fn store() -> MatrixStore {
    MatrixStore::new(Arc::new(source()))
}

pub(super) fn cache() -> CovarianceCache {
    CovarianceCache::new(64)
}

pub(super) fn service() -> RecommendationService {
    RecommendationService::new(Arc::new(source()), EngineConfig::default())
}

pub(super) fn matrix(category: Category, rows: &[ElementRow]) -> OccupationMatrix {
    OccupationMatrix::from_rows(category.dataset(), rows)
}

pub(super) fn entries(pairs: &[(&str, f64)]) -> Vec<RatingEntry> {
    pairs
        .iter()
        .map(|(name, rating)| RatingEntry::new(*name, *rating))
        .collect()
}

pub(super) fn ratings(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs
        .iter()
        .map(|(name, rating)| (name.to_string(), *rating))
        .collect()
}

pub(super) fn developer_skills() -> Vec<RatingEntry> {
    entries(&[
        ("Programming", 90.0),
        ("Mathematics", 85.0),
        ("Critical Thinking", 80.0),
        ("Systems Analysis", 75.0),
    ])
}

pub(super) fn investigative_interests() -> Vec<RatingEntry> {
    entries(&[
        ("Realistic", 3.0),
        ("Investigative", 7.0),
        ("Artistic", 2.0),
        ("Social", 1.0),
        ("Enterprising", 1.5),
        ("Conventional", 5.0),
    ])
}

pub(super) fn skills_profile(pairs: &[(&str, f64)]) -> UserProfile {
    UserProfile::default().with(Category::Skills, entries(pairs))
}

pub(super) const CALIBRATION_TARGET: &str = "Data Analysts";
pub(super) const CALIBRATION_SKILLS: [&str; 4] = ["Analysis", "Modeling", "Reporting", "Querying"];

/// Four-skill table where the target needs Level 80 at Importance 70 on every skill.
pub(super) fn calibration_skills_rows() -> Vec<ElementRow> {
    let mut rows = Vec::new();
    let table: [(&str, [f64; 4]); 5] = [
        (CALIBRATION_TARGET, [80.0, 80.0, 80.0, 80.0]),
        ("Bookkeepers", [55.0, 30.0, 70.0, 40.0]),
        ("Economists", [85.0, 75.0, 60.0, 45.0]),
        ("Librarians", [40.0, 20.0, 65.0, 70.0]),
        ("Surveyors", [60.0, 65.0, 35.0, 25.0]),
    ];
    for (title, levels) in table {
        occupation_rows(&mut rows, title, &CALIBRATION_SKILLS, &levels, &[70.0; 4]);
    }
    rows
}

fn skills_json(level: f64) -> String {
    let items: Vec<serde_json::Value> = CALIBRATION_SKILLS
        .iter()
        .map(|name| serde_json::json!({ "name": name, "rating": level }))
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// Twenty rows; user `i` rates every skill `40 + 2i` and the upper half are positives.
pub(super) fn calibration_records() -> Vec<ValidationRecord> {
    (0..20)
        .map(|i| {
            ValidationRecord::default()
                .with("occupation", CALIBRATION_TARGET)
                .with("label", if i >= 10 { "1" } else { "0" })
                .with("user_skills", skills_json(40.0 + 2.0 * f64::from(i)))
        })
        .collect()
}

pub(super) fn calibration_source() -> InMemorySource {
    InMemorySource::new()
        .with_elements(Category::Skills.dataset(), calibration_skills_rows())
        .with_validation("career-validation-csv", calibration_records())
}

pub(super) fn calibration_service() -> RecommendationService {
    RecommendationService::new(Arc::new(calibration_source()), EngineConfig::default())
}
