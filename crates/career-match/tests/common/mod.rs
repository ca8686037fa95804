#![allow(dead_code)]

use std::sync::Arc;

use career_match::scoring::{
    Category, ElementRow, EngineConfig, InMemorySource, RatingEntry, RecommendationService,
    UserProfile, ValidationRecord,
};

pub const SKILLS: [&str; 4] = ["Programming", "Mathematics", "Critical Thinking", "Systems Analysis"];

/// (title, levels, importances) over [`SKILLS`].
pub const SKILL_TABLE: [(&str, [f64; 4], [f64; 4]); 5] = [
    (
        "Software Developers",
        [85.0, 80.0, 75.0, 72.0],
        [90.0, 70.0, 75.0, 70.0],
    ),
    ("Statisticians", [60.0, 90.0, 80.0, 65.0], [60.0, 90.0, 80.0, 60.0]),
    ("Technical Writers", [30.0, 35.0, 60.0, 40.0], [30.0, 30.0, 60.0, 35.0]),
    ("Chefs", [5.0, 30.0, 45.0, 20.0], [10.0, 30.0, 50.0, 20.0]),
    ("Network Architects", [70.0, 60.0, 70.0, 85.0], [70.0, 55.0, 70.0, 88.0]),
];

pub fn skill_rows() -> Vec<ElementRow> {
    let mut rows = Vec::new();
    for (title, levels, importances) in SKILL_TABLE {
        for ((element, level), importance) in SKILLS.iter().zip(levels).zip(importances) {
            rows.push(ElementRow::new(title, *element, "Level", level));
            rows.push(ElementRow::new(title, *element, "Importance", importance));
        }
    }
    rows
}

pub fn skills(values: [f64; 4]) -> Vec<RatingEntry> {
    SKILLS
        .iter()
        .zip(values)
        .map(|(name, rating)| RatingEntry::new(*name, rating))
        .collect()
}

pub fn developer_profile() -> UserProfile {
    UserProfile::default().with(Category::Skills, skills([90.0, 85.0, 80.0, 75.0]))
}

fn skills_json(values: [f64; 4]) -> String {
    let items: Vec<serde_json::Value> = SKILLS
        .iter()
        .zip(values)
        .map(|(name, rating)| serde_json::json!({ "name": name, "rating": rating }))
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// Developers-targeted outcomes: the closer the profile, the likelier the hire.
pub fn validation_records() -> Vec<ValidationRecord> {
    (0..12)
        .map(|i| {
            let level = 64.0 + 3.0 * f64::from(i);
            ValidationRecord::default()
                .with("target_occupation", "Software Developers")
                .with("outcome", if i >= 6 { "1" } else { "0" })
                .with("skills", skills_json([level; 4]))
        })
        .collect()
}

pub fn source() -> InMemorySource {
    InMemorySource::new()
        .with_elements(Category::Skills.dataset(), skill_rows())
        .with_validation("career-validation-csv", validation_records())
}

pub fn service() -> RecommendationService {
    RecommendationService::new(Arc::new(source()), EngineConfig::default())
}
