use serde_json::Value;

use crate::scoring::domain::{Category, RatingEntry, UserProfile};
use crate::scoring::source::ValidationRecord;

pub const LABEL_COLUMNS: [&str; 3] = ["label", "success", "outcome"];
pub const OCCUPATION_COLUMNS: [&str; 4] = ["occupation", "target_occupation", "job", "title"];

/// One labeled outcome: did `occupation` turn out to fit the user behind `profile`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSample {
    pub profile: UserProfile,
    pub occupation: String,
    pub label: bool,
}

fn profile_columns(category: Category) -> [&'static str; 2] {
    match category {
        Category::Interests => ["user_interests", "interests"],
        Category::Abilities => ["user_abilities", "abilities"],
        Category::Knowledge => ["user_knowledge", "knowledge"],
        Category::Skills => ["user_skills", "skills"],
    }
}

/// Rows without an occupation or a 0/1 label are dropped.
pub fn parse_samples(records: &[ValidationRecord]) -> Vec<ValidationSample> {
    records.iter().filter_map(parse_sample).collect()
}

pub fn parse_sample(record: &ValidationRecord) -> Option<ValidationSample> {
    let occupation = record.first_of(&OCCUPATION_COLUMNS)?.trim().to_string();
    let label = parse_label(record.first_of(&LABEL_COLUMNS)?)?;

    let profile = Category::ALL
        .into_iter()
        .fold(UserProfile::default(), |profile, category| {
            let entries = record
                .first_of(&profile_columns(category))
                .map(parse_rating_items)
                .unwrap_or_default();
            profile.with(category, entries)
        });

    Some(ValidationSample {
        profile,
        occupation,
        label,
    })
}

fn parse_label(raw: &str) -> Option<bool> {
    match raw.trim().parse::<i64>().ok()? {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

/// JSON list of `{name|category, rating|score}` objects, or a single object.
/// Malformed JSON yields no entries; malformed items are skipped.
pub fn parse_rating_items(raw: &str) -> Vec<RatingEntry> {
    let items = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(item @ Value::Object(_)) => vec![item],
        _ => return Vec::new(),
    };

    items.iter().filter_map(rating_item).collect()
}

fn rating_item(item: &Value) -> Option<RatingEntry> {
    let object = item.as_object()?;
    let name = ["name", "category"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))?;
    let rating = ["rating", "score"]
        .iter()
        .find_map(|key| object.get(*key).filter(|value| !value.is_null()))?;
    let rating = match rating {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse().ok()?,
        _ => return None,
    };
    Some(RatingEntry::new(name, rating))
}
