use super::common::*;
use crate::scoring::config::{EngineConfig, GateConfig};
use crate::scoring::domain::Category;
use crate::scoring::gate::{
    base_rules, calibrate_rules, evaluate_gate, passes_gate, CriticalRequirementRule,
    ElementVectors, GateRejection, SOC_DERIVED_SOURCE,
};
use crate::scoring::matcher::CategoryMatcher;

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn critical_element_below_ratio_rejects_occupation() {
    let elements = names(&["Near Vision", "Stamina"]);
    let vectors = ElementVectors {
        elements: &elements,
        user: &[55.0, 50.0],
        required: &[80.0, 30.0],
        importance: &[85.0, 35.0],
    };

    match evaluate_gate("Dentists", Category::Skills, vectors, &GateConfig::default()) {
        Err(GateRejection::CriticalElement {
            element,
            user,
            minimum,
        }) => {
            assert_eq!(element, "Near Vision");
            assert_eq!(user, 55.0);
            assert!((minimum - 60.0).abs() < 1e-9);
        }
        other => panic!("expected critical element rejection, got {other:?}"),
    }
}

#[test]
fn non_critical_shortfall_passes() {
    let elements = names(&["Near Vision", "Stamina"]);
    let vectors = ElementVectors {
        elements: &elements,
        user: &[10.0, 5.0],
        required: &[80.0, 30.0],
        importance: &[79.0, 35.0],
    };

    assert!(passes_gate("Clerks", Category::Skills, vectors, &GateConfig::default()));
}

#[test]
fn targeted_rule_only_applies_to_abilities() {
    let elements = names(&["Near Vision"]);
    let vectors = ElementVectors {
        elements: &elements,
        user: &[65.0],
        required: &[85.0],
        importance: &[79.0],
    };
    let gate = GateConfig::default();

    match evaluate_gate("Jewelers", Category::Abilities, vectors, &gate) {
        Err(GateRejection::TargetedRule { element, minimum, .. }) => {
            assert_eq!(element, "Near Vision");
            assert!((minimum - 68.0).abs() < 1e-9);
        }
        other => panic!("expected targeted rule rejection, got {other:?}"),
    }

    assert!(passes_gate("Jewelers", Category::Knowledge, vectors, &gate));
    assert!(passes_gate("Clerks", Category::Abilities, vectors, &gate));
}

#[test]
fn explicit_occupation_list_matches_case_insensitively() {
    let rule = CriticalRequirementRule {
        occupations: vec!["clerks".to_string()],
        ..CriticalRequirementRule::new("Near Vision", 0.9, &[])
    };

    assert!(rule.applies_to("Clerks"));
    assert!(rule.applies_to("CLERKS"));
    assert!(!rule.applies_to("Dentists"));
}

#[test]
fn calibrated_rules_carry_lowercased_ranked_occupations() {
    let abilities = matrix(Category::Abilities, &abilities_rows());
    let rules = calibrate_rules(&abilities, &base_rules(), 75.0, 0.7, 20);

    let near_vision = &rules[0];
    assert_eq!(near_vision.element, "Near Vision");
    assert_eq!(near_vision.occupations, vec!["jewelers", "dentists"]);
    assert_eq!(near_vision.source.as_deref(), Some(SOC_DERIVED_SOURCE));
    assert_eq!(near_vision.keywords, base_rules()[0].keywords);

    assert_eq!(rules[1].occupations, vec!["firefighters"]);
    assert_eq!(rules[2].occupations, vec!["actuaries"]);

    let truncated = calibrate_rules(&abilities, &base_rules(), 75.0, 0.7, 1);
    assert_eq!(truncated[0].occupations, vec!["jewelers"]);
}

#[test]
fn rules_without_qualifying_occupations_are_unchanged() {
    let abilities = matrix(Category::Abilities, &abilities_rows());
    let base = vec![CriticalRequirementRule::new("Night Vision", 0.8, &["pilot"])];

    let rules = calibrate_rules(&abilities, &base, 75.0, 0.7, 20);
    assert_eq!(rules, base);

    let strict = calibrate_rules(&abilities, &base_rules(), 99.0, 0.7, 20);
    assert_eq!(strict, base_rules());
}

#[test]
fn matcher_drops_gated_occupations_from_abilities() {
    let store = store();
    let covariance = cache();
    let config = EngineConfig::default();
    let user = ratings(&[
        ("Near Vision", 55.0),
        ("Physical Strength", 50.0),
        ("Mathematical Reasoning", 60.0),
        ("Oral Comprehension", 60.0),
        ("Stamina", 50.0),
        ("Finger Dexterity", 60.0),
    ]);

    let matches = CategoryMatcher::new(&store, &covariance, &config)
        .score(Category::Abilities, &user)
        .expect("abilities scored");

    let titles: Vec<&str> = matches.keys().map(String::as_str).collect();
    assert_eq!(titles, vec!["Actuaries", "Clerks"]);
    for result in matches.values() {
        assert_eq!(result.overlap, 6);
        let metrics = result.metrics.expect("blended metrics");
        assert!(metrics.mahalanobis.is_none());
    }
}
