//! Holland (RIASEC) hexagon congruence between two interest profiles.

use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Hexagon order; adjacent codes are one step apart.
pub const RIASEC_ORDER: [&str; 6] = [
    "Realistic",
    "Investigative",
    "Artistic",
    "Social",
    "Enterprising",
    "Conventional",
];

/// Iachan rank weights for the first, second and third code.
const IACHAN_WEIGHTS: [f64; 3] = [3.0, 2.0, 1.0];
const IACHAN_TOTAL: f64 = 6.0;

/// Default share of the discrete Iachan component in the final congruence.
pub const DEFAULT_HEXAGON_BLEND: f64 = 0.6;

const ANGULAR_SHARE: f64 = 0.7;

/// Steps between two codes around the hexagon (0..=3). Unknown codes are
/// treated as opposite.
pub fn hexagon_distance(a: &str, b: &str) -> usize {
    match (riasec_index(a), riasec_index(b)) {
        (Some(a), Some(b)) => {
            let diff = a.abs_diff(b);
            diff.min(6 - diff)
        }
        _ => 3,
    }
}

fn riasec_index(code: &str) -> Option<usize> {
    RIASEC_ORDER.iter().position(|candidate| *candidate == code)
}

/// Ratings divided by their total. A zero total leaves the profile unchanged.
pub fn normalize_proportions(profile: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let total: f64 = profile.values().sum();
    if !(total > 0.0) || !total.is_finite() {
        return profile.clone();
    }
    profile
        .iter()
        .map(|(code, value)| (code.clone(), value / total))
        .collect()
}

/// Up to `limit` RIASEC codes carrying a positive weight, strongest first.
/// Equal weights keep hexagon order.
pub fn top_codes(profile: &BTreeMap<String, f64>, limit: usize) -> Vec<&'static str> {
    let mut ranked: Vec<(&'static str, f64)> = RIASEC_ORDER
        .iter()
        .filter_map(|code| {
            profile
                .get(*code)
                .copied()
                .filter(|weight| weight.is_finite() && *weight > 0.0)
                .map(|weight| (*code, weight))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().take(limit).map(|(code, _)| code).collect()
}

/// `0.6 × discrete + 0.4 × continuous` by default; `blend` sets the discrete share.
///
/// Zero unless both profiles have at least three positive RIASEC weights.
pub fn holland_congruence(
    user: &BTreeMap<String, f64>,
    occupation: &BTreeMap<String, f64>,
    blend: f64,
) -> f64 {
    let top_user = top_codes(user, 3);
    let top_occupation = top_codes(occupation, 3);
    if top_user.len() < 3 || top_occupation.len() < 3 {
        return 0.0;
    }

    let discrete: f64 = IACHAN_WEIGHTS
        .iter()
        .zip(top_user.iter().zip(&top_occupation))
        .map(|(weight, (u, o))| (weight - hexagon_distance(u, o) as f64).max(0.0))
        .sum::<f64>()
        / IACHAN_TOTAL;

    let (user_angle, user_magnitude) = hexagon_projection(user);
    let (occupation_angle, occupation_magnitude) = hexagon_projection(occupation);

    let mut angle_diff = (user_angle - occupation_angle).abs();
    angle_diff = angle_diff.min(2.0 * PI - angle_diff);
    let angular = 0.5 * (1.0 + angle_diff.cos());
    let magnitude = (1.0 - (user_magnitude - occupation_magnitude).abs()).max(0.0);
    let continuous = ANGULAR_SHARE * angular + (1.0 - ANGULAR_SHARE) * magnitude;

    let blend = blend.clamp(0.0, 1.0);
    blend * discrete + (1.0 - blend) * continuous
}

/// Angle and length of the proportion-weighted sum of hexagon unit vectors.
fn hexagon_projection(profile: &BTreeMap<String, f64>) -> (f64, f64) {
    let weights: Vec<f64> = RIASEC_ORDER
        .iter()
        .map(|code| {
            profile
                .get(*code)
                .copied()
                .filter(|value| value.is_finite())
                .unwrap_or(0.0)
        })
        .collect();
    let total: f64 = weights.iter().sum();

    let (mut x, mut y) = (0.0, 0.0);
    for (idx, weight) in weights.iter().enumerate() {
        let weight = if total > 0.0 { weight / total } else { *weight };
        let theta = 2.0 * PI * idx as f64 / 6.0;
        x += weight * theta.cos();
        y += weight * theta.sin();
    }

    (y.atan2(x), x.hypot(y))
}
