/// Pearson's r, or `None` when the inputs differ in length, are empty, or
/// either one has zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a <= 0.0 || var_b <= 0.0 {
        return None;
    }

    let r = covariance / (var_a.sqrt() * var_b.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Pearson's r mapped from [-1, 1] onto [0, 1].
pub fn correlation_similarity(user: &[f64], occupation: &[f64]) -> Option<f64> {
    pearson(user, occupation).map(|r| (r + 1.0) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let user = [0.2, 0.9, 0.4, 0.7];
        let score = correlation_similarity(&user, &user).expect("defined");
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn positive_affine_transform_scores_one_and_negation_scores_zero() {
        let user = [1.0, 3.0, 2.0, 5.0];
        let scaled: Vec<f64> = user.iter().map(|v| 4.0 * v + 7.0).collect();
        let negated: Vec<f64> = user.iter().map(|v| -v).collect();

        assert!((correlation_similarity(&user, &scaled).expect("defined") - 1.0).abs() < 1e-12);
        assert!(correlation_similarity(&user, &negated).expect("defined").abs() < 1e-12);
    }

    #[test]
    fn zero_variance_is_undefined() {
        assert!(correlation_similarity(&[0.5, 0.5, 0.5], &[0.1, 0.2, 0.3]).is_none());
        assert!(correlation_similarity(&[0.1, 0.2], &[0.1]).is_none());
    }
}
