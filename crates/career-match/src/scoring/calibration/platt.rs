use serde::{Deserialize, Serialize};

/// Gradient size below which the fit stops early.
const CONVERGENCE_TOLERANCE: f64 = 1e-6;

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Gradient-descent settings for Platt scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlattParams {
    pub learning_rate: f64,
    pub max_iterations: usize,
    pub regularization: f64,
}

impl Default for PlattParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            max_iterations: 500,
            regularization: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattFit {
    pub a: f64,
    pub b: f64,
    pub iterations: usize,
}

/// Fits `P(label) = sigmoid(a · score + b)` by gradient descent on the mean
/// log-loss with an L2 penalty on both parameters.
///
/// A single-class input returns `a = b = 0` after zero iterations.
pub fn platt_scale(scores: &[f64], labels: &[bool], params: &PlattParams) -> PlattFit {
    let positives = labels.iter().filter(|label| **label).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 || scores.len() != labels.len() {
        return PlattFit {
            a: 0.0,
            b: 0.0,
            iterations: 0,
        };
    }

    let n = scores.len() as f64;
    let mut a = 0.0;
    let mut b = ((positives as f64 + 1.0) / (negatives as f64 + 1.0)).ln();

    for iteration in 1..=params.max_iterations {
        let (mut grad_a, mut grad_b) = (0.0, 0.0);
        for (score, label) in scores.iter().zip(labels) {
            let error = sigmoid(a * score + b) - if *label { 1.0 } else { 0.0 };
            grad_a += error * score;
            grad_b += error;
        }
        grad_a = grad_a / n + params.regularization * a;
        grad_b = grad_b / n + params.regularization * b;

        a -= params.learning_rate * grad_a;
        b -= params.learning_rate * grad_b;

        if grad_a.abs().max(grad_b.abs()) < CONVERGENCE_TOLERANCE {
            return PlattFit { a, b, iterations: iteration };
        }
    }

    PlattFit {
        a,
        b,
        iterations: params.max_iterations,
    }
}
