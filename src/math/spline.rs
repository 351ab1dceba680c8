// Copyright @yucwang 2026

use crate::math::constants::Float;
use crate::core::probability_dist::find_index_of_next_smallest_value;

#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<Float>,
    ys: Vec<Float>,
    second: Vec<Float>,
}

impl CubicSpline {
    // `xs` must be strictly increasing with at least two entries.
    pub fn natural(xs: Vec<Float>, ys: Vec<Float>) -> Self {
        let n = xs.len();
        let mut second = vec![0.0; n];
        if n > 2 {
            // Thomas algorithm on the interior rows.
            let mut diag = vec![0.0; n];
            let mut rhs = vec![0.0; n];
            let mut upper = vec![0.0; n];
            for i in 1..n - 1 {
                let h0 = xs[i] - xs[i - 1];
                let h1 = xs[i + 1] - xs[i];
                diag[i] = 2.0 * (h0 + h1);
                upper[i] = h1;
                rhs[i] = 6.0 * ((ys[i + 1] - ys[i]) / h1 - (ys[i] - ys[i - 1]) / h0);
                if i > 1 {
                    let w = h0 / diag[i - 1];
                    diag[i] -= w * upper[i - 1];
                    rhs[i] -= w * rhs[i - 1];
                }
            }
            second[n - 2] = rhs[n - 2] / diag[n - 2];
            for i in (1..n - 2).rev() {
                second[i] = (rhs[i] - upper[i] * second[i + 1]) / diag[i];
            }
        }
        Self { xs, ys, second }
    }

    pub fn xs(&self) -> &[Float] {
        &self.xs
    }

    pub fn eval(&self, x: Float) -> Float {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }
        let i = find_index_of_next_smallest_value(&self.xs, x);
        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;
        a * self.ys[i] + b * self.ys[i + 1]
            + ((a * a * a - a) * self.second[i] + (b * b * b - b) * self.second[i + 1]) * h * h / 6.0
    }
}
