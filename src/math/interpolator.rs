// Copyright @yucwang 2026

use crate::core::error::DataError;
use crate::core::probability_dist::find_index_of_next_smallest_value;
use crate::math::constants::Float;
use crate::math::spline::CubicSpline;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterpolationKind {
    Linear,
    LogLogLinear,
    // Log-log linear, except a first interval touching zero, which is linear.
    LogLogLinearFromZero,
    Spline,
    LogLogSpline,
}

// Piecewise-linear table. For the log-log variant both columns hold log10 values.
#[derive(Debug, Clone)]
pub struct LinearTable {
    xs: Vec<Float>,
    ys: Vec<Float>,
}

impl LinearTable {
    fn eval(&self, x: Float) -> Float {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }
        let i = find_index_of_next_smallest_value(&self.xs, x);
        let t = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        self.ys[i] + t * (self.ys[i + 1] - self.ys[i])
    }

    // Raw columns; only the first knot may be zero.
    fn eval_log_log(&self, x: Float) -> Float {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }
        let i = find_index_of_next_smallest_value(&self.xs, x);
        let (x0, x1, y0, y1) = (self.xs[i], self.xs[i + 1], self.ys[i], self.ys[i + 1]);
        if x0 <= 0.0 || y0 <= 0.0 {
            return y0 + (x - x0) / (x1 - x0) * (y1 - y0);
        }
        let t = (x / x0).ln() / (x1 / x0).ln();
        y0 * (y1 / y0).powf(t)
    }
}

// One-dimensional interpolation over tabulated data. Queries outside the
// tabulated abscissae return the nearest end value; callers that must not
// extrapolate check `domain()` first.
#[derive(Debug, Clone)]
pub enum Interpolator {
    Linear(LinearTable),
    LogLogLinear(LinearTable),
    LogLogLinearFromZero(LinearTable),
    Spline(CubicSpline),
    LogLogSpline(CubicSpline),
}

impl Interpolator {
    pub fn new(kind: InterpolationKind, name: &str, xs: &[Float], ys: &[Float]) -> Result<Self, DataError> {
        validate_table(name, xs, ys)?;
        let log_space = matches!(kind, InterpolationKind::LogLogLinear | InterpolationKind::LogLogSpline);
        let (xs, ys) = if log_space {
            if xs.iter().chain(ys.iter()).any(|v| *v <= 0.0) {
                return Err(DataError::NonPositiveLogData(name.to_string()));
            }
            (xs.iter().map(|v| v.log10()).collect::<Vec<_>>(),
             ys.iter().map(|v| v.log10()).collect::<Vec<_>>())
        } else {
            (xs.to_vec(), ys.to_vec())
        };
        if kind == InterpolationKind::LogLogLinearFromZero
            && (xs[0] < 0.0 || ys[0] < 0.0 || xs[1..].iter().chain(ys[1..].iter()).any(|v| *v <= 0.0))
        {
            return Err(DataError::NonPositiveLogData(name.to_string()));
        }

        Ok(match kind {
            InterpolationKind::Linear => Interpolator::Linear(LinearTable { xs, ys }),
            InterpolationKind::LogLogLinear => Interpolator::LogLogLinear(LinearTable { xs, ys }),
            InterpolationKind::LogLogLinearFromZero => Interpolator::LogLogLinearFromZero(LinearTable { xs, ys }),
            InterpolationKind::Spline => Interpolator::Spline(CubicSpline::natural(xs, ys)),
            InterpolationKind::LogLogSpline => Interpolator::LogLogSpline(CubicSpline::natural(xs, ys)),
        })
    }

    pub fn kind(&self) -> InterpolationKind {
        match self {
            Interpolator::Linear(_) => InterpolationKind::Linear,
            Interpolator::LogLogLinear(_) => InterpolationKind::LogLogLinear,
            Interpolator::LogLogLinearFromZero(_) => InterpolationKind::LogLogLinearFromZero,
            Interpolator::Spline(_) => InterpolationKind::Spline,
            Interpolator::LogLogSpline(_) => InterpolationKind::LogLogSpline,
        }
    }

    pub fn eval(&self, x: Float) -> Float {
        match self {
            Interpolator::Linear(table) => table.eval(x),
            Interpolator::LogLogLinear(table) => Float::powf(10.0, table.eval(x.log10())),
            Interpolator::LogLogLinearFromZero(table) => table.eval_log_log(x),
            Interpolator::Spline(spline) => spline.eval(x),
            Interpolator::LogLogSpline(spline) => Float::powf(10.0, spline.eval(x.log10())),
        }
    }

    pub fn knots(&self) -> Vec<Float> {
        match self {
            Interpolator::Linear(table) | Interpolator::LogLogLinearFromZero(table) => table.xs.clone(),
            Interpolator::Spline(spline) => spline.xs().to_vec(),
            Interpolator::LogLogLinear(table) => table.xs.iter().map(|v| Float::powf(10.0, *v)).collect(),
            Interpolator::LogLogSpline(spline) => spline.xs().iter().map(|v| Float::powf(10.0, *v)).collect(),
        }
    }

    pub fn domain(&self) -> (Float, Float) {
        let (lo, hi) = match self {
            Interpolator::Linear(table) | Interpolator::LogLogLinear(table) | Interpolator::LogLogLinearFromZero(table) => {
                (table.xs[0], table.xs[table.xs.len() - 1])
            }
            Interpolator::Spline(spline) | Interpolator::LogLogSpline(spline) => {
                let xs = spline.xs();
                (xs[0], xs[xs.len() - 1])
            }
        };
        match self.kind() {
            InterpolationKind::LogLogLinear | InterpolationKind::LogLogSpline => {
                (Float::powf(10.0, lo), Float::powf(10.0, hi))
            }
            _ => (lo, hi),
        }
    }
}

fn validate_table(name: &str, xs: &[Float], ys: &[Float]) -> Result<(), DataError> {
    if xs.len() != ys.len() {
        return Err(DataError::LengthMismatch(name.to_string()));
    }
    if xs.len() < 2 {
        return Err(DataError::EmptyTable(name.to_string()));
    }
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(DataError::NonFiniteValue(name.to_string()));
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(DataError::NonMonotonicTable(name.to_string()));
    }
    Ok(())
}
