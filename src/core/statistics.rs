// Copyright @yucwang 2026

use std::fmt;

use crate::math::constants::Float;

// One-pass streaming mean/variance (Welford). One sample is one photon
// history's pre-aggregated contribution.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Welford {
    count: u64,
    mean: Float,
    m2: Float,
}

impl Welford {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, x: Float) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as Float;
        self.m2 += delta * (x - self.mean);
    }

    pub fn merge(&mut self, other: &Welford) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let n1 = self.count as Float;
        let n2 = other.count as Float;
        let n = n1 + n2;
        let delta = other.mean - self.mean;
        self.mean += delta * n2 / n;
        self.m2 += other.m2 + delta * delta * n1 * n2 / n;
        self.count += other.count;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> Float {
        self.mean
    }

    pub fn m2(&self) -> Float {
        self.m2
    }

    pub fn sum(&self) -> Float {
        self.mean * self.count as Float
    }

    pub fn population_variance(&self) -> Float {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as Float
        }
    }

    pub fn sample_variance(&self) -> Float {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as Float
        }
    }

    // Pads the accumulator to `total` samples with zero-valued samples, for
    // histories that never touched this cell.
    pub fn with_zeros(&self, total: u64) -> Welford {
        let mut out = *self;
        if total > self.count {
            out.merge(&Welford { count: total - self.count, mean: 0.0, m2: 0.0 });
        }
        out
    }

    pub fn finalize(&self, histories: u64) -> Estimate {
        let padded = self.with_zeros(histories);
        let n = padded.count;
        let variance = padded.sample_variance();
        let std_error = if n > 0 { (variance / n as Float).sqrt() } else { 0.0 };
        let relative_error = if padded.mean != 0.0 { std_error / padded.mean.abs() } else { 0.0 };
        Estimate {
            mean: padded.mean,
            variance,
            std_error,
            relative_error,
            samples: self.count,
            histories: n,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Estimate {
    pub mean: Float,
    pub variance: Float,
    pub std_error: Float,
    pub relative_error: Float,
    pub samples: u64,
    pub histories: u64,
}

impl Estimate {
    pub fn total(&self) -> Float {
        self.mean * self.histories as Float
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6e} +/- {:.3e} per history (rel {:.2}%, {} / {} histories)",
            self.mean,
            self.std_error,
            self.relative_error * 100.0,
            self.samples,
            self.histories
        )
    }
}
