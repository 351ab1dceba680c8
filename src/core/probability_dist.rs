// Copyright @yucwang 2026

use rand::Rng;

use crate::core::error::DataError;
use crate::math::constants::Float;

const SIMPSON_POINTS: usize = 51;
const RITA_INITIAL_POINTS: usize = 32;
const RITA_MAX_POINTS: usize = 512;

// Greatest `i` with `values[i] <= target`, clamped so that `[i, i + 1]` is a
// valid interval of `values`.
pub fn find_index_of_next_smallest_value(values: &[Float], target: Float) -> usize {
    let upper = values.partition_point(|v| *v <= target);
    upper.saturating_sub(1).min(values.len().saturating_sub(2))
}

pub struct Uniform;

impl Uniform {
    #[inline]
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Float {
        rng.gen::<Float>()
    }

    // U in `(0, 1]`, safe under `ln`.
    #[inline]
    pub fn sample_open<R: Rng + ?Sized>(rng: &mut R) -> Float {
        1.0 - rng.gen::<Float>()
    }
}

// Categorical sampling over an ordered outcome list. Outcome `i` owns the
// half-open interval `[c_{i-1}, c_i)` of the cumulative weights.
#[derive(Debug, Clone)]
pub struct DiscreteInversion<T> {
    outcomes: Vec<T>,
    cumulative: Vec<Float>,
}

impl<T: Copy> DiscreteInversion<T> {
    pub fn new(weighted: &[(T, Float)]) -> Result<Self, DataError> {
        let mut cumulative = Vec::with_capacity(weighted.len());
        let mut running = 0.0;
        for (_, w) in weighted {
            if !w.is_finite() || *w < 0.0 {
                return Err(DataError::NonFiniteValue("discrete weights".to_string()));
            }
            running += *w;
            cumulative.push(running);
        }
        if running <= 0.0 {
            return Err(DataError::EmptyTable("discrete weights".to_string()));
        }
        Ok(Self {
            outcomes: weighted.iter().map(|(o, _)| *o).collect(),
            cumulative,
        })
    }

    pub fn total_weight(&self) -> Float {
        self.cumulative[self.cumulative.len() - 1]
    }

    pub fn probability(&self, index: usize) -> Float {
        let low = if index == 0 { 0.0 } else { self.cumulative[index - 1] };
        (self.cumulative[index] - low) / self.total_weight()
    }

    pub fn outcomes(&self) -> &[T] {
        &self.outcomes
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        let idx = select_cumulative(&self.cumulative, Uniform::sample(rng));
        self.outcomes[idx]
    }
}

// Index whose half-open cumulative interval contains `u * total`.
// Zero-weight entries own an empty interval and are never returned.
pub fn select_cumulative(cumulative: &[Float], u: Float) -> usize {
    let total = cumulative[cumulative.len() - 1];
    let target = u * total;
    let idx = cumulative.partition_point(|c| *c <= target);
    if idx < cumulative.len() {
        return idx;
    }
    // u * total rounded onto the last edge: fall back to the last non-empty entry.
    let mut last = cumulative.len() - 1;
    while last > 0 && cumulative[last] == cumulative[last - 1] {
        last -= 1;
    }
    last
}

#[derive(Debug, Clone)]
pub struct IntervalData {
    xs: Vec<Float>,
    cdf: Vec<Float>,
    a: Vec<Float>,
    b: Vec<Float>,
}

impl IntervalData {
    pub fn from_cdf(xs: Vec<Float>, cdf: Vec<Float>) -> Result<Self, DataError> {
        if xs.len() != cdf.len() {
            return Err(DataError::LengthMismatch("cdf".to_string()));
        }
        if xs.len() < 2 {
            return Err(DataError::EmptyTable("cdf".to_string()));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) || cdf.windows(2).any(|w| w[1] < w[0]) {
            return Err(DataError::NonMonotonicTable("cdf".to_string()));
        }
        let total = cdf[cdf.len() - 1] - cdf[0];
        if !(total > 0.0) {
            return Err(DataError::EmptyTable("cdf".to_string()));
        }
        let base = cdf[0];
        let cdf = cdf.iter().map(|c| (c - base) / total).collect::<Vec<_>>();
        let intervals = xs.len() - 1;
        Ok(Self { xs, cdf, a: vec![0.0; intervals], b: vec![0.0; intervals] })
    }

    // Adaptive RITA table for an unnormalized pdf on `[x_min, x_max]`.
    // Intervals whose interpolated pdf deviates from `pdf` by more than
    // `max_error` (integrated, relative to the total) are bisected.
    pub fn from_pdf<F: Fn(Float) -> Float>(pdf: F, x_min: Float, x_max: Float, max_error: Float) -> Result<Self, DataError> {
        if !(x_max > x_min) {
            return Err(DataError::NonMonotonicTable("pdf range".to_string()));
        }
        let step = (x_max - x_min) / (RITA_INITIAL_POINTS - 1) as Float;
        let mut xs: Vec<Float> = (0..RITA_INITIAL_POINTS).map(|i| x_min + step * i as Float).collect();
        if let Some(last) = xs.last_mut() {
            *last = x_max;
        }

        loop {
            let mut table = Self::rita_table(&pdf, &xs)?;
            let total = table.cdf[table.cdf.len() - 1];
            let errors: Vec<Float> = (0..xs.len() - 1)
                .map(|i| table.interval_error(&pdf, i) / total)
                .collect();
            let mut refined = Vec::with_capacity(xs.len() * 2);
            for i in 0..xs.len() - 1 {
                refined.push(xs[i]);
                if errors[i] > max_error && refined.len() + (xs.len() - i) < RITA_MAX_POINTS {
                    refined.push(0.5 * (xs[i] + xs[i + 1]));
                }
            }
            refined.push(xs[xs.len() - 1]);

            if refined.len() == xs.len() {
                for c in table.cdf.iter_mut() {
                    *c /= total;
                }
                return Ok(table);
            }
            xs = refined;
        }
    }

    fn rita_table<F: Fn(Float) -> Float>(pdf: &F, xs: &[Float]) -> Result<Self, DataError> {
        let n = xs.len();
        let mut cdf = vec![0.0; n];
        for i in 0..n - 1 {
            let area = simpson(pdf, xs[i], xs[i + 1]);
            if !area.is_finite() || area < 0.0 {
                return Err(DataError::NonFiniteValue("pdf".to_string()));
            }
            cdf[i + 1] = cdf[i] + area;
        }
        if !(cdf[n - 1] > 0.0) {
            return Err(DataError::EmptyTable("pdf".to_string()));
        }

        let mut a = vec![0.0; n - 1];
        let mut b = vec![0.0; n - 1];
        for i in 0..n - 1 {
            let slope = (cdf[i + 1] - cdf[i]) / (xs[i + 1] - xs[i]);
            let p0 = pdf(xs[i]);
            let p1 = pdf(xs[i + 1]);
            if !(p0 > 0.0 && p1 > 0.0 && slope > 0.0) {
                continue;
            }
            let bi = 1.0 - slope * slope / (p0 * p1);
            let ai = slope / p0 - bi - 1.0;
            // The rational form must stay monotone over the whole interval.
            let monotone = (0..=8).all(|k| {
                let eta = k as Float / 8.0;
                1.0 + ai * eta + bi * eta * eta > 0.0
            });
            if ai.is_finite() && bi.is_finite() && bi < 1.0 && monotone {
                a[i] = ai;
                b[i] = bi;
            }
        }
        Ok(Self { xs: xs.to_vec(), cdf, a, b })
    }

    fn interval_error<F: Fn(Float) -> Float>(&self, pdf: &F, i: usize) -> Float {
        let x0 = self.xs[i];
        let x1 = self.xs[i + 1];
        let slope = (self.cdf[i + 1] - self.cdf[i]) / (x1 - x0);
        let (a, b) = (self.a[i], self.b[i]);
        let approx = |x: Float| {
            let tau = (x - x0) / (x1 - x0);
            let eta = rita_eta(tau, a, b);
            let num = 1.0 + a * eta + b * eta * eta;
            num * num / ((1.0 + a + b) * (1.0 - b * eta * eta)) * slope
        };
        simpson(&|x| (pdf(x) - approx(x)).abs(), x0, x1)
    }

    pub fn x_min(&self) -> Float {
        self.xs[0]
    }

    pub fn x_max(&self) -> Float {
        self.xs[self.xs.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn invert(&self, u: Float) -> Float {
        let i = find_index_of_next_smallest_value(&self.cdf, u);
        let delta = self.cdf[i + 1] - self.cdf[i];
        if delta <= 0.0 {
            return self.xs[i];
        }
        let nu = (u - self.cdf[i]).clamp(0.0, delta);
        let (a, b) = (self.a[i], self.b[i]);
        let frac = (1.0 + a + b) * delta * nu / (delta * delta + a * delta * nu + b * nu * nu);
        let x = self.xs[i] + frac * (self.xs[i + 1] - self.xs[i]);
        x.clamp(self.xs[i], self.xs[i + 1])
    }
}

// Position `eta = nu / delta` inside the CDF interval that maps to the
// fractional abscissa `tau` under the rational interpolation.
fn rita_eta(tau: Float, a: Float, b: Float) -> Float {
    if tau <= 0.0 {
        return 0.0;
    }
    let c = 1.0 + a + b - a * tau;
    if b.abs() < 1e-12 {
        return tau / c;
    }
    let disc = (1.0 - 4.0 * b * tau * tau / (c * c)).max(0.0);
    c / (2.0 * b * tau) * (1.0 - disc.sqrt())
}

fn simpson<F: Fn(Float) -> Float>(f: &F, x0: Float, x1: Float) -> Float {
    let n = SIMPSON_POINTS - 1;
    let h = (x1 - x0) / n as Float;
    let mut sum = f(x0) + f(x1);
    for k in 1..n {
        let w = if k % 2 == 1 { 4.0 } else { 2.0 };
        sum += w * f(x0 + h * k as Float);
    }
    sum * h / 3.0
}

// Family of inverse CDFs indexed by a parameter (for example the photon
// energy). Between tabulated parameters the sampled values of the two
// neighbouring tables are blended with the same uniform variate.
#[derive(Debug, Clone)]
pub struct ContinuousInversion {
    params: Vec<Float>,
    tables: Vec<IntervalData>,
}

impl ContinuousInversion {
    pub fn new(params: Vec<Float>, tables: Vec<IntervalData>) -> Result<Self, DataError> {
        if params.is_empty() || params.len() != tables.len() {
            return Err(DataError::LengthMismatch("continuous inversion".to_string()));
        }
        if params.windows(2).any(|w| w[1] <= w[0]) {
            return Err(DataError::NonMonotonicTable("continuous inversion".to_string()));
        }
        Ok(Self { params, tables })
    }

    pub fn from_pdf<F: Fn(Float, Float) -> Float>(
        pdf: F,
        params: &[Float],
        x_min: Float,
        x_max: Float,
        max_error: Float,
    ) -> Result<Self, DataError> {
        let tables = params
            .iter()
            .map(|p| IntervalData::from_pdf(|x| pdf(x, *p), x_min, x_max, max_error))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(params.to_vec(), tables)
    }

    pub fn params(&self) -> &[Float] {
        &self.params
    }

    pub fn invert(&self, param: Float, u: Float) -> Float {
        let n = self.params.len();
        if n == 1 || param <= self.params[0] {
            return self.tables[0].invert(u);
        }
        if param >= self.params[n - 1] {
            return self.tables[n - 1].invert(u);
        }
        let j = find_index_of_next_smallest_value(&self.params, param);
        let w = (param - self.params[j]) / (self.params[j + 1] - self.params[j]);
        (1.0 - w) * self.tables[j].invert(u) + w * self.tables[j + 1].invert(u)
    }

    pub fn sample<R: Rng + ?Sized>(&self, param: Float, rng: &mut R) -> Float {
        self.invert(param, Uniform::sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::PcgRng;

    #[test]
    fn next_smallest_value_search() {
        let v = [0.0, 0.25, 0.5, 1.0];
        assert_eq!(find_index_of_next_smallest_value(&v, 0.0), 0);
        assert_eq!(find_index_of_next_smallest_value(&v, 0.3), 1);
        assert_eq!(find_index_of_next_smallest_value(&v, 0.5), 2);
        assert_eq!(find_index_of_next_smallest_value(&v, 1.0), 2);
        assert_eq!(find_index_of_next_smallest_value(&v, -4.0), 0);
    }

    #[test]
    fn discrete_intervals_are_half_open() {
        let cumulative = [1.0, 1.0, 3.0];
        assert_eq!(select_cumulative(&cumulative, 0.0), 0);
        assert_eq!(select_cumulative(&cumulative, 1.0 / 3.0), 2);
        assert_eq!(select_cumulative(&cumulative, 0.999), 2);
        assert_eq!(select_cumulative(&[2.0, 2.0], 1.0), 0);
    }

    #[test]
    fn discrete_inversion_frequencies() {
        let dist = DiscreteInversion::new(&[('a', 1.0), ('b', 0.0), ('c', 3.0)]).unwrap();
        assert!((dist.probability(2) - 0.75).abs() < 1e-12);
        let mut rng = PcgRng::new(11);
        let n = 100_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            match dist.sample(&mut rng) {
                'a' => counts[0] += 1,
                'b' => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }
        assert_eq!(counts[1], 0);
        let frac = counts[0] as Float / n as Float;
        assert!((frac - 0.25).abs() < 0.01);
        assert!(DiscreteInversion::new(&[('a', 0.0)]).is_err());
        assert!(DiscreteInversion::new(&[('a', -1.0)]).is_err());
    }

    #[test]
    fn linear_cdf_inversion() {
        let table = IntervalData::from_cdf(vec![0.0, 1.0, 2.0], vec![0.0, 0.5, 2.0]).unwrap();
        assert!((table.invert(0.0) - 0.0).abs() < 1e-12);
        assert!((table.invert(0.125) - 0.5).abs() < 1e-12);
        assert!((table.invert(0.25) - 1.0).abs() < 1e-12);
        assert!((table.invert(1.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rita_matches_analytic_inverse() {
        // pdf ~ x^2 on [0, 1]: inverse cdf is u^(1/3).
        let table = IntervalData::from_pdf(|x| x * x + 1e-12, 0.0, 1.0, 1e-6).unwrap();
        for k in 1..20 {
            let u = k as Float / 20.0;
            assert!((table.invert(u) - u.powf(1.0 / 3.0)).abs() < 2e-3);
        }
        assert!(table.len() >= RITA_INITIAL_POINTS);
    }

    #[test]
    fn continuous_inversion_blends_parameters() {
        let uniform = IntervalData::from_cdf(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        let shifted = IntervalData::from_cdf(vec![1.0, 2.0], vec![0.0, 1.0]).unwrap();
        let inv = ContinuousInversion::new(vec![10.0, 20.0], vec![uniform, shifted]).unwrap();
        assert!((inv.invert(15.0, 0.5) - 1.0).abs() < 1e-12);
        assert!((inv.invert(5.0, 0.5) - 0.5).abs() < 1e-12);
        assert!((inv.invert(25.0, 0.5) - 1.5).abs() < 1e-12);

        let mut rng = PcgRng::new(5);
        let fam = ContinuousInversion::from_pdf(|x, p| 1.0 + p * x, &[0.0, 1.0], -1.0, 1.0, 1e-5).unwrap();
        let mean = (0..100_000).map(|_| fam.sample(1.0, &mut rng)).sum::<Float>() / 100_000.0;
        // E[x] for pdf (1 + x) / 2 on [-1, 1] is 1/3.
        assert!((mean - 1.0 / 3.0).abs() < 0.01);
    }
}
