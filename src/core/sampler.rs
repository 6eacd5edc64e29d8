use rand::{rng, rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::TAU;

/// Seedable source of uniform and Gaussian variates.
///
/// Gaussian draws use the Box–Muller transform; each transform yields two
/// independent standard normals and the second one is kept for the next call.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    rng: StdRng,
    spare: Option<f64>,
}

impl RandomSampler {
    /// Create a sampler. `None` seeds from the thread RNG (nondeterministic).
    pub fn new(seed: Option<u64>) -> Self {
        let rng: StdRng = match seed {
            Some(s) => SeedableRng::seed_from_u64(s),
            None => SeedableRng::seed_from_u64(rng().random()),
        };
        Self { rng, spare: None }
    }

    /// Uniform draw in `[lo, hi]`. Returns `lo` when the interval is empty.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }

    /// Standard normal draw.
    pub fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        // u1 in (0, 1] keeps ln finite
        let u1: f64 = 1.0 - self.rng.random::<f64>();
        let u2: f64 = self.rng.random::<f64>();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = TAU * u2;
        self.spare = Some(r * theta.sin());
        r * theta.cos()
    }

    /// Normal draw with the given mean and standard deviation.
    #[inline]
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * self.standard_normal()
    }

    /// Isotropic 2D thermal velocity for a gas at `kelvin`.
    ///
    /// Each axis is drawn from `N(0, sqrt(kelvin * scale))`. At or below absolute
    /// zero the velocity is exactly zero and no randomness is consumed.
    pub fn thermal_velocity(&mut self, kelvin: f64, scale: f64) -> [f64; 2] {
        if kelvin <= 0.0 {
            return [0.0, 0.0];
        }
        let sigma = (kelvin * scale).sqrt();
        [self.gaussian(0.0, sigma), self.gaussian(0.0, sigma)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = RandomSampler::new(Some(42));
        let mut b = RandomSampler::new(Some(42));
        for _ in 0..16 {
            assert_eq!(a.uniform(0.0, 10.0), b.uniform(0.0, 10.0));
            assert_eq!(a.standard_normal(), b.standard_normal());
        }
    }

    #[test]
    fn uniform_stays_in_range() {
        let mut s = RandomSampler::new(Some(1));
        for _ in 0..1000 {
            let x = s.uniform(2.0, 798.0);
            assert!((2.0..=798.0).contains(&x));
        }
        assert_eq!(s.uniform(5.0, 5.0), 5.0);
        assert_eq!(s.uniform(5.0, 1.0), 5.0);
    }

    #[test]
    fn gaussian_moments_are_close() {
        let mut s = RandomSampler::new(Some(2024));
        let n = 40_000;
        let sigma = 3.0;
        let draws: Vec<f64> = (0..n).map(|_| s.gaussian(1.0, sigma)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        assert!((mean - 1.0).abs() < 0.1, "mean={mean}");
        assert!((var.sqrt() - sigma).abs() < 0.1, "std={}", var.sqrt());
    }

    #[test]
    fn thermal_velocity_is_zero_at_absolute_zero() {
        let mut s = RandomSampler::new(Some(3));
        assert_eq!(s.thermal_velocity(0.0, 0.1), [0.0, 0.0]);
        assert_eq!(s.thermal_velocity(-5.0, 0.1), [0.0, 0.0]);
        let v = s.thermal_velocity(273.15, 0.1);
        assert!(v.iter().all(|c| c.is_finite()));
        assert!(v != [0.0, 0.0]);
    }
}
