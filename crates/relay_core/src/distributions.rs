//! Sampling helpers drawing from the simulation's shared generator.
//!
//! Every sampler consumes a fixed number of uniform draws so the generator
//! stream, and therefore the whole run, is reproducible for a given seed.

use rand::Rng;

/// Normal distribution parameterised by mean and variance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub mean: f64,
    pub variance: f64,
}

impl Gaussian {
    pub fn new(mean: f64, variance: f64) -> Self {
        Self {
            mean,
            variance: variance.max(0.0),
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Box-Muller transform; always consumes exactly two uniform draws.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u1: f64 = rng.gen::<f64>();
        let u2: f64 = rng.gen::<f64>();
        // gen::<f64>() is in [0, 1); shift to (0, 1] so ln() stays finite.
        let u1 = 1.0 - u1;
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        self.mean + z * self.std_dev()
    }
}

/// Logistic curve `1 / (1 + e^{-rate (x - cutoff)})`.
pub fn sigmoid(x: f64, cutoff: f64, rate: f64) -> f64 {
    1.0 / (1.0 + (-rate * (x - cutoff)).exp())
}

/// Bernoulli trial; always consumes one uniform draw.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.gen::<f64>() < probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sigmoid_is_half_at_cutoff() {
        assert!((sigmoid(0.3, 0.3, 13.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(1.0, 0.3, 13.0) > 0.99);
        assert!(sigmoid(0.0, 0.3, 13.0) < 0.03);
    }

    #[test]
    fn gaussian_sample_mean_is_close() {
        let mut rng = StdRng::seed_from_u64(7);
        let dist = Gaussian::new(2.0, 0.1);
        let n = 20_000;
        let mean = (0..n).map(|_| dist.sample(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - 2.0).abs() < 0.02, "mean was {mean}");
    }

    #[test]
    fn gaussian_consumes_two_draws() {
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        Gaussian::new(0.0, 1.0).sample(&mut a);
        b.gen::<f64>();
        b.gen::<f64>();
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
    }

    #[test]
    fn zero_variance_returns_mean() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Gaussian::new(0.25, 0.0).sample(&mut rng), 0.25);
    }
}
