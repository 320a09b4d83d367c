//! Samplers for secrets, errors and uniform ring elements.
//!
//! All samplers draw from a caller-supplied `Rng`, so key generation can run
//! from an entropy-seeded ChaCha20 stream in production and a fixed seed in
//! tests.

use rand::Rng;

/// Default error standard deviation.
pub const DEFAULT_SIGMA: f64 = 3.2;

/// Samples beyond `TAILCUT_SIGMAS * sigma` are rejected.
const TAILCUT_SIGMAS: f64 = 6.0;

/// Discrete Gaussian sampler over Z using rejection sampling.
#[derive(Debug, Clone)]
pub struct GaussianSampler {
    sigma: f64,
    bound: i64,
}

impl GaussianSampler {
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            bound: (sigma * TAILCUT_SIGMAS).ceil().max(1.0) as i64,
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Largest magnitude this sampler can return.
    pub fn bound(&self) -> i64 {
        self.bound
    }

    /// Draws one value from D_σ restricted to [-bound, bound].
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let two_sigma_sq = 2.0 * self.sigma * self.sigma;
        loop {
            let x = rng.gen_range(-self.bound..=self.bound);
            let accept = (-((x * x) as f64) / two_sigma_sq).exp();
            if rng.gen::<f64>() < accept {
                return x;
            }
        }
    }

    pub fn sample_vec<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Vec<i64> {
        (0..len).map(|_| self.sample(rng)).collect()
    }
}

/// Uniform ternary sampler over {-1, 0, 1}.
#[derive(Debug, Clone, Copy, Default)]
pub struct TernarySampler;

impl TernarySampler {
    pub fn sample_vec<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Vec<i64> {
        (0..len).map(|_| rng.gen_range(-1i64..=1)).collect()
    }
}

/// `len` values drawn uniformly from [0, q).
pub fn uniform_vec<R: Rng + ?Sized>(len: usize, q: u64, rng: &mut R) -> Vec<u64> {
    (0..len).map(|_| rng.gen_range(0..q)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_gaussian_distribution() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let sampler = GaussianSampler::new(DEFAULT_SIGMA);

        let samples = sampler.sample_vec(10_000, &mut rng);
        let mean = samples.iter().map(|&x| x as f64).sum::<f64>() / samples.len() as f64;
        assert!(mean.abs() < 0.5, "mean {mean} should be close to 0");

        let variance = samples
            .iter()
            .map(|&x| (x as f64 - mean).powi(2))
            .sum::<f64>()
            / samples.len() as f64;
        assert!(
            (variance.sqrt() - DEFAULT_SIGMA).abs() < 0.5,
            "std dev {} should be close to {DEFAULT_SIGMA}",
            variance.sqrt()
        );
        assert!(samples.iter().all(|x| x.abs() <= sampler.bound()));
    }

    #[test]
    fn test_ternary_support() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let s = TernarySampler.sample_vec(1000, &mut rng);
        assert!(s.iter().all(|x| (-1..=1).contains(x)));
        assert!(s.contains(&-1) && s.contains(&0) && s.contains(&1));
    }

    #[test]
    fn test_uniform_below_modulus() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        assert!(uniform_vec(512, 17, &mut rng).iter().all(|&x| x < 17));
    }
}
