use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Source of initial weight values. Called once per weight element; biases start at zero.
pub trait Initializer {
    fn sample(&mut self, fan_in: usize, fan_out: usize) -> f32;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InitScheme {
    /// `U(-sqrt(6 / (in + out)), sqrt(6 / (in + out)))`
    XavierUniform,
    /// `N(0, sqrt(2 / (in + out)))`
    XavierNormal,
    /// `N(0, sqrt(2 / in))`
    HeNormal,
    /// `N(0, sqrt(1 / in))`
    LeCunNormal,
    /// `U(-sqrt(3 / in), sqrt(3 / in))`
    LeCunUniform,
    /// `U(-1, 1)`
    Uniform,
}

enum Dist {
    Normal { std: f32 },
    Uniform { limit: f32 },
}

impl InitScheme {
    fn distribution(self, fan_in: usize, fan_out: usize) -> Dist {
        let fan_in = fan_in.max(1) as f32;
        let fan_out = fan_out as f32;
        match self {
            InitScheme::XavierUniform => symmetric_uniform((6.0 / (fan_in + fan_out)).sqrt()),
            InitScheme::XavierNormal => normal((2.0 / (fan_in + fan_out)).sqrt()),
            InitScheme::HeNormal => normal((2.0 / fan_in).sqrt()),
            InitScheme::LeCunNormal => normal((1.0 / fan_in).sqrt()),
            InitScheme::LeCunUniform => symmetric_uniform((3.0 / fan_in).sqrt()),
            InitScheme::Uniform => symmetric_uniform(1.0),
        }
    }
}

#[inline]
fn symmetric_uniform(limit: f32) -> Dist {
    Dist::Uniform { limit }
}

#[inline]
fn normal(std: f32) -> Dist {
    Dist::Normal { std }
}

/// Draws weights from an [`InitScheme`] using an explicitly owned generator.
pub struct RandomInitializer<R: Rng = StdRng> {
    scheme: InitScheme,
    rng: R,
}

impl RandomInitializer<StdRng> {
    pub fn seed_from_u64(scheme: InitScheme, seed: u64) -> Self {
        RandomInitializer {
            scheme,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy(scheme: InitScheme) -> Self {
        RandomInitializer {
            scheme,
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R: Rng> RandomInitializer<R> {
    pub fn new(scheme: InitScheme, rng: R) -> Self {
        RandomInitializer { scheme, rng }
    }

    #[inline]
    pub fn scheme(&self) -> InitScheme {
        self.scheme
    }
}

impl<R: Rng> Initializer for RandomInitializer<R> {
    fn sample(&mut self, fan_in: usize, fan_out: usize) -> f32 {
        match self.scheme.distribution(fan_in, fan_out) {
            Dist::Normal { std } => {
                let z: f32 = self.rng.sample(StandardNormal);
                z * std
            }
            Dist::Uniform { limit } => self.rng.gen_range(-limit..limit),
        }
    }
}

/// Every weight gets the same value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConstantInitializer(pub f32);

impl Initializer for ConstantInitializer {
    #[inline]
    fn sample(&mut self, _fan_in: usize, _fan_out: usize) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::{ConstantInitializer, InitScheme, Initializer, RandomInitializer};

    const SCHEMES: [InitScheme; 6] = [
        InitScheme::XavierUniform,
        InitScheme::XavierNormal,
        InitScheme::HeNormal,
        InitScheme::LeCunNormal,
        InitScheme::LeCunUniform,
        InitScheme::Uniform,
    ];

    #[test]
    fn test_seeded_is_reproducible() {
        for scheme in SCHEMES {
            let mut a = RandomInitializer::seed_from_u64(scheme, 0xf1234567);
            let mut b = RandomInitializer::seed_from_u64(scheme, 0xf1234567);
            let xs: Vec<f32> = (0..16).map(|_| a.sample(4, 3)).collect();
            let ys: Vec<f32> = (0..16).map(|_| b.sample(4, 3)).collect();
            assert_eq!(xs, ys);
            assert!(xs.iter().all(|x| x.is_finite()));
        }
    }

    #[test]
    fn test_uniform_limits() {
        let mut init = RandomInitializer::seed_from_u64(InitScheme::XavierUniform, 7);
        let limit = (6.0f32 / (2.0 + 4.0)).sqrt();
        for _ in 0..1000 {
            let x = init.sample(2, 4);
            assert!(x >= -limit && x < limit);
        }
        let mut init = RandomInitializer::seed_from_u64(InitScheme::LeCunUniform, 7);
        let limit = (3.0f32 / 12.0).sqrt();
        for _ in 0..1000 {
            let x = init.sample(12, 1);
            assert!(x >= -limit && x < limit);
        }
    }

    #[test]
    fn test_normal_spread() {
        let mut init = RandomInitializer::seed_from_u64(InitScheme::HeNormal, 3);
        let n = 20_000;
        let samples: Vec<f32> = (0..n).map(|_| init.sample(8, 8)).collect();
        let mean = samples.iter().sum::<f32>() / n as f32;
        let var = samples.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / n as f32;
        assert!(mean.abs() < 0.02);
        assert!((var - 2.0 / 8.0).abs() < 0.02);
    }

    #[test]
    fn test_constant() {
        assert_eq!(ConstantInitializer(0.25).sample(10, 3), 0.25);
    }
}
