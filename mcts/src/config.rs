//! Search configuration parameters.

use serde::{Deserialize, Serialize};

/// Configuration for a PUCT Monte Carlo Tree Search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Number of concurrent search workers.
    ///
    /// `1` runs simulations back to back on the calling thread with the
    /// oracle invoked in-line. Two or more workers run concurrently against
    /// a shared tree, exchanging evaluation requests with a batching
    /// inference server; virtual loss keeps their descents spread out.
    pub num_workers: usize,

    /// Pad every inference batch to `num_workers` requests by duplicating
    /// the first one. Padded results are discarded. Useful for oracles that
    /// compile or cache kernels per batch shape.
    pub fill_batches: bool,

    /// Exploration coefficient in the PUCT score.
    /// Higher values weight the prior term over the observed mean value.
    pub c_puct: f64,

    /// Fraction of the root prior replaced by Dirichlet noise.
    /// `0.0` disables noise entirely (evaluation/inference runs).
    pub noise_epsilon: f64,

    /// Dirichlet concentration for root noise.
    pub noise_alpha: f64,

    /// Seed for the engine's noise RNG. With `noise_epsilon = 0.0` the RNG
    /// is never consulted, so single-worker searches are deterministic
    /// regardless of this value.
    pub seed: u64,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_workers: 1,
            fill_batches: false,
            c_puct: 1.0,
            noise_epsilon: 0.0,
            noise_alpha: 1.0,
            seed: 0,
        }
    }
}

impl MctsConfig {
    /// Config for self-play style searches: AlphaZero's customary root
    /// noise, everything else at its default.
    pub fn for_self_play() -> Self {
        Self {
            noise_epsilon: 0.25,
            noise_alpha: 0.3,
            ..Self::default()
        }
    }

    /// Builder pattern: set the number of workers.
    pub fn with_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Builder pattern: enable or disable batch padding.
    pub fn with_fill_batches(mut self, fill: bool) -> Self {
        self.fill_batches = fill;
        self
    }

    /// Builder pattern: set the exploration coefficient.
    pub fn with_c_puct(mut self, c: f64) -> Self {
        self.c_puct = c;
        self
    }

    /// Builder pattern: set root Dirichlet noise parameters.
    pub fn with_noise(mut self, epsilon: f64, alpha: f64) -> Self {
        self.noise_epsilon = epsilon;
        self.noise_alpha = alpha;
        self
    }

    /// Builder pattern: set the noise RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.num_workers, 1);
        assert!(!config.fill_batches);
        assert!((config.c_puct - 1.0).abs() < 1e-12);
        assert_eq!(config.noise_epsilon, 0.0);
        assert!((config.noise_alpha - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MctsConfig::default()
            .with_workers(4)
            .with_fill_batches(true)
            .with_c_puct(2.5)
            .with_noise(0.25, 0.3)
            .with_seed(7);

        assert_eq!(config.num_workers, 4);
        assert!(config.fill_batches);
        assert!((config.c_puct - 2.5).abs() < 1e-12);
        assert!((config.noise_epsilon - 0.25).abs() < 1e-12);
        assert!((config.noise_alpha - 0.3).abs() < 1e-12);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_self_play_config() {
        let config = MctsConfig::for_self_play();
        assert!((config.noise_epsilon - 0.25).abs() < 1e-12);
        assert!((config.noise_alpha - 0.3).abs() < 1e-12);
        assert_eq!(config.num_workers, 1);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: MctsConfig = serde_json::from_str(r#"{"num_workers": 8}"#).unwrap();
        assert_eq!(config.num_workers, 8);
        assert!((config.c_puct - 1.0).abs() < 1e-12);
        assert!(!config.fill_batches);
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = MctsConfig::for_self_play().with_workers(2);
        let text = serde_json::to_string(&config).unwrap();
        let back: MctsConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(config, back);
    }
}
