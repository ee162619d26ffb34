//! Robust Estimation Module
//!
//! Generic RANSAC engine. Sampling draws from a seeded [`StdRng`], so the same
//! data and config always produce the same model and inlier set.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Configuration for robust estimation
#[derive(Debug, Clone)]
pub struct RobustConfig {
    /// Largest residual, inclusive, for a datum to count as an inlier.
    pub threshold: f64,
    pub max_iterations: usize,
    /// Target probability of having drawn at least one outlier-free sample.
    pub confidence: f64,
    pub seed: u64,
}

impl Default for RobustConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            max_iterations: 2000,
            confidence: 0.995,
            seed: 0x5eed_cafe,
        }
    }
}

/// Result of robust estimation
#[derive(Debug, Clone)]
pub struct RobustResult<M> {
    pub model: Option<M>,
    pub inliers: Vec<bool>,
    pub num_inliers: usize,
    pub residual: f64,
}

impl<M> RobustResult<M> {
    fn empty(n: usize) -> Self {
        Self {
            model: None,
            inliers: vec![false; n],
            num_inliers: 0,
            residual: f64::INFINITY,
        }
    }
}

/// Trait for models that can be estimated robustly
pub trait RobustModel<D> {
    type Model: Clone;

    /// Minimum number of data points required to estimate the model
    fn min_sample_size(&self) -> usize;

    /// Estimate model from a sample of at least `min_sample_size` points
    fn estimate(&self, data: &[&D]) -> Option<Self::Model>;

    /// Compute error for a single data point against the model
    fn compute_error(&self, model: &Self::Model, data: &D) -> f64;

    /// Rejects minimal samples that cannot determine a unique model.
    fn is_degenerate(&self, _sample: &[&D]) -> bool {
        false
    }
}

/// Generic RANSAC engine
pub struct Ransac {
    config: RobustConfig,
}

impl Ransac {
    pub fn new(config: RobustConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RobustConfig {
        &self.config
    }

    pub fn run<D, E: RobustModel<D>>(&self, estimator: &E, data: &[D]) -> RobustResult<E::Model> {
        let n = data.len();
        let k = estimator.min_sample_size();

        if n < k || k == 0 {
            return RobustResult::empty(n);
        }

        let mut best = RobustResult::empty(n);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut indices: Vec<usize> = (0..n).collect();
        let mut limit = self.config.max_iterations;
        let mut iteration = 0;

        while iteration < limit {
            iteration += 1;

            let (chosen, _) = indices.partial_shuffle(&mut rng, k);
            let sample: Vec<&D> = chosen.iter().map(|&i| &data[i]).collect();

            if estimator.is_degenerate(&sample) {
                continue;
            }

            let Some(model) = estimator.estimate(&sample) else {
                continue;
            };

            let scored = self.score(estimator, model, data);
            if scored.num_inliers > best.num_inliers
                || (scored.num_inliers == best.num_inliers
                    && scored.num_inliers > 0
                    && scored.residual < best.residual)
            {
                best = scored;
                limit = limit.min(self.required_iterations(best.num_inliers, n, k));
            }
        }

        self.refine(estimator, data, best)
    }

    /// Re-fits the winning model on all of its inliers and keeps the refit
    /// when it explains at least as many points.
    fn refine<D, E: RobustModel<D>>(
        &self,
        estimator: &E,
        data: &[D],
        best: RobustResult<E::Model>,
    ) -> RobustResult<E::Model> {
        if best.model.is_none() || best.num_inliers <= estimator.min_sample_size() {
            return best;
        }

        let support: Vec<&D> = data
            .iter()
            .zip(&best.inliers)
            .filter_map(|(d, &inlier)| inlier.then_some(d))
            .collect();

        match estimator.estimate(&support) {
            Some(model) => {
                let refit = self.score(estimator, model, data);
                if refit.num_inliers >= best.num_inliers {
                    refit
                } else {
                    best
                }
            }
            None => best,
        }
    }

    fn score<D, E: RobustModel<D>>(
        &self,
        estimator: &E,
        model: E::Model,
        data: &[D],
    ) -> RobustResult<E::Model> {
        let mut inliers = vec![false; data.len()];
        let mut num_inliers = 0;
        let mut total_error = 0.0;

        for (j, d) in data.iter().enumerate() {
            let err = estimator.compute_error(&model, d);
            if err <= self.config.threshold {
                inliers[j] = true;
                num_inliers += 1;
                total_error += err;
            }
        }

        let residual = if num_inliers > 0 {
            total_error / num_inliers as f64
        } else {
            f64::INFINITY
        };

        RobustResult {
            model: Some(model),
            inliers,
            num_inliers,
            residual,
        }
    }

    /// Iterations needed to reach `confidence` given the current inlier ratio.
    fn required_iterations(&self, num_inliers: usize, n: usize, k: usize) -> usize {
        let w = num_inliers as f64 / n as f64;
        let p_outlier_sample = 1.0 - w.powi(k as i32);
        if p_outlier_sample <= f64::EPSILON {
            return 0;
        }
        if p_outlier_sample >= 1.0 {
            return self.config.max_iterations;
        }

        let needed = (1.0 - self.config.confidence).ln() / p_outlier_sample.ln();
        if needed.is_finite() && needed >= 0.0 {
            (needed.ceil() as usize).min(self.config.max_iterations)
        } else {
            self.config.max_iterations
        }
    }
}
