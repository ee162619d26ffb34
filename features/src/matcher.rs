use crate::descriptor::Descriptors;
use cv_core::{FeatureMatch, Matches};

/// Brute-force Hamming matcher with a nearest/second-nearest ratio test.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    ratio_threshold: f32,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            ratio_threshold: 0.9,
        }
    }
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ratio_test(mut self, threshold: f32) -> Self {
        self.ratio_threshold = threshold;
        self
    }

    pub fn ratio_threshold(&self) -> f32 {
        self.ratio_threshold
    }

    /// 2-NN match every query descriptor against `train` and keep the ones
    /// passing the ratio test.
    pub fn match_descriptors(&self, query: &Descriptors, train: &Descriptors) -> Matches {
        let knn = knn_match(query, train, 2);
        filter_matches_by_ratio_test(&knn, self.ratio_threshold).into()
    }
}

/// The `k` nearest train descriptors of each query descriptor, closest first.
///
/// Exhaustive search; equal distances keep the lower train index first.
pub fn knn_match(query: &Descriptors, train: &Descriptors, k: usize) -> Vec<Vec<FeatureMatch>> {
    let mut all_matches: Vec<Vec<FeatureMatch>> = Vec::with_capacity(query.len());

    for (query_idx, q_desc) in query.iter().enumerate() {
        let mut nearest: Vec<(usize, u32)> = Vec::with_capacity(k + 1);

        for (train_idx, t_desc) in train.iter().enumerate() {
            let distance = q_desc.hamming_distance(t_desc);
            if nearest.len() == k && nearest.last().map_or(true, |&(_, d)| distance >= d) {
                continue;
            }
            let pos = nearest.partition_point(|&(_, d)| d <= distance);
            nearest.insert(pos, (train_idx, distance));
            nearest.truncate(k);
        }

        all_matches.push(
            nearest
                .into_iter()
                .map(|(train_idx, distance)| FeatureMatch::new(query_idx, train_idx, distance as f32))
                .collect(),
        );
    }

    all_matches
}

/// Keeps the nearest neighbour when `best < ratio · second`. Query
/// descriptors with fewer than two neighbours are dropped.
pub fn filter_matches_by_ratio_test(matches: &[Vec<FeatureMatch>], ratio: f32) -> Vec<FeatureMatch> {
    matches
        .iter()
        .filter_map(|knn| match knn.as_slice() {
            [best, second, ..] if best.distance < ratio * second.distance => Some(*best),
            _ => None,
        })
        .collect()
}
