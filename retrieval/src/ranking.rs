use cv_core::Picture;
use std::sync::Arc;

/// One ranked answer to a query.
///
/// Histogram scores grow with colour similarity, geometric scores are inlier
/// counts. Scores from different methods are not comparable.
#[derive(Debug, Clone)]
pub struct RankedMatch {
    pub picture: Arc<Picture>,
    pub score: f64,
}

impl RankedMatch {
    pub fn new(picture: Arc<Picture>, score: f64) -> Self {
        Self { picture, score }
    }
}

/// Sorts by descending score and keeps the first `k`. The sort is stable, so
/// equal scores stay in insertion order.
pub(crate) fn rank_top_k(mut scored: Vec<RankedMatch>, k: usize) -> Vec<RankedMatch> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}
