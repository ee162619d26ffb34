use crate::config::GeometricConfig;
use crate::error::{Result, RetrievalError};
use crate::keypoints::{Features, KeypointExtractor};
use crate::ranking::{rank_top_k, RankedMatch};
use cv_core::Picture;
use cv_features::{estimate_homography, Matcher, RansacConfig};
use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;
use std::sync::Arc;

struct GeometricEntry {
    picture: Arc<Picture>,
    features: Features,
}

/// Keypoint retrieval: brute-force descriptor matching with a ratio test,
/// then RANSAC homography verification scored by inlier count.
pub struct GeometricMatchIndex {
    config: GeometricConfig,
    extractor: KeypointExtractor,
    matcher: Matcher,
    ransac: RansacConfig,
    entries: RwLock<Arc<Vec<GeometricEntry>>>,
    train_lock: Mutex<()>,
}

impl GeometricMatchIndex {
    pub fn new(config: GeometricConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    pub(crate) fn build(config: GeometricConfig) -> Self {
        Self {
            extractor: KeypointExtractor::new(&config),
            matcher: Matcher::new().with_ratio_test(config.ratio_threshold),
            ransac: RansacConfig {
                threshold: config.reprojection_threshold,
                max_iterations: config.ransac_max_iterations,
                confidence: config.ransac_confidence,
                seed: config.ransac_seed,
            },
            config,
            entries: RwLock::new(Arc::new(Vec::new())),
            train_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &GeometricConfig {
        &self.config
    }

    pub fn extractor(&self) -> &KeypointExtractor {
        &self.extractor
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn train(&self, images: &[Arc<Picture>]) -> Result<()> {
        if images.is_empty() {
            return Err(RetrievalError::EmptyTrainingSet);
        }

        let features: Vec<(Arc<Picture>, Features)> = images
            .par_iter()
            .map(|picture| (Arc::clone(picture), self.extractor.extract(picture.image())))
            .collect();

        self.train_features(features)
    }

    /// Replaces the corpus with precomputed features.
    pub fn train_features(&self, corpus: Vec<(Arc<Picture>, Features)>) -> Result<()> {
        if corpus.is_empty() {
            return Err(RetrievalError::EmptyTrainingSet);
        }
        let _training = self.train_lock.lock();

        let entries: Vec<GeometricEntry> = corpus
            .into_iter()
            .map(|(picture, features)| GeometricEntry { picture, features })
            .collect();

        tracing::debug!(
            entries = entries.len(),
            without_keypoints = entries.iter().filter(|e| e.features.is_empty()).count(),
            "trained geometric index"
        );
        *self.entries.write() = Arc::new(entries);
        Ok(())
    }

    pub fn query(&self, picture: &Picture) -> Vec<RankedMatch> {
        if self.is_empty() {
            return Vec::new();
        }
        let features = self.extractor.extract(picture.image());
        tracing::trace!(picture = %picture.id(), keypoints = features.len(), "geometric query");
        self.query_features(&features)
    }

    pub fn query_features(&self, query: &Features) -> Vec<RankedMatch> {
        let entries = Arc::clone(&self.entries.read());
        if entries.is_empty() || query.is_empty() {
            return Vec::new();
        }

        let query_points = query.points();
        let scored: Vec<RankedMatch> = entries
            .par_iter()
            .filter_map(|entry| {
                self.score_entry(query, &query_points, &entry.features)
                    .map(|inliers| RankedMatch::new(Arc::clone(&entry.picture), inliers as f64))
            })
            .collect();

        rank_top_k(scored, self.config.k)
    }

    /// Inlier count for one corpus entry, or `None` when the entry has too
    /// few ratio-test survivors or no homography can be fitted.
    fn score_entry(&self, query: &Features, query_points: &[(f64, f64)], stored: &Features) -> Option<usize> {
        let matches = self
            .matcher
            .match_descriptors(query.descriptors(), stored.descriptors());
        if matches.len() <= self.config.min_match_count {
            return None;
        }

        match self.inlier_count(&matches, query_points, stored) {
            Ok(inliers) => Some(inliers),
            Err(e) => {
                tracing::debug!(matches = matches.len(), error = %e, "entry skipped");
                None
            }
        }
    }

    fn inlier_count(
        &self,
        matches: &cv_core::Matches,
        query_points: &[(f64, f64)],
        stored: &Features,
    ) -> Result<usize> {
        let result = estimate_homography(matches, query_points, &stored.points(), &self.ransac)?;
        if result.model.is_none() {
            return Err(RetrievalError::DegenerateGeometry(format!(
                "no homography from {} correspondences",
                matches.len()
            )));
        }
        Ok(result.num_inliers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_K;
    use cv_core::{Descriptor, Descriptors, KeyPoint, KeyPoints};
    use image::{Rgb, RgbImage};

    const POINTS: [(f64, f64); 10] = [
        (12.0, 30.0),
        (85.0, 14.0),
        (140.0, 62.0),
        (33.0, 118.0),
        (97.0, 101.0),
        (160.0, 150.0),
        (58.0, 173.0),
        (121.0, 8.0),
        (7.0, 77.0),
        (176.0, 95.0),
    ];

    /// Descriptor `i` has bytes `3i..3i+3` set, so distinct descriptors are
    /// 48 bits apart. Up to ten fit in 32 bytes.
    fn descriptor(i: usize) -> Descriptor {
        let mut data = vec![0u8; 32];
        for b in &mut data[i * 3..i * 3 + 3] {
            *b = 0xFF;
        }
        Descriptor::new(data)
    }

    fn features(n: usize, offset: (f64, f64)) -> Features {
        let kps: KeyPoints = POINTS[..n]
            .iter()
            .map(|&(x, y)| KeyPoint::new(x + offset.0, y + offset.1))
            .collect::<Vec<_>>()
            .into();
        let descs: Descriptors = (0..n).map(descriptor).collect::<Vec<_>>().into();
        Features::new(kps, descs).unwrap()
    }

    fn pic(id: &str) -> Arc<Picture> {
        Picture::new(id, RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]))).shared()
    }

    #[test]
    fn min_match_count_boundary_is_strict() {
        let index = GeometricMatchIndex::new(GeometricConfig::default()).unwrap();
        index
            .train_features(vec![
                (pic("six"), features(6, (5.0, 3.0))),
                (pic("seven"), features(7, (5.0, 3.0))),
            ])
            .unwrap();

        let results = index.query_features(&features(8, (0.0, 0.0)));
        let ids: Vec<&str> = results.iter().map(|m| m.picture.id().as_str()).collect();
        assert_eq!(ids, vec!["seven"]);
        assert_eq!(results[0].score, 7.0);
    }

    #[test]
    fn collinear_correspondences_are_skipped() {
        let n = 8;
        let line = |offset: f64| -> Features {
            let kps: KeyPoints = (0..n)
                .map(|i| KeyPoint::new(10.0 + 10.0 * i as f64 + offset, 20.0 + 5.0 * i as f64))
                .collect::<Vec<_>>()
                .into();
            let descs: Descriptors = (0..n).map(descriptor).collect::<Vec<_>>().into();
            Features::new(kps, descs).unwrap()
        };

        let index = GeometricMatchIndex::new(GeometricConfig::default()).unwrap();
        index
            .train_features(vec![(pic("line"), line(3.0)), (pic("good"), features(8, (1.0, 1.0)))])
            .unwrap();

        let results = index.query_features(&line(0.0));
        assert!(results.iter().all(|m| m.picture.id().as_str() != "line"));
    }

    #[test]
    fn entries_without_keypoints_are_kept_but_never_match() {
        let index = GeometricMatchIndex::new(GeometricConfig::default()).unwrap();
        index
            .train_features(vec![(pic("blank"), Features::default()), (pic("dots"), features(10, (0.0, 0.0)))])
            .unwrap();
        assert_eq!(index.len(), 2);

        let results = index.query_features(&features(10, (2.0, -1.0)));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].picture.id().as_str(), "dots");
        assert_eq!(results[0].score, 10.0);
    }

    #[test]
    fn results_are_capped_at_k() {
        let index = GeometricMatchIndex::new(GeometricConfig::default()).unwrap();
        let corpus: Vec<_> = (0..14)
            .map(|i| (pic(&format!("copy{i}")), features(10, (i as f64, 0.5 * i as f64))))
            .collect();
        index.train_features(corpus).unwrap();

        let results = index.query_features(&features(10, (0.0, 0.0)));
        assert_eq!(results.len(), DEFAULT_K);
        assert!(results.iter().all(|m| m.score == 10.0));
        // equal scores keep corpus order
        assert_eq!(results[0].picture.id().as_str(), "copy0");
        assert_eq!(results[9].picture.id().as_str(), "copy9");
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let index = GeometricMatchIndex::new(GeometricConfig::default()).unwrap();
        assert!(matches!(index.train(&[]), Err(RetrievalError::EmptyTrainingSet)));
        assert!(matches!(
            index.train_features(Vec::new()),
            Err(RetrievalError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn invalid_ratio_is_rejected_at_construction() {
        let config = GeometricConfig::default().with_ratio_threshold(2.0);
        assert!(matches!(
            GeometricMatchIndex::new(config),
            Err(RetrievalError::UnsupportedConfiguration(_))
        ));
    }
}
