pub use cv_core::{Descriptor, Descriptors};

use cv_core::KeyPoints;
use image::GrayImage;

/// Detects keypoints and computes one descriptor per keypoint.
///
/// Implementations drop keypoints they cannot describe, so the returned
/// collections always have equal length.
pub trait FeatureExtractor {
    fn detect_and_compute(&self, image: &GrayImage) -> (KeyPoints, Descriptors);
}
