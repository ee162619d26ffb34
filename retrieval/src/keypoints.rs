use crate::config::GeometricConfig;
use crate::error::{Result, RetrievalError};
use cv_core::{Descriptors, KeyPoints};
use cv_features::{FeatureExtractor, Orb};
use cv_imgproc::convert_rgb_to_gray;
use image::RgbImage;

/// Keypoints paired index-for-index with their binary descriptors.
#[derive(Debug, Clone, Default)]
pub struct Features {
    keypoints: KeyPoints,
    descriptors: Descriptors,
}

impl Features {
    pub fn new(keypoints: KeyPoints, descriptors: Descriptors) -> Result<Self> {
        if keypoints.len() != descriptors.len() {
            return Err(RetrievalError::FeatureMismatch {
                keypoints: keypoints.len(),
                descriptors: descriptors.len(),
            });
        }
        Ok(Self {
            keypoints,
            descriptors,
        })
    }

    pub fn keypoints(&self) -> &KeyPoints {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub(crate) fn points(&self) -> Vec<(f64, f64)> {
        self.keypoints.iter().map(|kp| (kp.x, kp.y)).collect()
    }
}

/// ORB keypoints and descriptors on the grayscale version of a picture.
#[derive(Debug, Clone)]
pub struct KeypointExtractor {
    orb: Orb,
}

impl KeypointExtractor {
    pub fn new(config: &GeometricConfig) -> Self {
        Self {
            orb: build_orb(config),
        }
    }

    pub fn extract(&self, image: &RgbImage) -> Features {
        let gray = convert_rgb_to_gray(image);
        let (keypoints, descriptors) = self.orb.detect_and_compute(&gray);
        Features {
            keypoints,
            descriptors,
        }
    }
}

pub(crate) fn build_orb(config: &GeometricConfig) -> Orb {
    Orb::new()
        .with_n_features(config.n_features)
        .with_n_levels(config.n_levels)
        .with_scale_factor(config.scale_factor)
        .with_pattern_seed(config.pattern_seed)
}
