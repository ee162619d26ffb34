//! ORB (Oriented FAST and Rotated BRIEF) implementation
//!
//! ORB combines the FAST keypoint detector over an image pyramid with a BRIEF
//! descriptor steered by the keypoint's intensity-centroid orientation.
//!
//! The BRIEF sampling pattern is drawn once per [`Orb`] from a fixed seed, so
//! every extractor built with the same seed produces comparable descriptors.

use crate::descriptor::{Descriptor, Descriptors, FeatureExtractor};
use crate::fast::fast_detect;
use crate::{FeatureError, Result};
use cv_core::{KeyPoint, KeyPoints};
use image::GrayImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 256 tests packed into 32 bytes.
pub const ORB_DESCRIPTOR_BYTES: usize = 32;

pub const DEFAULT_PATTERN_SEED: u64 = 0x0b5e_ed01;

/// ORB feature detector and descriptor
#[derive(Debug, Clone)]
pub struct Orb {
    n_features: usize,
    scale_factor: f32,
    n_levels: usize,
    edge_threshold: u32,
    patch_size: u32,
    fast_threshold: u8,
    pattern: Vec<(f32, f32, f32, f32)>,
}

impl Default for Orb {
    fn default() -> Self {
        Self {
            n_features: 500,
            scale_factor: 1.2,
            n_levels: 8,
            edge_threshold: 31,
            patch_size: 31,
            fast_threshold: 20,
            pattern: generate_brief_pattern(31, DEFAULT_PATTERN_SEED),
        }
    }
}

impl Orb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_features(mut self, n: usize) -> Self {
        self.n_features = n;
        self
    }

    pub fn with_n_levels(mut self, n: usize) -> Self {
        self.n_levels = n;
        self
    }

    pub fn with_scale_factor(mut self, factor: f32) -> Self {
        self.scale_factor = factor;
        self
    }

    pub fn with_pattern_seed(mut self, seed: u64) -> Self {
        self.pattern = generate_brief_pattern(self.patch_size, seed);
        self
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_features == 0 {
            return Err(FeatureError::DetectionError("n_features must be >= 1".into()));
        }
        if self.n_levels == 0 {
            return Err(FeatureError::DetectionError("n_levels must be >= 1".into()));
        }
        if !(self.scale_factor > 1.0) {
            return Err(FeatureError::DetectionError(format!(
                "scale_factor must be > 1, got {}",
                self.scale_factor
            )));
        }
        Ok(())
    }

    /// Keypoints must sit far enough from the border for the rotated pattern
    /// and the orientation patch to stay inside the image.
    fn border(&self) -> u32 {
        let rotated_reach = (self.patch_size as f32 / 2.0 * std::f32::consts::SQRT_2).ceil() as u32 + 1;
        self.edge_threshold.max(rotated_reach)
    }

    /// Detect FAST keypoints on one pyramid level, keeping only those that can
    /// be described.
    fn detect_level(&self, level_img: &GrayImage) -> KeyPoints {
        let border = self.border() as f64;
        let (w, h) = (level_img.width() as f64, level_img.height() as f64);

        let mut kps = fast_detect(level_img, self.fast_threshold, self.n_features * 2);
        kps.keypoints
            .retain(|kp| kp.x >= border && kp.y >= border && kp.x < w - border && kp.y < h - border);
        kps
    }

    /// Compute orientations for keypoints using intensity centroid
    pub fn compute_orientations(&self, image: &GrayImage, keypoints: &mut KeyPoints) {
        let half_patch = (self.patch_size / 2) as i32;
        let radius_sq = half_patch * half_patch;

        for kp in &mut keypoints.keypoints {
            let x = kp.x as i32;
            let y = kp.y as i32;

            let mut m01 = 0.0f64;
            let mut m10 = 0.0f64;

            for dy in -half_patch..=half_patch {
                for dx in -half_patch..=half_patch {
                    if dx * dx + dy * dy > radius_sq {
                        continue;
                    }
                    let px = x + dx;
                    let py = y + dy;

                    if px >= 0 && px < image.width() as i32 && py >= 0 && py < image.height() as i32 {
                        let intensity = image.get_pixel(px as u32, py as u32)[0] as f64;
                        m01 += intensity * dy as f64;
                        m10 += intensity * dx as f64;
                    }
                }
            }

            kp.angle = m01.atan2(m10).to_degrees();
        }
    }
}

impl FeatureExtractor for Orb {
    fn detect_and_compute(&self, image: &GrayImage) -> (KeyPoints, Descriptors) {
        let mut features: Vec<(KeyPoint, Descriptor)> = Vec::new();
        let min_side = 2 * self.border() + 1;
        let mut scale = 1.0f32;

        for level in 0..self.n_levels {
            let level_img = if level == 0 {
                image.clone()
            } else {
                scale_image(image, scale)
            };
            if level_img.width() < min_side || level_img.height() < min_side {
                break;
            }

            let mut kps = self.detect_level(&level_img);
            self.compute_orientations(&level_img, &mut kps);
            let smoothed = image::imageops::blur(&level_img, 2.0);

            for kp in kps.iter() {
                if let Some(desc) = compute_orb_descriptor(&smoothed, kp, &self.pattern) {
                    let full_res = KeyPoint::new(kp.x * scale as f64, kp.y * scale as f64)
                        .with_size(self.patch_size as f64 * scale as f64)
                        .with_angle(kp.angle)
                        .with_response(kp.response)
                        .with_octave(level as i32);
                    features.push((full_res, desc));
                }
            }

            scale *= self.scale_factor;
        }

        features.sort_by(|a, b| b.0.response.total_cmp(&a.0.response));
        features.truncate(self.n_features);

        let (keypoints, descriptors): (Vec<_>, Vec<_>) = features.into_iter().unzip();
        (KeyPoints::from(keypoints), Descriptors::from(descriptors))
    }
}

/// Generate BRIEF sampling pairs inside the patch from a fixed seed.
fn generate_brief_pattern(patch_size: u32, seed: u64) -> Vec<(f32, f32, f32, f32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let half = (patch_size / 2) as i32;

    (0..ORB_DESCRIPTOR_BYTES * 8)
        .map(|_| {
            let mut coord = || rng.gen_range(-half..=half) as f32;
            (coord(), coord(), coord(), coord())
        })
        .collect()
}

/// Compute ORB descriptor with rotation. Returns `None` when any rotated test
/// point falls outside the image.
fn compute_orb_descriptor(
    image: &GrayImage,
    kp: &KeyPoint,
    pattern: &[(f32, f32, f32, f32)],
) -> Option<Descriptor> {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let cx = kp.x as f32;
    let cy = kp.y as f32;

    let angle_rad = kp.angle.to_radians();
    let cos_a = angle_rad.cos() as f32;
    let sin_a = angle_rad.sin() as f32;

    let sample = |x: f32, y: f32| -> Option<u8> {
        let px = (cx + cos_a * x - sin_a * y).round() as i32;
        let py = (cy + sin_a * x + cos_a * y).round() as i32;
        if px < 0 || px >= width || py < 0 || py >= height {
            return None;
        }
        Some(image.get_pixel(px as u32, py as u32)[0])
    };

    let mut descriptor_data = vec![0u8; ORB_DESCRIPTOR_BYTES];
    for (i, &(x1, y1, x2, y2)) in pattern.iter().enumerate() {
        if sample(x1, y1)? < sample(x2, y2)? {
            descriptor_data[i / 8] |= 1 << (7 - i % 8);
        }
    }

    Some(Descriptor::new(descriptor_data))
}

fn scale_image(image: &GrayImage, scale: f32) -> GrayImage {
    let new_width = (image.width() as f32 / scale).round() as u32;
    let new_height = (image.height() as f32 / scale).round() as u32;

    image::imageops::resize(
        image,
        new_width.max(1),
        new_height.max(1),
        image::imageops::FilterType::Triangle,
    )
}

pub fn orb_detect_and_compute(image: &GrayImage, n_features: usize) -> (KeyPoints, Descriptors) {
    Orb::new().with_n_features(n_features).detect_and_compute(image)
}
