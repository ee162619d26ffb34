//! Construction-time configuration for the retrieval methods.
//!
//! Every config is validated before an index is built from it; a bad value is
//! reported as [`RetrievalError::UnsupportedConfiguration`] and never reaches
//! `query`.

use crate::error::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of matches returned by a query unless configured otherwise.
pub const DEFAULT_K: usize = 10;

/// An entry needs strictly more ratio-test survivors than this to be verified.
pub const MIN_MATCH_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridMode {
    #[serde(rename = "full_image")]
    FullImage,
    #[serde(rename = "blocks_16x16")]
    Blocks16x16,
    #[serde(rename = "blocks_32x32")]
    Blocks32x32,
}

impl GridMode {
    /// Rows and columns of the block grid (always square).
    pub fn side(&self) -> u32 {
        match self {
            GridMode::FullImage => 1,
            GridMode::Blocks16x16 => 16,
            GridMode::Blocks32x32 => 32,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GridMode::FullImage => "full_image",
            GridMode::Blocks16x16 => "blocks_16x16",
            GridMode::Blocks32x32 => "blocks_32x32",
        }
    }
}

impl fmt::Display for GridMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GridMode {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full_image" | "full" => Ok(GridMode::FullImage),
            "blocks_16x16" | "16x16" => Ok(GridMode::Blocks16x16),
            "blocks_32x32" | "32x32" => Ok(GridMode::Blocks32x32),
            other => Err(RetrievalError::UnsupportedConfiguration(format!(
                "unknown grid mode '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorSpace {
    #[serde(rename = "hsv")]
    Hsv,
    #[serde(rename = "ycbcr")]
    YCbCr,
}

impl ColorSpace {
    /// Channel indices compared between histograms. HSV keeps hue only;
    /// YCbCr drops luma and keeps the chroma pair.
    pub fn retained_channels(&self) -> &'static [usize] {
        match self {
            ColorSpace::Hsv => &[0],
            ColorSpace::YCbCr => &[1, 2],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorSpace::Hsv => "hsv",
            ColorSpace::YCbCr => "ycbcr",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorSpace {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hsv" => Ok(ColorSpace::Hsv),
            "ycbcr" | "ycrcb" => Ok(ColorSpace::YCbCr),
            other => Err(RetrievalError::UnsupportedConfiguration(format!(
                "unknown color space '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub grid: GridMode,
    pub color_space: ColorSpace,
    pub k: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            grid: GridMode::FullImage,
            color_space: ColorSpace::YCbCr,
            k: DEFAULT_K,
        }
    }
}

impl HistogramConfig {
    pub fn new(grid: GridMode, color_space: ColorSpace) -> Self {
        Self {
            grid,
            color_space,
            ..Self::default()
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(RetrievalError::UnsupportedConfiguration("k must be >= 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometricConfig {
    /// Strongest ORB keypoints kept per image.
    pub n_features: usize,
    /// ORB pyramid depth.
    pub n_levels: usize,
    /// Downscale between consecutive pyramid levels, > 1.
    pub scale_factor: f32,
    pub ratio_threshold: f32,
    pub min_match_count: usize,
    /// RANSAC inlier tolerance in pixels.
    pub reprojection_threshold: f64,
    pub ransac_max_iterations: usize,
    pub ransac_confidence: f64,
    pub ransac_seed: u64,
    pub pattern_seed: u64,
    pub k: usize,
}

impl Default for GeometricConfig {
    fn default() -> Self {
        Self {
            n_features: 500,
            n_levels: 8,
            scale_factor: 1.2,
            ratio_threshold: 0.9,
            min_match_count: MIN_MATCH_COUNT,
            reprojection_threshold: 5.0,
            ransac_max_iterations: 2000,
            ransac_confidence: 0.995,
            ransac_seed: 0x5eed_cafe,
            pattern_seed: cv_features::DEFAULT_PATTERN_SEED,
            k: DEFAULT_K,
        }
    }
}

impl GeometricConfig {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_ratio_threshold(mut self, ratio: f32) -> Self {
        self.ratio_threshold = ratio;
        self
    }

    pub fn with_min_match_count(mut self, count: usize) -> Self {
        self.min_match_count = count;
        self
    }

    pub fn with_n_features(mut self, n: usize) -> Self {
        self.n_features = n;
        self
    }

    pub fn with_pyramid(mut self, n_levels: usize, scale_factor: f32) -> Self {
        self.n_levels = n_levels;
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_ransac_seed(mut self, seed: u64) -> Self {
        self.ransac_seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(RetrievalError::UnsupportedConfiguration(msg));

        if self.k == 0 {
            return invalid("k must be >= 1".into());
        }
        if !(self.ratio_threshold > 0.0 && self.ratio_threshold <= 1.0) {
            return invalid(format!(
                "ratio_threshold must be in (0, 1], got {}",
                self.ratio_threshold
            ));
        }
        if !(self.reprojection_threshold > 0.0 && self.reprojection_threshold.is_finite()) {
            return invalid(format!(
                "reprojection_threshold must be positive, got {}",
                self.reprojection_threshold
            ));
        }
        if self.ransac_max_iterations == 0 {
            return invalid("ransac_max_iterations must be >= 1".into());
        }
        if !(self.ransac_confidence > 0.0 && self.ransac_confidence < 1.0) {
            return invalid(format!(
                "ransac_confidence must be in (0, 1), got {}",
                self.ransac_confidence
            ));
        }
        crate::keypoints::build_orb(self).validate()?;
        Ok(())
    }
}

/// Which retrieval strategy to build, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MethodConfig {
    Histogram(HistogramConfig),
    Geometric(GeometricConfig),
}

impl MethodConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            MethodConfig::Histogram(c) => c.validate(),
            MethodConfig::Geometric(c) => c.validate(),
        }
    }
}

pub const ORB_BRUTE_RATIO_HOMOGRAPHY: &str = "orb_brute_ratio_homography";

impl FromStr for MethodConfig {
    type Err = RetrievalError;

    /// Accepts `orb_brute_ratio_homography` or `<grid>_<color space>`, e.g.
    /// `full_image_ycbcr`, `blocks_32x32_hsv`.
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        if name == ORB_BRUTE_RATIO_HOMOGRAPHY {
            return Ok(MethodConfig::Geometric(GeometricConfig::default()));
        }

        let (grid, color) = name.rsplit_once('_').ok_or_else(|| {
            RetrievalError::UnsupportedConfiguration(format!("unknown retrieval method '{s}'"))
        })?;
        Ok(MethodConfig::Histogram(HistogramConfig::new(
            grid.parse()?,
            color.parse()?,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_sides() {
        assert_eq!(GridMode::FullImage.side(), 1);
        assert_eq!(GridMode::Blocks16x16.side(), 16);
        assert_eq!(GridMode::Blocks32x32.side(), 32);
    }

    #[test]
    fn parses_names() {
        assert_eq!("blocks_16x16".parse::<GridMode>().unwrap(), GridMode::Blocks16x16);
        assert_eq!("YCbCr".parse::<ColorSpace>().unwrap(), ColorSpace::YCbCr);
        assert!(matches!(
            "blocks_8x8".parse::<GridMode>(),
            Err(RetrievalError::UnsupportedConfiguration(_))
        ));
        assert!(matches!(
            "lab".parse::<ColorSpace>(),
            Err(RetrievalError::UnsupportedConfiguration(_))
        ));
    }

    #[test]
    fn parses_method_names() {
        assert_eq!(
            "full_image_ycbcr".parse::<MethodConfig>().unwrap(),
            MethodConfig::Histogram(HistogramConfig::new(GridMode::FullImage, ColorSpace::YCbCr))
        );
        assert_eq!(
            "blocks_32x32_hsv".parse::<MethodConfig>().unwrap(),
            MethodConfig::Histogram(HistogramConfig::new(GridMode::Blocks32x32, ColorSpace::Hsv))
        );
        assert!(matches!(
            "orb_brute_ratio_homography".parse::<MethodConfig>().unwrap(),
            MethodConfig::Geometric(_)
        ));
        assert!("sift".parse::<MethodConfig>().is_err());
        assert!("blocks_16x16_rgb".parse::<MethodConfig>().is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(HistogramConfig::default().validate().is_ok());
        assert!(HistogramConfig::default().with_k(0).validate().is_err());

        assert!(GeometricConfig::default().validate().is_ok());
        assert!(GeometricConfig::default().with_ratio_threshold(0.0).validate().is_err());
        assert!(GeometricConfig::default().with_ratio_threshold(1.5).validate().is_err());
        assert!(GeometricConfig::default().with_ratio_threshold(f32::NAN).validate().is_err());
        let bad = GeometricConfig {
            reprojection_threshold: -1.0,
            ..GeometricConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn orb_parameters_are_validated() {
        for bad in [
            GeometricConfig::default().with_n_features(0),
            GeometricConfig::default().with_pyramid(0, 1.2),
            GeometricConfig::default().with_pyramid(8, 1.0),
        ] {
            assert!(matches!(
                bad.validate(),
                Err(RetrievalError::UnsupportedConfiguration(_))
            ));
        }
        assert!(GeometricConfig::default().with_pyramid(4, 1.5).validate().is_ok());
    }

    #[test]
    fn json_round_trip() {
        let config = MethodConfig::Histogram(HistogramConfig::new(GridMode::Blocks16x16, ColorSpace::YCbCr));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"kind\":\"histogram\""));
        assert!(json.contains("\"blocks_16x16\""));
        let back: MethodConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn json_defaults_fill_missing_fields() {
        let config: MethodConfig =
            serde_json::from_str(r#"{"kind":"geometric","ratio_threshold":0.75}"#).unwrap();
        match config {
            MethodConfig::Geometric(g) => {
                assert_eq!(g.ratio_threshold, 0.75);
                assert_eq!(g.min_match_count, MIN_MATCH_COUNT);
                assert_eq!(g.k, DEFAULT_K);
            }
            other => panic!("unexpected config {other:?}"),
        }
    }
}
