use crate::config::{
    ColorSpace, GeometricConfig, GridMode, HistogramConfig, MethodConfig, ORB_BRUTE_RATIO_HOMOGRAPHY,
};
use crate::error::Result;
use crate::geometric_index::GeometricMatchIndex;
use crate::histogram_index::HistogramSimilarityIndex;
use crate::ranking::RankedMatch;
use cv_core::Picture;
use std::sync::Arc;

/// A configured retrieval strategy behind one `train` / `query` surface.
pub enum RetrievalMethod {
    Histogram(HistogramSimilarityIndex),
    Geometric(GeometricMatchIndex),
}

impl RetrievalMethod {
    pub fn from_config(config: MethodConfig) -> Result<Self> {
        Ok(match config {
            MethodConfig::Histogram(c) => RetrievalMethod::Histogram(HistogramSimilarityIndex::new(c)?),
            MethodConfig::Geometric(c) => RetrievalMethod::Geometric(GeometricMatchIndex::new(c)?),
        })
    }

    /// Builds a method from its name, see [`MethodConfig`]'s `FromStr`.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::from_config(name.parse()?)
    }

    /// Whole-image chroma histograms.
    pub fn full_image_ycbcr() -> Self {
        RetrievalMethod::Histogram(HistogramSimilarityIndex::build(HistogramConfig::new(
            GridMode::FullImage,
            ColorSpace::YCbCr,
        )))
    }

    /// Chroma histograms over a 16x16 block grid.
    pub fn blocks_16x16_ycbcr() -> Self {
        RetrievalMethod::Histogram(HistogramSimilarityIndex::build(HistogramConfig::new(
            GridMode::Blocks16x16,
            ColorSpace::YCbCr,
        )))
    }

    pub fn orb_brute_ratio_homography() -> Self {
        RetrievalMethod::Geometric(GeometricMatchIndex::build(GeometricConfig::default()))
    }

    pub fn name(&self) -> String {
        match self {
            RetrievalMethod::Histogram(index) => {
                let c = index.config();
                format!("{}_{}", c.grid, c.color_space)
            }
            RetrievalMethod::Geometric(_) => ORB_BRUTE_RATIO_HOMOGRAPHY.to_string(),
        }
    }

    pub fn k(&self) -> usize {
        match self {
            RetrievalMethod::Histogram(index) => index.config().k,
            RetrievalMethod::Geometric(index) => index.config().k,
        }
    }

    /// Replaces the corpus. On error the previous corpus is left in place.
    pub fn train(&self, images: &[Arc<Picture>]) -> Result<()> {
        match self {
            RetrievalMethod::Histogram(index) => index.train(images),
            RetrievalMethod::Geometric(index) => index.train(images),
        }
    }

    /// At most `k` corpus pictures, most similar first.
    pub fn query(&self, picture: &Picture) -> Vec<RankedMatch> {
        match self {
            RetrievalMethod::Histogram(index) => index.query(picture),
            RetrievalMethod::Geometric(index) => index.query(picture),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RetrievalMethod::Histogram(index) => index.len(),
            RetrievalMethod::Geometric(index) => index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RetrievalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalMethod")
            .field("name", &self.name())
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetrievalError;

    #[test]
    fn preset_names_round_trip() {
        for method in [
            RetrievalMethod::full_image_ycbcr(),
            RetrievalMethod::blocks_16x16_ycbcr(),
            RetrievalMethod::orb_brute_ratio_homography(),
        ] {
            let rebuilt = RetrievalMethod::from_name(&method.name()).unwrap();
            assert_eq!(rebuilt.name(), method.name());
            assert_eq!(rebuilt.k(), 10);
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = MethodConfig::Geometric(GeometricConfig::default().with_k(0));
        assert!(matches!(
            RetrievalMethod::from_config(config),
            Err(RetrievalError::UnsupportedConfiguration(_))
        ));
        assert!(RetrievalMethod::from_name("blocks_8x8_ycbcr").is_err());
    }

    #[test]
    fn presets_start_empty() {
        let method = RetrievalMethod::blocks_16x16_ycbcr();
        assert!(method.is_empty());
        assert!(method.query(&Picture::new("q", image::RgbImage::new(8, 8))).is_empty());
    }
}
