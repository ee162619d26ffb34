use crate::config::{ColorSpace, GridMode};
use crate::error::Result;
use cv_imgproc::{
    compare_hist_correlation, compute_channel_histogram, convert_rgb_to_hsv, convert_rgb_to_ycbcr,
    grid_blocks, Histogram,
};
use image::RgbImage;

/// Per-block, per-channel histograms of one image, blocks in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockHistograms {
    blocks: Vec<Vec<Histogram>>,
}

impl BlockHistograms {
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Histograms kept per block; the same for every block.
    pub fn num_channels(&self) -> usize {
        self.blocks.first().map_or(0, Vec::len)
    }

    pub fn block(&self, idx: usize) -> Option<&[Histogram]> {
        self.blocks.get(idx).map(Vec::as_slice)
    }
}

/// Splits images into a fixed grid and histograms the retained channels of
/// the configured colour space in every block.
#[derive(Debug, Clone, Copy)]
pub struct BlockHistogramExtractor {
    grid: GridMode,
    color_space: ColorSpace,
}

impl BlockHistogramExtractor {
    pub fn new(grid: GridMode, color_space: ColorSpace) -> Self {
        Self { grid, color_space }
    }

    pub fn grid(&self) -> GridMode {
        self.grid
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn extract(&self, image: &RgbImage) -> Result<BlockHistograms> {
        let converted = match self.color_space {
            ColorSpace::Hsv => convert_rgb_to_hsv(image),
            ColorSpace::YCbCr => convert_rgb_to_ycbcr(image),
        };

        let side = self.grid.side();
        let channels = self.color_space.retained_channels();
        let blocks = grid_blocks(converted.width(), converted.height(), side, side)?
            .into_iter()
            .map(|rect| {
                channels
                    .iter()
                    .map(|&c| compute_channel_histogram(&converted, c, rect))
                    .collect::<cv_imgproc::Result<Vec<_>>>()
            })
            .collect::<cv_imgproc::Result<Vec<_>>>()?;

        Ok(BlockHistograms { blocks })
    }

    /// Mean over blocks of the Euclidean norm of each block's vector of
    /// per-channel correlations. Larger means more alike.
    pub fn similarity(&self, query: &BlockHistograms, stored: &BlockHistograms) -> f64 {
        let n = query.blocks.len().min(stored.blocks.len());
        if n == 0 {
            return 0.0;
        }

        let total: f64 = query
            .blocks
            .iter()
            .zip(&stored.blocks)
            .map(|(q, s)| {
                q.iter()
                    .zip(s)
                    .map(|(hq, hs)| compare_hist_correlation(hq, hs).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .sum();

        total / n as f64
    }
}
