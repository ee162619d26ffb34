//! Content-based image retrieval.
//!
//! Two interchangeable strategies rank a trained corpus of pictures against a
//! query picture:
//!
//! - [`HistogramSimilarityIndex`] compares per-block colour histograms by
//!   correlation.
//! - [`GeometricMatchIndex`] matches ORB descriptors and scores each corpus
//!   picture by the inlier count of a RANSAC homography.
//!
//! [`RetrievalMethod`] wraps either one behind a single `train` / `query`
//! surface.
//!
//! ```no_run
//! use cv_retrieval::{Picture, RetrievalMethod};
//! # fn load(_: &str) -> image::RgbImage { image::RgbImage::new(1, 1) }
//!
//! let method = RetrievalMethod::blocks_16x16_ycbcr();
//! let corpus = vec![
//!     Picture::new("beach", load("beach.png")).shared(),
//!     Picture::new("forest", load("forest.png")).shared(),
//! ];
//! method.train(&corpus)?;
//!
//! for hit in method.query(&Picture::new("query", load("query.png"))) {
//!     println!("{} {:.3}", hit.picture.id(), hit.score);
//! }
//! # Ok::<(), cv_retrieval::RetrievalError>(())
//! ```

pub mod block_histogram;
pub mod config;
pub mod error;
pub mod geometric_index;
pub mod histogram_index;
pub mod keypoints;
pub mod method;
pub mod ranking;

pub use block_histogram::{BlockHistogramExtractor, BlockHistograms};
pub use config::{
    ColorSpace, GeometricConfig, GridMode, HistogramConfig, MethodConfig, DEFAULT_K,
    MIN_MATCH_COUNT, ORB_BRUTE_RATIO_HOMOGRAPHY,
};
pub use cv_core::{Picture, PictureId};
pub use error::{Result, RetrievalError};
pub use geometric_index::GeometricMatchIndex;
pub use histogram_index::HistogramSimilarityIndex;
pub use keypoints::{Features, KeypointExtractor};
pub use method::RetrievalMethod;
pub use ranking::RankedMatch;
