//! Content-based image retrieval built from the `cv-*` crates.
//!
//! Most users only need [`retrieval`]; the lower crates are re-exported for
//! callers that want the colour conversions, ORB features or RANSAC directly.

pub use cv_core as core;
pub use cv_features as features;
pub use cv_imgproc as imgproc;
pub use cv_retrieval as retrieval;

pub use cv_retrieval::{Picture, PictureId, RankedMatch, RetrievalMethod};

/// Initialize a single global Rayon thread pool for training and querying.
///
/// Call this once at application startup, before the first `train`.
/// Repeated calls are idempotent and return the first initialization result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `CV_RETRIEVAL_THREADS` env var
/// 3. Rayon default
pub fn init_thread_pool(num_threads: Option<usize>) -> cv_core::Result<()> {
    cv_core::init_global_thread_pool(num_threads)
}
