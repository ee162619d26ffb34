pub mod descriptor;
pub mod fast;
pub mod matcher;
pub mod orb;
pub mod ransac;

pub use descriptor::*;
pub use fast::*;
pub use matcher::*;
pub use orb::*;
pub use ransac::*;

pub type Result<T> = std::result::Result<T, FeatureError>;

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("Detection error: {0}")]
    DetectionError(String),

    #[error("Matching error: {0}")]
    MatchingError(String),
}
