use cv_features::FeatureError;
use cv_imgproc::ImgprocError;

pub type Result<T> = std::result::Result<T, RetrievalError>;

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("cannot train an index on an empty set of pictures")]
    EmptyTrainingSet,

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Homography estimation failed for one corpus entry. Recovered inside
    /// `query` by leaving the entry out of the ranking.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("{keypoints} keypoints but {descriptors} descriptors")]
    FeatureMismatch { keypoints: usize, descriptors: usize },

    #[error("Image processing error: {0}")]
    Imgproc(#[from] ImgprocError),
}

impl From<FeatureError> for RetrievalError {
    fn from(e: FeatureError) -> Self {
        match e {
            FeatureError::DetectionError(msg) => RetrievalError::UnsupportedConfiguration(msg),
            FeatureError::MatchingError(msg) => RetrievalError::DegenerateGeometry(msg),
        }
    }
}
