pub mod descriptor;
pub mod keypoint;
pub mod picture;
pub mod robust;
pub mod runtime;

pub use descriptor::*;
pub use keypoint::*;
pub use picture::*;
pub use robust::{Ransac, RobustConfig, RobustModel, RobustResult};
pub use runtime::*;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}
