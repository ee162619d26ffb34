pub mod color;
pub mod grid;
pub mod histogram;

pub use color::*;
pub use grid::*;
pub use histogram::*;

pub type Result<T> = std::result::Result<T, ImgprocError>;

#[derive(Debug, thiserror::Error)]
pub enum ImgprocError {
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Invalid channel {channel} for a {channels}-channel image")]
    InvalidChannel { channel: usize, channels: usize },
}
