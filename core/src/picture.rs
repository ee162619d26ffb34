//! Picture identity and lazily decoded pixels
//!
//! A [`Picture`] is handed to the retrieval indices by whoever owns the image
//! corpus. The indices only ever hold it behind an `Arc` and read its pixels.

use image::RgbImage;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Stable, comparable identity of a picture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PictureId(String);

impl PictureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PictureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PictureId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PictureId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

type Loader = Box<dyn Fn() -> RgbImage + Send + Sync>;

/// An image with a stable identity.
///
/// Pixels are decoded at most once, on first call to [`Picture::image`], and
/// never change afterwards.
pub struct Picture {
    id: PictureId,
    pixels: OnceLock<RgbImage>,
    loader: Option<Loader>,
}

impl Picture {
    /// Wraps an already decoded image.
    pub fn new(id: impl Into<PictureId>, image: RgbImage) -> Self {
        let pixels = OnceLock::new();
        let _ = pixels.set(image);
        Self {
            id: id.into(),
            pixels,
            loader: None,
        }
    }

    /// Defers decoding to `loader`, which runs at most once.
    pub fn lazy<F>(id: impl Into<PictureId>, loader: F) -> Self
    where
        F: Fn() -> RgbImage + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            pixels: OnceLock::new(),
            loader: Some(Box::new(loader)),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn id(&self) -> &PictureId {
        &self.id
    }

    pub fn image(&self) -> &RgbImage {
        self.pixels.get_or_init(|| match &self.loader {
            Some(load) => load(),
            None => RgbImage::new(0, 0),
        })
    }

    pub fn is_decoded(&self) -> bool {
        self.pixels.get().is_some()
    }

    pub fn width(&self) -> u32 {
        self.image().width()
    }

    pub fn height(&self) -> u32 {
        self.image().height()
    }

    /// Number of colour channels of the decoded buffer.
    pub fn channels(&self) -> u8 {
        3
    }
}

impl fmt::Debug for Picture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Picture")
            .field("id", &self.id)
            .field("decoded", &self.is_decoded())
            .finish()
    }
}

impl PartialEq for Picture {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Picture {}
