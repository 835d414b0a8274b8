use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vs_core::error::CoreError;
use vs_core::frame::Frame;
use vs_core::traits::FrameSource;

/// Source d'image statique : décodée à `open()`, rendue une fois, puis épuisée.
///
/// # Example
/// ```no_run
/// use vs_core::traits::FrameSource;
/// use vs_source::image::ImageSource;
/// let mut source = ImageSource::new("photo.png");
/// source.open().unwrap();
/// assert!(source.next_frame().unwrap().is_some());
/// assert!(source.next_frame().unwrap().is_none());
/// ```
pub struct ImageSource {
    path: PathBuf,
    pending: Option<Frame>,
}

impl ImageSource {
    /// Source sur le fichier `path` (PNG, JPEG, BMP ; GIF : première image).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: None,
        }
    }
}

impl FrameSource for ImageSource {
    fn open(&mut self) -> Result<(), CoreError> {
        let frame = load_image(&self.path).map_err(|e| CoreError::SourceOpen(format!("{e:#}")))?;
        log::info!(
            "ImageSource: {}x{} ({})",
            frame.width(),
            frame.height(),
            self.path.display()
        );
        self.pending = Some(frame);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CoreError> {
        Ok(self.pending.take())
    }

    fn close(&mut self) {
        self.pending = None;
    }
}

/// Décode une image en `Frame` RGB8.
///
/// # Errors
/// Returns an error if the image cannot be loaded.
pub fn load_image(path: &Path) -> Result<Frame> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::from_rgb(width, height, rgb.into_raw())?)
}
