use fast_image_resize::images::{Image, ImageRef};
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use vs_core::error::CoreError;
use vs_core::frame::{Frame, SampledGrid};

/// Hauteur de sortie pour une frame `frame_w × frame_h` rendue sur `output_w` colonnes.
///
/// `round(output_w * frame_h / frame_w * aspect)`, au minimum 1.
///
/// # Example
/// ```
/// use vs_ascii::sampler::output_height;
/// assert_eq!(output_height(1920, 1080, 80, 0.55), 25);
/// assert_eq!(output_height(100, 1, 4, 0.55), 1);
/// ```
#[must_use]
pub fn output_height(frame_w: u32, frame_h: u32, output_w: u32, aspect: f32) -> u32 {
    if frame_w == 0 {
        return 1;
    }
    let h = f64::from(output_w) * (f64::from(frame_h) / f64::from(frame_w)) * f64::from(aspect);
    if h.is_finite() {
        (h.round() as u32).max(1)
    } else {
        1
    }
}

/// Sous-échantillonneur réutilisable wrappant fast_image_resize.
///
/// Moyenne par surface (filtre box), pas de plus-proche-voisin : pas d'aliasing
/// quand on réduit une frame 640 px en 80 colonnes.
///
/// # Example
/// ```
/// use vs_ascii::sampler::Sampler;
/// use vs_core::frame::Frame;
/// let mut sampler = Sampler::new(0.55);
/// let frame = Frame::filled(160, 90, (200, 100, 50));
/// let grid = sampler.sample(&frame, 80).unwrap();
/// assert_eq!((grid.width, grid.height), (80, 25));
/// ```
pub struct Sampler {
    inner: FirResizer,
    options: ResizeOptions,
    aspect: f32,
    grid: SampledGrid,
}

impl Sampler {
    /// Create a sampler with the given glyph-cell aspect correction.
    #[must_use]
    pub fn new(aspect: f32) -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box)),
            aspect,
            grid: SampledGrid::default(),
        }
    }

    /// Dernière grille produite.
    #[must_use]
    pub fn grid(&self) -> &SampledGrid {
        &self.grid
    }

    /// Sous-échantillonne `frame` vers `output_width` colonnes.
    ///
    /// # Errors
    /// - `CoreError::DegenerateFrame` si la frame a une dimension nulle.
    /// - `CoreError::InvalidDimensions` si `output_width == 0`.
    /// - `CoreError::Resize` si fast_image_resize rejette les buffers.
    pub fn sample(&mut self, frame: &Frame, output_width: u32) -> Result<&SampledGrid, CoreError> {
        if frame.is_degenerate() {
            return Err(CoreError::DegenerateFrame {
                width: frame.width(),
                height: frame.height(),
            });
        }
        if output_width == 0 {
            return Err(CoreError::InvalidDimensions {
                width: 0,
                height: frame.height(),
            });
        }

        let out_h = output_height(frame.width(), frame.height(), output_width, self.aspect);
        self.grid.ensure_size(output_width, out_h);

        if frame.width() == output_width && frame.height() == out_h {
            self.grid.data.copy_from_slice(frame.as_raw());
            return Ok(&self.grid);
        }

        let src = ImageRef::new(frame.width(), frame.height(), frame.as_raw(), PixelType::U8x3)
            .map_err(|e| CoreError::Resize(format!("source : {e}")))?;
        let mut dst =
            Image::from_slice_u8(output_width, out_h, &mut self.grid.data, PixelType::U8x3)
                .map_err(|e| CoreError::Resize(format!("destination : {e}")))?;

        self.inner
            .resize(&src, &mut dst, Some(&self.options))
            .map_err(|e| CoreError::Resize(e.to_string()))?;

        Ok(&self.grid)
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(vs_core::config::DEFAULT_ASPECT_CORRECTION)
    }
}
