use crate::error::CoreError;

/// Octets par pixel RGB (pas d'alpha).
pub const RGB_CHANNELS: usize = 3;

/// Frame vidéo brute, immuable. RGB row-major, 3 bytes par pixel.
///
/// Produite par une `FrameSource`, consommée par le pipeline le temps
/// d'un cycle de rendu. Jamais modifiée en place.
///
/// # Example
/// ```
/// use vs_core::frame::Frame;
/// let frame = Frame::filled(4, 2, (10, 20, 30));
/// assert_eq!(frame.pixel(3, 1), (10, 20, 30));
/// assert_eq!(frame.as_raw().len(), 4 * 2 * 3);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Wrap raw RGB bytes.
    ///
    /// A zero-sized frame is accepted here; the sampler rejects it.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidDimensions` if `data.len() != width * height * 3`.
    ///
    /// # Example
    /// ```
    /// use vs_core::frame::Frame;
    /// assert!(Frame::from_rgb(2, 2, vec![0; 12]).is_ok());
    /// assert!(Frame::from_rgb(2, 2, vec![0; 11]).is_err());
    /// ```
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        if data.len() != width as usize * height as usize * RGB_CHANNELS {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Frame unie d'une seule couleur. Utile pour les tests et les mires.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: (u8, u8, u8)) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * RGB_CHANNELS);
        for _ in 0..count {
            data.extend_from_slice(&[rgb.0, rgb.1, rgb.2]);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// True si une des dimensions est nulle.
    #[inline]
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw RGB bytes, row-major.
    #[inline]
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Accès au pixel (x, y) → (r, g, b).
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        rgb_at(&self.data, self.width, x, y)
    }
}

/// Grille RGB sous-échantillonnée, une cellule par glyphe rendu.
///
/// Pré-allouée par le sampler et réutilisée d'un cycle à l'autre.
///
/// # Example
/// ```
/// use vs_core::frame::SampledGrid;
/// let grid = SampledGrid::new(80, 24);
/// assert_eq!(grid.data.len(), 80 * 24 * 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SampledGrid {
    /// Pixels RGB, row-major, 3 bytes par cellule.
    pub data: Vec<u8>,
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl SampledGrid {
    /// Crée une grille noire aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * RGB_CHANNELS],
            width,
            height,
        }
    }

    /// Redimensionne la grille si nécessaire. Conserve la capacité allouée.
    pub fn ensure_size(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.data
                .resize(width as usize * height as usize * RGB_CHANNELS, 0);
        }
    }

    /// Couleur de la cellule (x, y).
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        rgb_at(&self.data, self.width, x, y)
    }

    /// Number of cells.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True when the grid has no cells.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Luminance normalisée [0.0, 255.0], alignée cellule par cellule sur une `SampledGrid`.
///
/// # Example
/// ```
/// use vs_core::frame::LuminanceGrid;
/// let lum = LuminanceGrid::new(4, 2);
/// assert_eq!(lum.values.len(), 8);
/// assert_eq!(lum.get(3, 1), 0.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct LuminanceGrid {
    /// Valeurs row-major.
    pub values: Vec<f32>,
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl LuminanceGrid {
    /// Crée une grille à zéro.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            values: vec![0.0; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Valeur de la cellule (x, y).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.width as usize + x as usize]
    }
}

#[inline(always)]
fn rgb_at(data: &[u8], width: u32, x: u32, y: u32) -> (u8, u8, u8) {
    let idx = (y as usize * width as usize + x as usize) * RGB_CHANNELS;
    match data.get(idx..idx + RGB_CHANNELS) {
        Some(px) => (px[0], px[1], px[2]),
        None => (0, 0, 0),
    }
}
