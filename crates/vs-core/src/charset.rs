use crate::error::CoreError;

/// 11 caractères, du plus clair au plus dense. Rampe par défaut.
pub const RAMP_DEFAULT: &str = ".,:;+*?%S#@";

/// 10 caractères : compact, bon contraste (commence par un espace).
pub const RAMP_COMPACT: &str = " .:-=+*#%@";

/// Blocs Unicode (pseudo-pixels).
pub const RAMP_BLOCKS: &str = " ░▒▓█";

/// Rampe de glyphes ordonnée : index 0 = le plus clairsemé, index N-1 = le plus dense.
///
/// L'ordre est un invariant : une luminance croissante donne toujours
/// une densité visuelle non décroissante.
///
/// # Example
/// ```
/// use vs_core::charset::GlyphRamp;
/// let ramp = GlyphRamp::new(" .:#@").unwrap();
/// assert_eq!(ramp.glyph_for(0.0), ' ');
/// assert_eq!(ramp.glyph_for(255.0), '@');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: Vec<char>,
}

impl GlyphRamp {
    /// Build a ramp from a string ordered lightest→densest.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidGlyphRamp` if `ramp` is empty.
    pub fn new(ramp: &str) -> Result<Self, CoreError> {
        let glyphs: Vec<char> = ramp.chars().collect();
        if glyphs.is_empty() {
            return Err(CoreError::InvalidGlyphRamp(
                "la rampe doit contenir au moins un glyphe".into(),
            ));
        }
        Ok(Self { glyphs })
    }

    /// Number of glyphs (N).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always false: a ramp holds at least one glyph.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The glyphs, sparse to dense.
    #[must_use]
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    /// `floor(value / 255 * (N-1))`, clamped to `[0, N-1]`. NaN maps to 0.
    ///
    /// # Example
    /// ```
    /// use vs_core::charset::GlyphRamp;
    /// let ramp = GlyphRamp::default();
    /// assert_eq!(ramp.index_for(0.0), 0);
    /// assert_eq!(ramp.index_for(255.0), ramp.len() - 1);
    /// assert_eq!(ramp.index_for(f32::NAN), 0);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn index_for(&self, value: f32) -> usize {
        let last = self.glyphs.len() - 1;
        let raw = (value / 255.0 * last as f32).floor();
        if raw.is_nan() || raw <= 0.0 {
            0
        } else {
            (raw as usize).min(last)
        }
    }

    /// Glyph for a normalized luminance value in `[0, 255]`.
    #[inline(always)]
    #[must_use]
    pub fn glyph_for(&self, value: f32) -> char {
        self.glyphs[self.index_for(value)]
    }
}

impl Default for GlyphRamp {
    fn default() -> Self {
        Self {
            glyphs: RAMP_DEFAULT.chars().collect(),
        }
    }
}
