use vs_core::charset::GlyphRamp;
use vs_core::error::CoreError;
use vs_core::frame::{Frame, LuminanceGrid};

use crate::luminance::normalize_into;
use crate::renderer::render_into;
use crate::sampler::Sampler;

/// FrameConverter orchestre sampler → normalisation → rendu pour une frame.
///
/// Tous les buffers intermédiaires sont possédés et réutilisés d'un cycle à l'autre.
///
/// # Example
/// ```
/// use vs_ascii::converter::FrameConverter;
/// use vs_core::charset::GlyphRamp;
/// use vs_core::frame::Frame;
///
/// let mut converter = FrameConverter::new(GlyphRamp::default(), 0.55);
/// let text = converter.convert(&Frame::filled(4, 4, (10, 10, 10)), 4).unwrap();
/// assert_eq!(text.lines().count(), 2);
/// ```
pub struct FrameConverter {
    sampler: Sampler,
    ramp: GlyphRamp,
    luminance: LuminanceGrid,
    output: String,
}

impl FrameConverter {
    /// Create a converter for the given ramp and glyph-cell aspect correction.
    #[must_use]
    pub fn new(ramp: GlyphRamp, aspect: f32) -> Self {
        Self {
            sampler: Sampler::new(aspect),
            ramp,
            luminance: LuminanceGrid::default(),
            output: String::new(),
        }
    }

    /// The active ramp.
    #[must_use]
    pub fn ramp(&self) -> &GlyphRamp {
        &self.ramp
    }

    /// Convertit une frame en texte prêt à écrire sur le terminal.
    ///
    /// # Errors
    /// Propagates sampler errors (`DegenerateFrame`, `InvalidDimensions`, `Resize`).
    /// The output buffer is left untouched on error.
    pub fn convert(&mut self, frame: &Frame, output_width: u32) -> Result<&str, CoreError> {
        let grid = self.sampler.sample(frame, output_width)?;
        normalize_into(grid, &mut self.luminance);
        render_into(&self.luminance, grid, &self.ramp, &mut self.output);
        Ok(&self.output)
    }
}
