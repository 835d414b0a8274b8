use thiserror::Error;

/// Errors originating from the core pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Invalid width/height dimensions (buffer size mismatch, zero output width).
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Frame with a zero width or height reached the sampler.
    #[error("Frame dégénérée : {width}×{height}")]
    DegenerateFrame {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Glyph ramp cannot be used.
    #[error("Rampe de glyphes invalide : {0}")]
    InvalidGlyphRamp(String),

    /// The frame source could not be opened. Fatal for the session.
    #[error("Impossible d'ouvrir la source : {0}")]
    SourceOpen(String),

    /// The frame source failed mid-stream. Treated as end of stream.
    #[error("Erreur de lecture de la source : {0}")]
    SourceRead(String),

    /// Resampling backend rejected the buffers.
    #[error("Échec du redimensionnement : {0}")]
    Resize(String),

    /// The terminal sink failed to clear or write.
    #[error("Erreur d'écriture terminal : {0}")]
    Sink(#[from] std::io::Error),
}
