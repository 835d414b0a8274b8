//! Frame-to-text conversion engine for vidscii.
//!
//! Downsamples RGB frames, normalizes their luminance and renders each cell
//! as a true-color glyph.

pub mod converter;
pub mod luminance;
pub mod renderer;
pub mod sampler;

pub use converter::FrameConverter;
