//! Configuration, types, and shared structures for vidscii.
//!
//! This crate contains the frame types, the glyph ramp, the collaborator
//! traits and the configuration logic shared across the vidscii workspace.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::GlyphRamp;
pub use config::PlayerConfig;
pub use error::CoreError;
pub use frame::{Frame, LuminanceGrid, SampledGrid};
pub use traits::{FrameSource, SourceGuard, TerminalSink};
