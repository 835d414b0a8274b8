//! Terminal output for vidscii.
//!
//! Provides the ANSI true-color terminal sink and FPS tracking.

pub mod fps;
pub mod terminal;

pub use terminal::AnsiTerminal;
