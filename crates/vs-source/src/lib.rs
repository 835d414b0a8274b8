//! Frame sources for vidscii (still image, video file, camera).

#[cfg(feature = "image-source")]
pub mod image;
#[cfg(feature = "video")]
pub mod video;
