use std::io;

use crate::error::CoreError;
use crate::frame::Frame;

/// Fournit des frames au pipeline.
///
/// Implémenté par : `VideoSource` (fichier ou caméra), `ImageSource`.
///
/// # Example
/// ```
/// use vs_core::traits::FrameSource;
/// use vs_core::frame::Frame;
/// use vs_core::CoreError;
///
/// struct Empty;
/// impl FrameSource for Empty {
///     fn open(&mut self) -> Result<(), CoreError> { Ok(()) }
///     fn next_frame(&mut self) -> Result<Option<Frame>, CoreError> { Ok(None) }
///     fn close(&mut self) {}
/// }
/// ```
pub trait FrameSource {
    /// Acquire the underlying resource (decoder process, device, file).
    ///
    /// # Errors
    /// Returns `CoreError::SourceOpen` if the source cannot be opened.
    fn open(&mut self) -> Result<(), CoreError>;

    /// Retourne la prochaine frame.
    ///
    /// `Ok(None)` signale l'épuisement de la source (fin de vidéo).
    ///
    /// # Errors
    /// Returns `CoreError::SourceRead` on a decode or I/O failure.
    fn next_frame(&mut self) -> Result<Option<Frame>, CoreError>;

    /// Libère la ressource.
    ///
    /// CONTRAT : idempotent, et sans effet sur une source jamais ouverte.
    fn close(&mut self);
}

/// Consomme le texte rendu.
///
/// # Example
/// ```
/// use vs_core::traits::TerminalSink;
///
/// struct Capture(Vec<String>);
/// impl TerminalSink for Capture {
///     fn clear(&mut self) -> std::io::Result<()> { Ok(()) }
///     fn write(&mut self, text: &str) -> std::io::Result<()> {
///         self.0.push(text.to_owned());
///         Ok(())
///     }
/// }
/// ```
pub trait TerminalSink {
    /// Efface l'affichage et replace le curseur en haut à gauche.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn clear(&mut self) -> io::Result<()>;

    /// Écrit une frame rendue.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn write(&mut self, text: &str) -> io::Result<()>;
}

/// Acquisition scopée d'une `FrameSource` : `close()` est appelé exactement une
/// fois, au drop, quel que soit le chemin de sortie.
///
/// # Example
/// ```
/// use vs_core::traits::{FrameSource, SourceGuard};
/// use vs_core::frame::Frame;
/// use vs_core::CoreError;
///
/// struct Counting { closed: u32 }
/// impl FrameSource for Counting {
///     fn open(&mut self) -> Result<(), CoreError> { Ok(()) }
///     fn next_frame(&mut self) -> Result<Option<Frame>, CoreError> { Ok(None) }
///     fn close(&mut self) { self.closed += 1; }
/// }
///
/// let mut source = Counting { closed: 0 };
/// {
///     let mut guard = SourceGuard::new(&mut source);
///     guard.open().unwrap();
/// }
/// assert_eq!(source.closed, 1);
/// ```
pub struct SourceGuard<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: FrameSource + ?Sized> SourceGuard<'a, S> {
    /// Prend la source en charge. La libération est garantie à partir d'ici.
    pub fn new(source: &'a mut S) -> Self {
        Self { source }
    }

    /// See [`FrameSource::open`].
    ///
    /// # Errors
    /// Propagates the source's open error.
    pub fn open(&mut self) -> Result<(), CoreError> {
        self.source.open()
    }

    /// See [`FrameSource::next_frame`].
    ///
    /// # Errors
    /// Propagates the source's read error.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, CoreError> {
        self.source.next_frame()
    }
}

impl<S: FrameSource + ?Sized> Drop for SourceGuard<'_, S> {
    fn drop(&mut self) {
        self.source.close();
        log::debug!("source libérée");
    }
}
