use std::io::{self, BufWriter, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::ResetColor;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{execute, queue};
use vs_core::traits::TerminalSink;

/// Taille de repli quand le terminal ne répond pas (pipe, CI).
pub const FALLBACK_SIZE: (u16, u16) = (80, 20);

/// Colonnes × lignes du terminal courant, ou [`FALLBACK_SIZE`].
#[must_use]
pub fn terminal_size() -> (u16, u16) {
    match crossterm::terminal::size() {
        Ok((cols, rows)) if cols > 0 && rows > 0 => (cols, rows),
        _ => {
            log::debug!("taille terminal inconnue, repli sur {FALLBACK_SIZE:?}");
            FALLBACK_SIZE
        }
    }
}

/// Terminal ANSI truecolor : efface par `ESC[2J` + curseur en (0,0), écrit le
/// texte rendu tel quel puis flush.
///
/// Le clear est mis en file et part avec la frame suivante : un seul flush par frame.
///
/// # Example
/// ```
/// use vs_core::traits::TerminalSink;
/// use vs_render::terminal::AnsiTerminal;
///
/// let mut term = AnsiTerminal::new(Vec::new());
/// term.clear().unwrap();
/// term.write("@\n").unwrap();
/// assert!(term.get_ref().ends_with(b"@\n"));
/// ```
pub struct AnsiTerminal<W: Write> {
    out: W,
}

impl AnsiTerminal<BufWriter<Stdout>> {
    /// Terminal sur stdout, bufferisé.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(BufWriter::with_capacity(1 << 16, io::stdout()))
    }
}

impl<W: Write> AnsiTerminal<W> {
    /// Wrap any writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Masque le curseur pendant la lecture.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    pub fn hide_cursor(&mut self) -> io::Result<()> {
        execute!(self.out, Hide)
    }

    /// Restaure couleurs et curseur. À appeler sur TOUS les chemins de sortie.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    pub fn restore(&mut self) -> io::Result<()> {
        execute!(self.out, ResetColor, Show)
    }
}

impl<W: Write> TerminalSink for AnsiTerminal<W> {
    fn clear(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }
}
