use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{GlyphRamp, RAMP_DEFAULT};
use crate::error::CoreError;

/// Largeur de sortie maximale par défaut (colonnes), au-delà le rendu ralentit.
pub const DEFAULT_MAX_WIDTH: u32 = 80;

/// Correction d'aspect par défaut : une cellule terminal est plus haute que large.
pub const DEFAULT_ASPECT_CORRECTION: f32 = 0.55;

/// Délai minimal par défaut entre deux frames, en millisecondes.
pub const DEFAULT_FRAME_DELAY_MS: u64 = 10;

/// Configuration complète du lecteur.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use vs_core::config::PlayerConfig;
/// let config = PlayerConfig::default();
/// assert_eq!(config.max_width, 80);
/// assert_eq!(config.glyph_ramp, ".,:;+*?%S#@");
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PlayerConfig {
    // === Rendu ===
    /// Largeur fixe en colonnes. `None` = colonnes du terminal, plafonnées par `max_width`.
    pub output_width: Option<u32>,
    /// Plafond de largeur quand `output_width` est absent.
    pub max_width: u32,
    /// Rampe de glyphes, du plus clair au plus dense.
    pub glyph_ramp: String,
    /// Facteur de hauteur appliqué au ratio de la frame (cellules plus hautes que larges).
    pub aspect_correction: f32,

    // === Lecture ===
    /// Intervalle minimal entre deux frames, en millisecondes.
    pub frame_delay_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            output_width: None,
            max_width: DEFAULT_MAX_WIDTH,
            glyph_ramp: RAMP_DEFAULT.to_string(),
            aspect_correction: DEFAULT_ASPECT_CORRECTION,
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
        }
    }
}

impl PlayerConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.max_width = self.max_width.clamp(1, 1000);
        self.output_width = self.output_width.map(|w| w.clamp(1, 1000));
        if !self.aspect_correction.is_finite() {
            self.aspect_correction = DEFAULT_ASPECT_CORRECTION;
        }
        self.aspect_correction = self.aspect_correction.clamp(0.1, 2.0);
        self.frame_delay_ms = self.frame_delay_ms.min(10_000);
        if self.glyph_ramp.is_empty() {
            log::warn!("glyph_ramp vide, utilisation de la rampe par défaut.");
            self.glyph_ramp = RAMP_DEFAULT.to_string();
        }
    }

    /// Largeur de sortie effective pour un terminal de `terminal_cols` colonnes.
    ///
    /// # Example
    /// ```
    /// use vs_core::config::PlayerConfig;
    /// let mut config = PlayerConfig::default();
    /// assert_eq!(config.resolve_width(200), 80);
    /// assert_eq!(config.resolve_width(60), 60);
    /// config.output_width = Some(120);
    /// assert_eq!(config.resolve_width(60), 120);
    /// ```
    #[must_use]
    pub fn resolve_width(&self, terminal_cols: u16) -> u32 {
        self.output_width
            .unwrap_or_else(|| u32::from(terminal_cols).min(self.max_width))
            .max(1)
    }

    /// Intervalle minimal entre deux frames.
    #[must_use]
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    /// Construit la rampe de glyphes configurée.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidGlyphRamp` if the ramp string is empty.
    pub fn ramp(&self) -> Result<GlyphRamp, CoreError> {
        GlyphRamp::new(&self.glyph_ramp)
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
    playback: Option<PlaybackSection>,
}

/// Render section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    output_width: Option<u32>,
    max_width: Option<u32>,
    glyph_ramp: Option<String>,
    aspect_correction: Option<f32>,
}

/// Playback section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct PlaybackSection {
    frame_delay_ms: Option<u64>,
}

/// Parse une config TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the TOML is malformed.
///
/// # Example
/// ```
/// use vs_core::config::parse_config;
/// let config = parse_config("[playback]\nframe_delay_ms = 40\n").unwrap();
/// assert_eq!(config.frame_delay_ms, 40);
/// assert_eq!(config.max_width, 80);
/// ```
pub fn parse_config(content: &str) -> Result<PlayerConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = PlayerConfig::default();

    if let Some(r) = file.render {
        if let Some(v) = r.output_width {
            config.output_width = Some(v);
        }
        if let Some(v) = r.max_width {
            config.max_width = v;
        }
        if let Some(v) = r.glyph_ramp {
            config.glyph_ramp = v;
        }
        if let Some(v) = r.aspect_correction {
            config.aspect_correction = v;
        }
    }

    if let Some(p) = file.playback
        && let Some(v) = p.frame_delay_ms
    {
        config.frame_delay_ms = v;
    }

    config.clamp_all();
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use vs_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<PlayerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn partial_render_section_overrides_only_given_fields() {
        let config = parse_config(
            r##"
[render]
max_width = 120
glyph_ramp = " .:#@"
"##,
        )
        .unwrap();
        assert_eq!(config.max_width, 120);
        assert_eq!(config.glyph_ramp, " .:#@");
        assert!((config.aspect_correction - 0.55).abs() < f32::EPSILON);
        assert_eq!(config.frame_delay_ms, DEFAULT_FRAME_DELAY_MS);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = parse_config(
            r#"
[render]
output_width = 0
max_width = 0
aspect_correction = 9.0
glyph_ramp = ""

[playback]
frame_delay_ms = 999999
"#,
        )
        .unwrap();
        assert_eq!(config.output_width, Some(1));
        assert_eq!(config.max_width, 1);
        assert!((config.aspect_correction - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.glyph_ramp, RAMP_DEFAULT);
        assert_eq!(config.frame_delay_ms, 10_000);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(parse_config("[render\nmax_width = ").is_err());
    }

    #[test]
    fn resolve_width_never_returns_zero() {
        let config = PlayerConfig::default();
        assert_eq!(config.resolve_width(0), 1);
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[playback]\nframe_delay_ms = 33").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.frame_delay(), Duration::from_millis(33));
    }

    #[test]
    fn load_config_missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/vidscii.toml")).is_err());
    }
}
