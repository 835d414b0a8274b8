use std::path::PathBuf;

use clap::Parser;
use vs_core::config::PlayerConfig;

/// vidscii : lecteur vidéo ASCII truecolor pour le terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source visuelle : chemin vers une vidéo (décodée par ffmpeg).
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Source visuelle : périphérique de capture ("/dev/video0", "0", ...).
    #[arg(long)]
    pub camera: Option<String>,

    /// Source visuelle : chemin vers une image (PNG, JPEG, BMP, GIF).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Largeur de sortie fixe en colonnes (sinon largeur du terminal plafonnée).
    #[arg(long)]
    pub width: Option<u32>,

    /// Intervalle minimal entre deux frames, en millisecondes.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Rampe de glyphes, du plus clair au plus dense.
    #[arg(long)]
    pub ramp: Option<String>,

    /// Résolution de capture caméra, ex. 640x480.
    #[arg(long, default_value = "640x480", value_parser = parse_capture_size)]
    pub capture_size: (u32, u32),

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Validate that exactly one visual source is provided.
    ///
    /// # Errors
    /// Returns an error if zero or more than one source is specified.
    pub fn validate_source(&self) -> anyhow::Result<()> {
        let count = usize::from(self.video.is_some())
            + usize::from(self.camera.is_some())
            + usize::from(self.image.is_some());

        if count == 0 {
            anyhow::bail!("Aucune source visuelle spécifiée. Utilisez --video, --camera ou --image.");
        }
        if count > 1 {
            anyhow::bail!("Une seule source visuelle à la fois. Spécifiez --video, --camera OU --image.");
        }
        Ok(())
    }

    /// Apply command-line overrides on top of the loaded config, then re-clamp.
    pub fn apply_overrides(&self, config: &mut PlayerConfig) {
        if let Some(width) = self.width {
            config.output_width = Some(width);
        }
        if let Some(delay) = self.delay_ms {
            config.frame_delay_ms = delay;
        }
        if let Some(ref ramp) = self.ramp {
            config.glyph_ramp.clone_from(ramp);
        }
        config.clamp_all();
    }
}

/// Parse `WIDTHxHEIGHT`.
fn parse_capture_size(text: &str) -> Result<(u32, u32), String> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("format attendu LARGEURxHAUTEUR, reçu '{text}'"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("largeur invalide '{w}': {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("hauteur invalide '{h}': {e}"))?;
    if w == 0 || h == 0 {
        return Err(format!("résolution nulle : {w}x{h}"));
    }
    Ok((w, h))
}
