use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use vs_core::config::PlayerConfig;
use vs_core::traits::FrameSource;
use vs_render::terminal::{AnsiTerminal, terminal_size};

pub mod cli;
pub mod playback;

use playback::Playback;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Valider la source
    cli.validate_source()?;

    // 4. Charger la config, puis les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);

    // 5. Ctrl-C lève le drapeau, la boucle le lit entre deux frames
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst))
            .context("Impossible d'installer le handler Ctrl-C")?;
    }

    let (cols, _rows) = terminal_size();
    let mut playback = Playback::from_config(&config, cols, cancel)?;
    let mut source = build_source(&cli)?;

    // 6. Terminal
    let mut terminal = AnsiTerminal::stdout();
    terminal.hide_cursor()?;

    // 7. Boucle principale
    let result = playback.run(source.as_mut(), &mut terminal);

    // 8. Restaurer le terminal (TOUJOURS, même en cas d'erreur)
    if let Err(e) = terminal.restore() {
        log::warn!("Restauration du terminal impossible : {e}");
    }

    let report = result?;
    log::info!(
        "{:?} : {} frames rendues, {} ignorées, {:.1} fps moyens",
        report.state,
        report.frames_rendered,
        report.frames_skipped,
        report.average_fps
    );
    Ok(())
}

/// Resolve config: missing file falls back to defaults.
fn resolve_config(cli: &cli::Cli) -> Result<PlayerConfig> {
    if cli.config.exists() {
        vs_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(PlayerConfig::default())
    }
}

/// Build the frame source selected on the command line.
fn build_source(cli: &cli::Cli) -> Result<Box<dyn FrameSource>> {
    #[cfg(feature = "video")]
    {
        if let Some(ref path) = cli.video {
            return Ok(Box::new(vs_source::video::VideoSource::file(path)));
        }
        if let Some(ref device) = cli.camera {
            let (w, h) = cli.capture_size;
            return Ok(Box::new(vs_source::video::VideoSource::camera(device.as_str(), w, h)));
        }
    }
    #[cfg(feature = "image-source")]
    {
        if let Some(ref path) = cli.image {
            return Ok(Box::new(vs_source::image::ImageSource::new(path)));
        }
    }
    anyhow::bail!("Source non disponible dans ce build (features video / image-source).")
}
