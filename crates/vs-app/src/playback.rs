use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use vs_ascii::converter::FrameConverter;
use vs_core::config::PlayerConfig;
use vs_core::error::CoreError;
use vs_core::traits::{FrameSource, SourceGuard, TerminalSink};
use vs_render::fps::FpsCounter;

/// État de la session de lecture.
///
/// `Idle → Opening → Playing → (Draining | Cancelled | Exhausted)`.
/// `Draining` (erreur de lecture) se termine en `Exhausted`. `Closed` est
/// l'état final d'une session qui n'a pas pu s'ouvrir ou dont le terminal a
/// échoué.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// Pas encore démarrée.
    Idle,
    /// Acquisition de la source en cours.
    Opening,
    /// Boucle de rendu active.
    Playing,
    /// La source a échoué en cours de flux ; fin propre en cours.
    Draining,
    /// Interrompue par l'utilisateur (Ctrl-C).
    Cancelled,
    /// Source épuisée.
    Exhausted,
    /// Session fermée sur erreur.
    Closed,
}

/// Paramètres résolus d'une session.
#[derive(Clone, Copy, Debug)]
pub struct PlaybackSettings {
    /// Largeur de sortie en colonnes (≥ 1).
    pub output_width: u32,
    /// Intervalle minimal entre deux frames.
    pub frame_delay: Duration,
}

/// Bilan d'une session terminée normalement.
#[derive(Clone, Copy, Debug)]
pub struct PlaybackReport {
    /// `Exhausted` ou `Cancelled`.
    pub state: PlaybackState,
    /// Frames écrites sur le terminal.
    pub frames_rendered: u64,
    /// Frames dégénérées (dimension nulle) ignorées.
    pub frames_skipped: u64,
    /// Débit moyen entre la première et la dernière frame écrite.
    pub average_fps: f64,
}

/// Boucle de lecture : source → conversion → terminal, à débit borné.
pub struct Playback {
    state: PlaybackState,
    history: Vec<PlaybackState>,
    settings: PlaybackSettings,
    converter: FrameConverter,
    cancel: Arc<AtomicBool>,
    fps: FpsCounter,
    frames_rendered: u64,
    frames_skipped: u64,
}

impl Playback {
    /// Create a playback session. `cancel` is polled between frames.
    #[must_use]
    pub fn new(settings: PlaybackSettings, converter: FrameConverter, cancel: Arc<AtomicBool>) -> Self {
        Self {
            state: PlaybackState::Idle,
            history: vec![PlaybackState::Idle],
            settings: PlaybackSettings {
                output_width: settings.output_width.max(1),
                ..settings
            },
            converter,
            cancel,
            fps: FpsCounter::new(30),
            frames_rendered: 0,
            frames_skipped: 0,
        }
    }

    /// Build a session from the player config and the terminal width.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidGlyphRamp` if the configured ramp is empty.
    pub fn from_config(
        config: &PlayerConfig,
        terminal_cols: u16,
        cancel: Arc<AtomicBool>,
    ) -> Result<Self, CoreError> {
        let settings = PlaybackSettings {
            output_width: config.resolve_width(terminal_cols),
            frame_delay: config.frame_delay(),
        };
        let converter = FrameConverter::new(config.ramp()?, config.aspect_correction);
        log::info!(
            "playback: {} colonnes, délai {:?}, rampe {:?}",
            settings.output_width,
            settings.frame_delay,
            config.glyph_ramp
        );
        Ok(Self::new(settings, converter, cancel))
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Every state visited so far, in order.
    #[must_use]
    pub fn history(&self) -> &[PlaybackState] {
        &self.history
    }

    /// Resolved settings.
    #[must_use]
    pub fn settings(&self) -> PlaybackSettings {
        self.settings
    }

    fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.history.clear();
        self.history.push(PlaybackState::Idle);
        self.fps = FpsCounter::new(30);
        self.frames_rendered = 0;
        self.frames_skipped = 0;
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn transition(&mut self, to: PlaybackState) {
        log::debug!("playback: {:?} -> {to:?}", self.state);
        self.state = to;
        self.history.push(to);
    }

    /// Joue `source` sur `sink` jusqu'à épuisement ou annulation.
    ///
    /// La source est libérée exactement une fois, sur tous les chemins de sortie.
    /// Chaque appel démarre une session neuve (compteurs et historique remis à zéro).
    ///
    /// # Errors
    /// - `CoreError::SourceOpen` si la source ne s'ouvre pas (le terminal n'est pas touché).
    /// - `CoreError::Sink` si le terminal échoue.
    /// - `CoreError::Resize` si le redimensionnement échoue.
    pub fn run<S, T>(&mut self, source: &mut S, sink: &mut T) -> Result<PlaybackReport, CoreError>
    where
        S: FrameSource + ?Sized,
        T: TerminalSink + ?Sized,
    {
        self.reset();
        self.transition(PlaybackState::Opening);
        let mut guard = SourceGuard::new(source);
        if let Err(e) = guard.open() {
            drop(guard);
            self.transition(PlaybackState::Closed);
            log::error!("playback: {e}");
            return Err(e);
        }

        self.transition(PlaybackState::Playing);
        let result = self.play(&mut guard, sink);
        drop(guard);

        match result {
            Ok(end) => {
                self.transition(end);
                let report = PlaybackReport {
                    state: end,
                    frames_rendered: self.frames_rendered,
                    frames_skipped: self.frames_skipped,
                    average_fps: self.fps.average_fps(),
                };
                log::info!(
                    "playback terminé ({:?}) : {} frames, {} ignorées, {:.1} fps",
                    report.state,
                    report.frames_rendered,
                    report.frames_skipped,
                    report.average_fps
                );
                Ok(report)
            }
            Err(e) => {
                self.transition(PlaybackState::Closed);
                log::error!("playback: {e}");
                Err(e)
            }
        }
    }

    fn play<S, T>(&mut self, source: &mut SourceGuard<'_, S>, sink: &mut T) -> Result<PlaybackState, CoreError>
    where
        S: FrameSource + ?Sized,
        T: TerminalSink + ?Sized,
    {
        loop {
            // Annulation coopérative, jamais au milieu d'un rendu
            if self.cancelled() {
                return Ok(PlaybackState::Cancelled);
            }

            let started = Instant::now();
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                // ffmpeg tué par le même Ctrl-C : fin de flux, mais annulée
                Ok(None) if self.cancelled() => return Ok(PlaybackState::Cancelled),
                Ok(None) => return Ok(PlaybackState::Exhausted),
                Err(e) if self.cancelled() => {
                    log::debug!("playback: {e} après annulation");
                    return Ok(PlaybackState::Cancelled);
                }
                Err(e) => {
                    log::warn!("playback: {e}, fin du flux");
                    self.transition(PlaybackState::Draining);
                    return Ok(PlaybackState::Exhausted);
                }
            };

            let text = match self.converter.convert(&frame, self.settings.output_width) {
                Ok(text) => text,
                Err(CoreError::DegenerateFrame { width, height }) => {
                    log::warn!("playback: frame {width}x{height} ignorée");
                    self.frames_skipped += 1;
                    pace(self.settings.frame_delay, started);
                    continue;
                }
                Err(e) => return Err(e),
            };

            sink.clear()?;
            sink.write(text)?;
            self.frames_rendered += 1;
            self.fps.tick();

            pace(self.settings.frame_delay, started);
        }
    }
}

/// Attend le reste de l'intervalle minimal. Un cycle lent n'est pas rattrapé.
fn pace(frame_delay: Duration, started: Instant) {
    if let Some(remaining) = frame_delay.checked_sub(started.elapsed()) {
        thread::sleep(remaining);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use vs_core::charset::GlyphRamp;
    use vs_core::frame::Frame;

    struct ScriptedSource {
        frames: Vec<Result<Option<Frame>, CoreError>>,
        fail_open: bool,
        opened: u32,
        closed: u32,
    }

    impl ScriptedSource {
        fn frames(count: usize) -> Self {
            let frames = (0..count)
                .map(|i| Ok(Some(Frame::filled(8, 8, (i as u8 * 40, 10, 10)))))
                .collect();
            Self::scripted(frames)
        }

        fn scripted(frames: Vec<Result<Option<Frame>, CoreError>>) -> Self {
            Self {
                frames,
                fail_open: false,
                opened: 0,
                closed: 0,
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn open(&mut self) -> Result<(), CoreError> {
            self.opened += 1;
            if self.fail_open {
                return Err(CoreError::SourceOpen("pas de vidéo".into()));
            }
            self.frames.reverse();
            Ok(())
        }

        fn next_frame(&mut self) -> Result<Option<Frame>, CoreError> {
            self.frames.pop().unwrap_or(Ok(None))
        }

        fn close(&mut self) {
            self.closed += 1;
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        clears: u32,
        writes: Vec<String>,
        cancel_after: Option<(usize, Arc<AtomicBool>)>,
        fail_write: bool,
    }

    impl TerminalSink for RecordingSink {
        fn clear(&mut self) -> io::Result<()> {
            self.clears += 1;
            Ok(())
        }

        fn write(&mut self, text: &str) -> io::Result<()> {
            if self.fail_write {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal fermé"));
            }
            self.writes.push(text.to_owned());
            if let Some((n, flag)) = &self.cancel_after
                && self.writes.len() >= *n
            {
                flag.store(true, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn playback(cancel: &Arc<AtomicBool>) -> Playback {
        let settings = PlaybackSettings {
            output_width: 4,
            frame_delay: Duration::ZERO,
        };
        Playback::new(
            settings,
            FrameConverter::new(GlyphRamp::default(), 0.55),
            Arc::clone(cancel),
        )
    }

    #[test]
    fn three_frames_then_exhaustion() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut pb = playback(&cancel);
        let mut source = ScriptedSource::frames(3);
        let mut sink = RecordingSink::default();

        let report = pb.run(&mut source, &mut sink).unwrap();

        assert_eq!(sink.clears, 3);
        assert_eq!(sink.writes.len(), 3);
        assert_eq!(report.state, PlaybackState::Exhausted);
        assert_eq!(report.frames_rendered, 3);
        assert_eq!(pb.state(), PlaybackState::Exhausted);
        assert_eq!(source.closed, 1);
        assert_eq!(
            pb.history(),
            &[
                PlaybackState::Idle,
                PlaybackState::Opening,
                PlaybackState::Playing,
                PlaybackState::Exhausted
            ]
        );
    }

    #[test]
    fn open_failure_never_plays_nor_touches_the_terminal() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut pb = playback(&cancel);
        let mut source = ScriptedSource::frames(3);
        source.fail_open = true;
        let mut sink = RecordingSink::default();

        let err = pb.run(&mut source, &mut sink).unwrap_err();

        assert!(matches!(err, CoreError::SourceOpen(_)));
        assert_eq!(sink.clears, 0);
        assert!(sink.writes.is_empty());
        assert_eq!(pb.state(), PlaybackState::Closed);
        assert!(!pb.history().contains(&PlaybackState::Playing));
        assert_eq!(source.closed, 1);
    }

    #[test]
    fn interrupt_after_first_frame_cancels() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut pb = playback(&cancel);
        let mut source = ScriptedSource::frames(5);
        let mut sink = RecordingSink {
            cancel_after: Some((1, Arc::clone(&cancel))),
            ..RecordingSink::default()
        };

        let report = pb.run(&mut source, &mut sink).unwrap();

        assert_eq!(sink.clears, 1);
        assert_eq!(sink.writes.len(), 1);
        assert_eq!(report.state, PlaybackState::Cancelled);
        assert_eq!(pb.state(), PlaybackState::Cancelled);
        assert_eq!(source.opened, 1);
        assert_eq!(source.closed, 1);
    }

    #[test]
    fn read_error_drains_and_ends_as_exhausted() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut pb = playback(&cancel);
        let mut source = ScriptedSource::scripted(vec![
            Ok(Some(Frame::filled(8, 8, (1, 2, 3)))),
            Err(CoreError::SourceRead("paquet corrompu".into())),
            Ok(Some(Frame::filled(8, 8, (1, 2, 3)))),
        ]);
        let mut sink = RecordingSink::default();

        let report = pb.run(&mut source, &mut sink).unwrap();

        assert_eq!(report.state, PlaybackState::Exhausted);
        assert_eq!(sink.writes.len(), 1);
        assert!(pb.history().contains(&PlaybackState::Draining));
        assert_eq!(source.closed, 1);
    }

    #[test]
    fn degenerate_frame_is_skipped() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut pb = playback(&cancel);
        let empty = Frame::from_rgb(0, 0, Vec::new()).unwrap();
        let mut source = ScriptedSource::scripted(vec![
            Ok(Some(Frame::filled(8, 8, (9, 9, 9)))),
            Ok(Some(empty)),
            Ok(Some(Frame::filled(8, 8, (9, 9, 9)))),
        ]);
        let mut sink = RecordingSink::default();

        let report = pb.run(&mut source, &mut sink).unwrap();

        assert_eq!(report.frames_rendered, 2);
        assert_eq!(report.frames_skipped, 1);
        assert_eq!(sink.writes.len(), 2);
    }

    #[test]
    fn sink_failure_aborts_and_still_releases_source() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut pb = playback(&cancel);
        let mut source = ScriptedSource::frames(3);
        let mut sink = RecordingSink {
            fail_write: true,
            ..RecordingSink::default()
        };

        let err = pb.run(&mut source, &mut sink).unwrap_err();

        assert!(matches!(err, CoreError::Sink(_)));
        assert_eq!(pb.state(), PlaybackState::Closed);
        assert_eq!(source.closed, 1);
    }

    #[test]
    fn written_frames_have_one_line_per_sampled_row() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut pb = playback(&cancel);
        let mut source = ScriptedSource::frames(1);
        let mut sink = RecordingSink::default();

        pb.run(&mut source, &mut sink).unwrap();

        // 8x8 sur 4 colonnes : round(4 * 1.0 * 0.55) = 2 lignes
        assert_eq!(sink.writes[0].lines().count(), 2);
    }

    #[test]
    fn frame_delay_bounds_the_rate() {
        let cancel = Arc::new(AtomicBool::new(false));
        let settings = PlaybackSettings {
            output_width: 4,
            frame_delay: Duration::from_millis(20),
        };
        let mut pb = Playback::new(
            settings,
            FrameConverter::new(GlyphRamp::default(), 0.55),
            Arc::clone(&cancel),
        );
        let mut source = ScriptedSource::frames(3);
        let mut sink = RecordingSink::default();

        let start = Instant::now();
        pb.run(&mut source, &mut sink).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(55));
    }

    /// Source dont le flux s'arrête avec le Ctrl-C (ffmpeg tué par le même signal).
    struct InterruptedSource {
        cancel: Arc<AtomicBool>,
        fail_read: bool,
        reads: u32,
        closed: u32,
    }

    impl FrameSource for InterruptedSource {
        fn open(&mut self) -> Result<(), CoreError> {
            Ok(())
        }

        fn next_frame(&mut self) -> Result<Option<Frame>, CoreError> {
            self.reads += 1;
            if self.reads == 1 {
                return Ok(Some(Frame::filled(8, 8, (50, 50, 50))));
            }
            self.cancel.store(true, Ordering::SeqCst);
            if self.fail_read {
                Err(CoreError::SourceRead("Broken pipe".into()))
            } else {
                Ok(None)
            }
        }

        fn close(&mut self) {
            self.closed += 1;
        }
    }

    #[test]
    fn end_of_stream_caused_by_interrupt_is_cancelled() {
        for fail_read in [false, true] {
            let cancel = Arc::new(AtomicBool::new(false));
            let mut pb = playback(&cancel);
            let mut source = InterruptedSource {
                cancel: Arc::clone(&cancel),
                fail_read,
                reads: 0,
                closed: 0,
            };
            let mut sink = RecordingSink::default();

            let report = pb.run(&mut source, &mut sink).unwrap();

            assert_eq!(report.state, PlaybackState::Cancelled, "fail_read = {fail_read}");
            assert!(!pb.history().contains(&PlaybackState::Exhausted));
            assert!(!pb.history().contains(&PlaybackState::Draining));
            assert_eq!(sink.writes.len(), 1);
            assert_eq!(source.closed, 1);
        }
    }

    #[test]
    fn degenerate_frames_are_paced_too() {
        let cancel = Arc::new(AtomicBool::new(false));
        let settings = PlaybackSettings {
            output_width: 4,
            frame_delay: Duration::from_millis(20),
        };
        let mut pb = Playback::new(
            settings,
            FrameConverter::new(GlyphRamp::default(), 0.55),
            Arc::clone(&cancel),
        );
        let frames = (0..3)
            .map(|_| Ok(Some(Frame::from_rgb(0, 0, Vec::new()).unwrap())))
            .collect();
        let mut source = ScriptedSource::scripted(frames);
        let mut sink = RecordingSink::default();

        let start = Instant::now();
        let report = pb.run(&mut source, &mut sink).unwrap();

        assert_eq!(report.frames_skipped, 3);
        assert!(sink.writes.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(55));
    }

    #[test]
    fn each_run_starts_a_fresh_session() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut pb = playback(&cancel);
        let mut sink = RecordingSink::default();

        let first = pb.run(&mut ScriptedSource::frames(3), &mut sink).unwrap();
        assert_eq!(first.frames_rendered, 3);

        let second = pb.run(&mut ScriptedSource::frames(2), &mut sink).unwrap();
        assert_eq!(second.frames_rendered, 2);
        assert_eq!(second.frames_skipped, 0);
        assert_eq!(
            pb.history(),
            &[
                PlaybackState::Idle,
                PlaybackState::Opening,
                PlaybackState::Playing,
                PlaybackState::Exhausted
            ]
        );
    }

    #[test]
    fn from_config_resolves_width_from_terminal() {
        let cancel = Arc::new(AtomicBool::new(false));
        let config = PlayerConfig::default();
        let pb = Playback::from_config(&config, 200, cancel).unwrap();
        assert_eq!(pb.settings().output_width, 80);
        assert_eq!(pb.settings().frame_delay, Duration::from_millis(10));
    }

    #[test]
    fn from_config_rejects_empty_ramp() {
        let cancel = Arc::new(AtomicBool::new(false));
        let config = PlayerConfig {
            glyph_ramp: String::new(),
            ..PlayerConfig::default()
        };
        assert!(matches!(
            Playback::from_config(&config, 80, cancel),
            Err(CoreError::InvalidGlyphRamp(_))
        ));
    }
}
