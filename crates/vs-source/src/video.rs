// Ce module utilise ffmpeg via subprocess (std::process::Command), pas de lib C liée.
// Prérequis : `ffmpeg` (et `ffprobe` pour les fichiers) accessibles dans PATH.
//
// Architecture :
//   - `probe_video`       : interroge ffprobe pour obtenir width/height/fps
//   - `decode_size`       : plafonne la taille décodée (bande passante du pipe)
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGB24 sur stdout
//   - `read_first_frame`  : la première frame décide si l'ouverture a réussi
//   - `VideoSource`       : `FrameSource` synchrone, une frame lue par appel

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use vs_core::error::CoreError;
use vs_core::frame::{Frame, RGB_CHANNELS};
use vs_core::traits::FrameSource;

/// Largeur décodée maximale. Le sampler réduit ensuite à ~80 colonnes :
/// 640×360@30fps ≈ 21 MB/s dans le pipe, contre ~180 MB/s en 1080p.
pub const MAX_DECODE_WIDTH: u32 = 640;

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
}

/// Ce que ffmpeg doit ouvrir.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureInput {
    /// Fichier vidéo local.
    File(PathBuf),
    /// Périphérique de capture (ex: `/dev/video0`, `0`, `video=Integrated Camera`).
    Camera {
        device: String,
        width: u32,
        height: u32,
    },
}

/// Parse la sortie `default=noprint_wrappers=1` de ffprobe.
///
/// # Errors
/// Retourne une erreur si aucune dimension non nulle n'est trouvée.
///
/// # Example
/// ```
/// use vs_source::video::parse_probe_output;
/// let info = parse_probe_output("width=1280\nheight=720\nr_frame_rate=30000/1001\n").unwrap();
/// assert_eq!((info.width, info.height), (1280, 720));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// ```
pub fn parse_probe_output(text: &str) -> Result<VideoInfo> {
    let mut width: u32 = 0;
    let mut height: u32 = 0;
    let mut fps: f64 = 30.0;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().unwrap_or(0);
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        }
    }

    if width == 0 || height == 0 {
        anyhow::bail!("aucun flux vidéo décodable ({width}x{height})");
    }
    Ok(VideoInfo { width, height, fps })
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context(
            "Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.",
        )?;

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("ffprobe : {}", path.display()))?;

    log::info!(
        "probe_video: {}x{} @ {:.3}fps, {}",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Taille décodée : largeur plafonnée à `max_width`, ratio conservé, dimensions paires.
///
/// # Example
/// ```
/// use vs_source::video::decode_size;
/// assert_eq!(decode_size(1920, 1080, 640), (640, 360));
/// assert_eq!(decode_size(320, 240, 640), (320, 240));
/// ```
#[must_use]
pub fn decode_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let h = (u64::from(height) * u64::from(max_width) / u64::from(width.max(1))) as u32;
    // yuv → rgb : ffmpeg préfère des dimensions paires
    let h = (h & !1).max(2);
    (max_width & !1, h)
}

/// Arguments ffmpeg d'entrée selon la plateforme pour une caméra.
fn camera_input_args(device: &str, width: u32, height: u32) -> Vec<String> {
    let format = if cfg!(target_os = "linux") {
        "v4l2"
    } else if cfg!(target_os = "macos") {
        "avfoundation"
    } else {
        "dshow"
    };
    vec![
        "-f".into(),
        format.into(),
        "-video_size".into(),
        format!("{width}x{height}"),
        "-i".into(),
        device.into(),
    ]
}

/// Lance un processus `ffmpeg` qui écrit des frames RGB24 brutes sur stdout.
///
/// Chaque frame = `w × h × 3` bytes (RGB row-major, sans padding).
/// `-an` supprime l'audio, hors périmètre. Sous unix, ffmpeg tourne dans son
/// propre groupe de processus : Ctrl-C n'atteint que le lecteur, qui l'arrête.
///
/// # Errors
/// Retourne une erreur si le spawn échoue.
pub fn spawn_ffmpeg_pipe(program: &Path, input: &CaptureInput, w: u32, h: u32) -> Result<Child> {
    let mut args: Vec<String> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];
    match input {
        CaptureInput::File(path) => {
            let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;
            args.extend(["-i".into(), path_str.into()]);
        }
        CaptureInput::Camera {
            device,
            width,
            height,
        } => args.extend(camera_input_args(device, *width, *height)),
    }
    args.extend([
        "-vf".into(),
        format!("scale={w}:{h}:flags=area"),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-an".into(),
        "pipe:1".into(),
    ]);

    let mut cmd = Command::new(program);
    cmd.args(&args)
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    let child = cmd
        .spawn()
        .with_context(|| {
            format!(
                "Impossible de lancer {}. Vérifiez qu'il est installé et dans le PATH.",
                program.display()
            )
        })?;
    log::debug!("ffmpeg spawné: {w}x{h} ({input:?})");
    Ok(child)
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion
/// (une frame partielle en fin de flux est ignorée).
///
/// # Errors
/// `Err` sur erreur I/O fatale.
///
/// # Example
/// ```
/// use vs_source::video::read_exact_or_eof;
/// let mut reader: &[u8] = &[1, 2, 3, 4, 5];
/// let mut buf = [0u8; 3];
/// assert!(read_exact_or_eof(&mut reader, &mut buf).unwrap());
/// assert!(!read_exact_or_eof(&mut reader, &mut buf).unwrap());
/// ```
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Lit la première frame du flux. Un flux vide (ffmpeg sorti sans rien
/// produire : périphérique absent, fichier illisible) est une erreur.
///
/// # Errors
/// Retourne une erreur sur EOF avant une frame complète ou sur erreur I/O.
///
/// # Example
/// ```
/// use vs_source::video::read_first_frame;
/// let mut ok: &[u8] = &[9; 12];
/// assert_eq!(read_first_frame(&mut ok, 2, 2).unwrap().pixel(1, 1), (9, 9, 9));
/// let mut empty: &[u8] = &[];
/// assert!(read_first_frame(&mut empty, 2, 2).is_err());
/// ```
pub fn read_first_frame<R: Read>(reader: &mut R, w: u32, h: u32) -> Result<Frame> {
    let mut data = vec![0u8; w as usize * h as usize * RGB_CHANNELS];
    let complete = read_exact_or_eof(reader, &mut data).context("lecture de la première frame")?;
    if !complete {
        anyhow::bail!("aucune frame reçue de ffmpeg");
    }
    Ok(Frame::from_rgb(w, h, data)?)
}

/// Source vidéo (fichier ou caméra) décodée par un sous-processus ffmpeg.
///
/// # Example
/// ```no_run
/// use vs_core::traits::FrameSource;
/// use vs_source::video::VideoSource;
///
/// let mut source = VideoSource::file("clip.mp4");
/// source.open().unwrap();
/// while let Ok(Some(frame)) = source.next_frame() {
///     println!("{}x{}", frame.width(), frame.height());
/// }
/// source.close();
/// ```
pub struct VideoSource {
    input: CaptureInput,
    ffmpeg: PathBuf,
    max_decode_width: u32,
    child: Option<Child>,
    /// Première frame, lue pendant `open()`.
    pending: Option<Frame>,
    size: (u32, u32),
    info: Option<VideoInfo>,
}

impl VideoSource {
    /// Source sur un fichier vidéo local.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(CaptureInput::File(path.into()))
    }

    /// Source sur un périphérique de capture à la résolution donnée.
    pub fn camera(device: impl Into<String>, width: u32, height: u32) -> Self {
        Self::new(CaptureInput::Camera {
            device: device.into(),
            width,
            height,
        })
    }

    fn new(input: CaptureInput) -> Self {
        Self {
            input,
            ffmpeg: PathBuf::from("ffmpeg"),
            max_decode_width: MAX_DECODE_WIDTH,
            child: None,
            pending: None,
            size: (0, 0),
            info: None,
        }
    }

    /// Change le plafond de largeur décodée.
    #[must_use]
    pub fn with_max_decode_width(mut self, max_width: u32) -> Self {
        self.max_decode_width = max_width.max(2);
        self
    }

    /// Binaire ffmpeg à utiliser (défaut : `ffmpeg` dans le PATH).
    #[must_use]
    pub fn with_ffmpeg(mut self, program: impl Into<PathBuf>) -> Self {
        self.ffmpeg = program.into();
        self
    }

    /// Métadonnées du flux (fichiers uniquement, après `open`).
    #[must_use]
    pub fn info(&self) -> Option<VideoInfo> {
        self.info
    }

    /// Dimensions des frames produites (après `open`).
    #[must_use]
    pub fn frame_size(&self) -> (u32, u32) {
        self.size
    }

    fn start(&mut self) -> Result<()> {
        let (native_w, native_h) = match &self.input {
            CaptureInput::File(path) => {
                let info = probe_video(path)?;
                self.info = Some(info);
                (info.width, info.height)
            }
            CaptureInput::Camera { width, height, .. } => {
                if *width == 0 || *height == 0 {
                    anyhow::bail!("taille de capture invalide : {width}x{height}");
                }
                (*width, *height)
            }
        };
        let (w, h) = decode_size(native_w, native_h, self.max_decode_width);
        let mut child = spawn_ffmpeg_pipe(&self.ffmpeg, &self.input, w, h)?;
        let first = match child.stdout.as_mut() {
            Some(stdout) => read_first_frame(stdout, w, h),
            None => Err(anyhow::anyhow!("stdout ffmpeg indisponible")),
        };
        match first {
            Ok(frame) => {
                self.pending = Some(frame);
                self.child = Some(child);
                self.size = (w, h);
                Ok(())
            }
            Err(e) => {
                let status = reap(&mut child);
                Err(e.context(format!("ffmpeg n'a produit aucune frame ({status})")))
            }
        }
    }
}

impl FrameSource for VideoSource {
    fn open(&mut self) -> Result<(), CoreError> {
        self.start()
            .map_err(|e| CoreError::SourceOpen(format!("{e:#}")))
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CoreError> {
        if let Some(frame) = self.pending.take() {
            return Ok(Some(frame));
        }
        let (w, h) = self.size;
        let Some(stdout) = self.child.as_mut().and_then(|c| c.stdout.as_mut()) else {
            return Ok(None);
        };

        let mut data = vec![0u8; w as usize * h as usize * RGB_CHANNELS];
        match read_exact_or_eof(stdout, &mut data) {
            Ok(true) => Frame::from_rgb(w, h, data).map(Some),
            Ok(false) => {
                log::info!("VideoSource: EOF, fin du flux.");
                Ok(None)
            }
            Err(e) => Err(CoreError::SourceRead(e.to_string())),
        }
    }

    fn close(&mut self) {
        self.pending = None;
        if let Some(mut c) = self.child.take() {
            reap(&mut c);
            log::info!("VideoSource: ffmpeg arrêté proprement.");
        }
    }
}

/// Arrête le processus s'il tourne encore et retourne son statut de sortie.
fn reap(child: &mut Child) -> String {
    if let Ok(Some(status)) = child.try_wait() {
        return status.to_string();
    }
    let _ = child.kill();
    child
        .wait()
        .map_or_else(|e| e.to_string(), |status| status.to_string())
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.close();
    }
}
