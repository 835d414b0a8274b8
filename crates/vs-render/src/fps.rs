use std::collections::VecDeque;
use std::time::Instant;

/// Compteur FPS par fenêtre glissante, plus une moyenne sur toute la session.
/// Zéro allocation après init.
///
/// # Example
/// ```
/// use vs_render::fps::FpsCounter;
/// let mut counter = FpsCounter::new(30);
/// counter.tick();
/// assert_eq!(counter.frames(), 1);
/// assert!(counter.fps() >= 0.0);
/// ```
pub struct FpsCounter {
    /// Timestamps des dernières N frames.
    timestamps: VecDeque<Instant>,
    /// Taille de la fenêtre (nombre de frames à moyenner).
    window: usize,
    /// FPS glissant, mis à jour à chaque tick.
    fps: f64,
    first: Option<Instant>,
    last: Option<Instant>,
    frames: u64,
    /// Temps de la dernière frame en ms (pour debug).
    pub frame_time_ms: f64,
}

impl FpsCounter {
    /// Create a new FPS counter with the given averaging window size.
    #[must_use]
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            timestamps: VecDeque::with_capacity(window + 1),
            window,
            fps: 0.0,
            first: None,
            last: None,
            frames: 0,
            frame_time_ms: 0.0,
        }
    }

    /// Appeler une fois par frame, APRÈS l'écriture sur le terminal.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        if let Some(last) = self.last {
            self.frame_time_ms = now.duration_since(last).as_secs_f64() * 1000.0;
        }
        self.first.get_or_insert(now);
        self.last = Some(now);
        self.frames += 1;

        self.timestamps.push_back(now);
        if self.timestamps.len() > self.window {
            self.timestamps.pop_front();
        }
        if let Some(&oldest) = self.timestamps.front() {
            let secs = now.duration_since(oldest).as_secs_f64();
            if secs > 0.0 {
                self.fps = (self.timestamps.len() - 1) as f64 / secs;
            }
        }
    }

    /// FPS moyen sur la fenêtre.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Nombre total de frames comptées.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// FPS moyen entre la première et la dernière frame. 0 avant deux ticks.
    #[must_use]
    pub fn average_fps(&self) -> f64 {
        match (self.first, self.last) {
            (Some(first), Some(last)) if self.frames >= 2 => {
                let secs = last.duration_since(first).as_secs_f64();
                if secs > 0.0 {
                    (self.frames - 1) as f64 / secs
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn steady_ticks_give_expected_rate() {
        let mut counter = FpsCounter::new(10);
        let start = Instant::now();
        for i in 0..21u32 {
            counter.tick_at(start + Duration::from_millis(u64::from(i) * 50));
        }
        assert!((counter.fps() - 20.0).abs() < 0.01);
        assert!((counter.average_fps() - 20.0).abs() < 0.01);
        assert!((counter.frame_time_ms - 50.0).abs() < 0.01);
        assert_eq!(counter.frames(), 21);
    }

    #[test]
    fn single_tick_has_no_average() {
        let mut counter = FpsCounter::new(10);
        counter.tick();
        assert!(counter.average_fps().abs() < f64::EPSILON);
    }
}
