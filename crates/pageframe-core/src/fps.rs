use std::time::Duration;

use instant::Instant;

use crate::constants::FPS_WINDOW_MS;

/// Frames-per-second over a rolling window (1 s by default).
#[derive(Clone, Debug)]
pub struct FpsMeter {
    window: Duration,
    window_start: Option<Instant>,
    frames: u32,
    last_fps: Option<f64>,
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(Duration::from_millis(FPS_WINDOW_MS))
    }
}

impl FpsMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
            frames: 0,
            last_fps: None,
        }
    }

    /// Count one frame. Returns a fresh figure each time a window closes.
    pub fn record_frame(&mut self, now: Instant) -> Option<f64> {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return None;
        };
        self.frames += 1;
        if now < start {
            return None;
        }
        let elapsed = now - start;
        if elapsed < self.window {
            return None;
        }
        let fps = self.frames as f64 / elapsed.as_secs_f64();
        self.last_fps = Some(fps);
        self.window_start = Some(now);
        self.frames = 0;
        Some(fps)
    }

    pub fn last_fps(&self) -> Option<f64> {
        self.last_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_frames_per_second_window() {
        let t0 = Instant::now();
        let mut meter = FpsMeter::default();
        let frame = Duration::from_micros(16_667);
        let mut reported = None;
        for i in 0..=60u32 {
            if let Some(fps) = meter.record_frame(t0 + frame * i) {
                reported = Some(fps);
            }
        }
        let fps = reported.expect("one window closed");
        assert!((fps - 60.0).abs() < 0.01, "fps={fps}");
        assert_eq!(meter.last_fps(), Some(fps));
    }

    #[test]
    fn nothing_reported_inside_first_window() {
        let t0 = Instant::now();
        let mut meter = FpsMeter::default();
        for i in 0..10u32 {
            assert!(meter
                .record_frame(t0 + Duration::from_millis(50) * i)
                .is_none());
        }
        assert!(meter.last_fps().is_none());
    }
}
