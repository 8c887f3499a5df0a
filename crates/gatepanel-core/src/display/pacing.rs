//! Frame pacing and FPS measurement.

use std::time::{Duration, Instant};

/// Sleep that keeps a loop at `target_fps` after a cycle took `elapsed`.
///
/// The frame period is scaled by `safety_factor` so the loop wakes slightly
/// early rather than overslept. `None` when the cycle already used the
/// budget.
pub fn pacing_sleep(target_fps: u32, safety_factor: f32, elapsed: Duration) -> Option<Duration> {
    let period = Duration::from_secs_f32(1.0 / target_fps.max(1) as f32);
    let budget = period.mul_f32(safety_factor.clamp(0.0, 1.0));
    budget.checked_sub(elapsed).filter(|d| !d.is_zero())
}

/// Frames counted over a sliding one-second window.
#[derive(Debug)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: 0,
        }
    }

    /// Count one pushed frame.
    pub fn frame(&mut self, now: Instant) {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= Duration::from_secs(1) {
            self.fps = (self.frames as f32 / elapsed.as_secs_f32()).round() as u32;
            self.frames = 0;
            self.window_start = now;
        }
    }

    /// Rate measured over the last complete window.
    pub fn fps(&self) -> u32 {
        self.fps
    }
}
