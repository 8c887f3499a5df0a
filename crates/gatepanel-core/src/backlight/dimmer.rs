//! Dimmer state evaluation.

use core::fmt;
use std::time::{Duration, Instant};

use log::info;

use super::activity::{ActivityTracker, PanelState};
use super::writer::Backlight;
use crate::config::{DimmerConfig, DisplayConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DimmerState {
    Active = 0,
    FadeIn = 1,
    FadeOut = 2,
    Idle = 3,
    Off = 4,
}

impl DimmerState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => DimmerState::Active,
            1 => DimmerState::FadeIn,
            2 => DimmerState::FadeOut,
            3 => DimmerState::Idle,
            _ => DimmerState::Off,
        }
    }

    /// States in which the panel is dark or going dark.
    pub fn is_dimmed(self) -> bool {
        matches!(
            self,
            DimmerState::FadeOut | DimmerState::Idle | DimmerState::Off
        )
    }
}

impl fmt::Display for DimmerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DimmerState::Active => "ACTIVE",
            DimmerState::FadeIn => "FADE_IN",
            DimmerState::FadeOut => "FADE_OUT",
            DimmerState::Idle => "IDLE",
            DimmerState::Off => "OFF",
        })
    }
}

/// Result of one evaluation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: DimmerState,
    /// Logical brightness, `0..=100`
    pub brightness: u8,
    pub fps: u32,
}

/// Brightness state machine.
///
/// | state    | entered when                              | brightness                 |
/// |----------|-------------------------------------------|----------------------------|
/// | OFF      | running signal cleared                    | entry level → floor        |
/// | FADE_IN  | `idle < fade_in` and screen not on        | entry level → max          |
/// | ACTIVE   | `idle < idle_timeout`                     | max                        |
/// | FADE_OUT | `idle < idle_timeout + fade_out`          | max → 0                    |
/// | IDLE     | otherwise                                 | 0                          |
pub struct Dimmer {
    idle_timeout: Duration,
    fade_in: Duration,
    fade_out: Duration,
    off_timeout: Duration,
    max: u8,
    floor: u8,
    active_fps: u32,
    idle_fps: u32,

    state: DimmerState,
    brightness: u8,
    /// Panel is considered lit; cleared by motion and by going dark
    screen_on: bool,
    fade_in_from: u8,
    off_entry: Option<(Instant, u8)>,
}

impl Dimmer {
    pub fn new(config: &DimmerConfig, display: &DisplayConfig) -> Self {
        Self {
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            fade_in: Duration::from_millis(config.fade_in_ms),
            fade_out: Duration::from_millis(config.fade_out_ms),
            off_timeout: Duration::from_millis(config.off_timeout_ms),
            max: config.max_brightness.min(super::MAX_LEVEL),
            floor: config.floor_brightness.min(super::MAX_LEVEL),
            active_fps: display.active_fps,
            idle_fps: display.idle_fps,
            state: DimmerState::Idle,
            brightness: 0,
            screen_on: false,
            fade_in_from: 0,
            off_entry: None,
        }
    }

    pub fn state(&self) -> DimmerState {
        self.state
    }

    /// Evaluate one tick.
    ///
    /// `motion` is a motion event consumed since the previous tick.
    pub fn evaluate(&mut self, idle: Duration, running: bool, motion: bool, now: Instant) -> Decision {
        if motion {
            self.screen_on = false;
        }

        let next = if !running {
            DimmerState::Off
        } else if idle < self.fade_in && !self.screen_on {
            DimmerState::FadeIn
        } else if idle < self.idle_timeout {
            DimmerState::Active
        } else if idle < self.idle_timeout + self.fade_out {
            DimmerState::FadeOut
        } else {
            DimmerState::Idle
        };

        if next != self.state {
            info!("Dimmer {} -> {}", self.state, next);
            match next {
                DimmerState::FadeIn => self.fade_in_from = self.brightness,
                DimmerState::Off => self.off_entry = Some((now, self.brightness)),
                _ => {}
            }
            if self.state == DimmerState::Off {
                self.off_entry = None;
            }
            self.state = next;
        }

        self.brightness = match next {
            DimmerState::Off => {
                let (entered, from) = self.off_entry.unwrap_or((now, self.brightness));
                ramp(from, self.floor, now.saturating_duration_since(entered), self.off_timeout)
            }
            DimmerState::FadeIn => ramp(self.fade_in_from, self.max, idle, self.fade_in),
            DimmerState::Active => self.max,
            DimmerState::FadeOut => ramp(
                self.max,
                0,
                idle.saturating_sub(self.idle_timeout),
                self.fade_out,
            ),
            DimmerState::Idle => 0,
        };

        match next {
            DimmerState::Active => self.screen_on = true,
            DimmerState::Idle | DimmerState::Off => self.screen_on = false,
            _ => {}
        }

        Decision {
            state: next,
            brightness: self.brightness,
            fps: if next.is_dimmed() {
                self.idle_fps
            } else {
                self.active_fps
            },
        }
    }

    /// Read the shared inputs, evaluate, and publish the result.
    pub fn tick(
        &mut self,
        tracker: &ActivityTracker,
        panel: &PanelState,
        backlight: &Backlight,
        now: Instant,
    ) -> Decision {
        let decision = self.evaluate(
            tracker.idle(now),
            panel.is_running(),
            tracker.take_motion(),
            now,
        );
        backlight.set_backlight(i32::from(decision.brightness));
        panel.set_dimmer_state(decision.state);
        panel.set_target_fps(decision.fps);
        decision
    }
}

/// Linear ramp from `from` to `to` after `elapsed` of `total`.
fn ramp(from: u8, to: u8, elapsed: Duration, total: Duration) -> u8 {
    if total.is_zero() || elapsed >= total {
        return to;
    }
    let t = elapsed.as_secs_f32() / total.as_secs_f32();
    let value = f32::from(from) + (f32::from(to) - f32::from(from)) * t;
    value.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn dimmer() -> Dimmer {
        let config = DimmerConfig {
            tick_ms: 25,
            idle_timeout_secs: 10,
            fade_in_ms: 400,
            fade_out_ms: 2000,
            off_timeout_ms: 1000,
            max_brightness: 100,
            floor_brightness: 0,
        };
        Dimmer::new(&config, &DisplayConfig::default())
    }

    #[test]
    fn fresh_activity_starts_fade_in_dark() {
        let mut d = dimmer();
        let decision = d.evaluate(Duration::ZERO, true, false, Instant::now());
        assert_eq!(decision.state, DimmerState::FadeIn);
        assert_eq!(decision.brightness, 0);
    }

    #[test]
    fn full_cycle() {
        let mut d = dimmer();
        let t = Instant::now();
        assert_eq!(d.evaluate(ms(200), true, false, t).brightness, 50);

        let active = d.evaluate(ms(400), true, false, t);
        assert_eq!((active.state, active.brightness), (DimmerState::Active, 100));
        assert_eq!(active.fps, 20);

        let half = d.evaluate(ms(11_000), true, false, t);
        assert_eq!((half.state, half.brightness), (DimmerState::FadeOut, 50));
        assert_eq!(half.fps, 2);

        let idle = d.evaluate(ms(12_000), true, false, t);
        assert_eq!((idle.state, idle.brightness), (DimmerState::Idle, 0));
    }

    #[test]
    fn screen_on_skips_fade_in_until_motion() {
        let mut d = dimmer();
        let t = Instant::now();
        d.evaluate(ms(500), true, false, t);
        assert_eq!(d.state(), DimmerState::Active);

        // Activity while lit stays ACTIVE.
        assert_eq!(d.evaluate(ms(0), true, false, t).state, DimmerState::Active);

        // Motion clears the flag; fade-in starts from the current level.
        let decision = d.evaluate(ms(0), true, true, t);
        assert_eq!(decision.state, DimmerState::FadeIn);
        assert_eq!(decision.brightness, 100);
    }

    #[test]
    fn off_ramps_to_floor() {
        let mut d = dimmer();
        let t = Instant::now();
        d.evaluate(ms(500), true, false, t);

        let entry = d.evaluate(ms(600), false, false, t);
        assert_eq!((entry.state, entry.brightness), (DimmerState::Off, 100));
        assert_eq!(d.evaluate(ms(600), false, false, t + ms(500)).brightness, 50);
        assert_eq!(d.evaluate(ms(600), false, false, t + ms(1500)).brightness, 0);

        // Running again with fresh activity fades back in from dark.
        let back = d.evaluate(ms(0), true, false, t + ms(1600));
        assert_eq!((back.state, back.brightness), (DimmerState::FadeIn, 0));
    }

    #[test]
    fn state_names() {
        assert_eq!(DimmerState::FadeOut.to_string(), "FADE_OUT");
        assert_eq!(DimmerState::from_u8(DimmerState::Off as u8), DimmerState::Off);
    }
}
