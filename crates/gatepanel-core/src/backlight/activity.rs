//! User activity and panel-wide flags shared between tasks.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::debug;

use super::DimmerState;

struct ActivityInner {
    last_activity: Instant,
    last_motion: Option<Instant>,
    pressed_at: Option<Instant>,
}

/// Last-activity timestamp plus motion throttling and button debounce.
pub struct ActivityTracker {
    inner: Mutex<ActivityInner>,
    motion_pending: AtomicBool,
    motion_throttle: Duration,
    debounce: Duration,
}

impl ActivityTracker {
    pub fn new(now: Instant, motion_throttle: Duration, debounce: Duration) -> Self {
        Self {
            inner: Mutex::new(ActivityInner {
                last_activity: now,
                last_motion: None,
                pressed_at: None,
            }),
            motion_pending: AtomicBool::new(false),
            motion_throttle,
            debounce,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ActivityInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Time since the last recorded activity.
    pub fn idle(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.lock().last_activity)
    }

    pub fn touch(&self, now: Instant) {
        self.lock().last_activity = now;
    }

    /// Motion detected. Resets activity at most once per throttle period;
    /// returns whether this event counted.
    pub fn motion(&self, now: Instant) -> bool {
        let mut inner = self.lock();
        let throttled = inner
            .last_motion
            .is_some_and(|last| now.saturating_duration_since(last) < self.motion_throttle);
        if throttled {
            return false;
        }
        inner.last_motion = Some(now);
        inner.last_activity = now;
        drop(inner);

        self.motion_pending.store(true, Ordering::Release);
        debug!("Motion activity");
        true
    }

    /// Consume the pending-motion flag.
    pub fn take_motion(&self) -> bool {
        self.motion_pending.swap(false, Ordering::AcqRel)
    }

    pub fn button_pressed(&self, now: Instant) {
        let mut inner = self.lock();
        inner.pressed_at = Some(now);
        inner.last_activity = now;
    }

    /// Button released; counts only after a press held for the debounce
    /// time. Returns whether it counted.
    pub fn button_released(&self, now: Instant) -> bool {
        let mut inner = self.lock();
        let held = inner
            .pressed_at
            .take()
            .map(|at| now.saturating_duration_since(at));
        match held {
            Some(held) if held >= self.debounce => {
                inner.last_activity = now;
                true
            }
            _ => false,
        }
    }
}

/// Power button edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Press,
    Release,
}

/// Apply a button edge. A counted release while the dimmer is ACTIVE
/// requests a page transition.
pub fn handle_button(tracker: &ActivityTracker, panel: &PanelState, event: ButtonEvent, now: Instant) {
    match event {
        ButtonEvent::Press => tracker.button_pressed(now),
        ButtonEvent::Release => {
            if tracker.button_released(now) && panel.dimmer_state() == DimmerState::Active {
                panel.request_transition();
            }
        }
    }
}

/// Lock-free flags read by the render loop and the input listeners.
pub struct PanelState {
    transition_requested: AtomicBool,
    running: AtomicBool,
    dimmer_state: AtomicU8,
    target_fps: AtomicU32,
}

impl PanelState {
    pub fn new(initial_fps: u32) -> Self {
        Self {
            transition_requested: AtomicBool::new(false),
            running: AtomicBool::new(true),
            dimmer_state: AtomicU8::new(DimmerState::FadeIn as u8),
            target_fps: AtomicU32::new(initial_fps.max(1)),
        }
    }

    pub fn request_transition(&self) {
        self.transition_requested.store(true, Ordering::Release);
    }

    /// Consume a pending transition request.
    pub fn take_transition_request(&self) -> bool {
        self.transition_requested.swap(false, Ordering::AcqRel)
    }

    /// Device-level running signal; cleared means the dimmer goes OFF.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_dimmer_state(&self, state: DimmerState) {
        self.dimmer_state.store(state as u8, Ordering::Release);
    }

    pub fn dimmer_state(&self) -> DimmerState {
        DimmerState::from_u8(self.dimmer_state.load(Ordering::Acquire))
    }

    pub fn set_target_fps(&self, fps: u32) {
        self.target_fps.store(fps.max(1), Ordering::Release);
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(t0: Instant) -> ActivityTracker {
        ActivityTracker::new(t0, Duration::from_secs(5), Duration::from_millis(50))
    }

    #[test]
    fn motion_is_throttled() {
        let t0 = Instant::now();
        let tracker = tracker(t0);

        assert!(tracker.motion(t0 + Duration::from_secs(10)));
        assert!(tracker.take_motion());
        assert!(!tracker.take_motion());

        assert!(!tracker.motion(t0 + Duration::from_secs(12)));
        assert!(!tracker.take_motion());
        assert_eq!(
            tracker.idle(t0 + Duration::from_secs(13)),
            Duration::from_secs(3)
        );

        assert!(tracker.motion(t0 + Duration::from_secs(15)));
    }

    #[test]
    fn short_press_release_does_not_count() {
        let t0 = Instant::now();
        let tracker = tracker(t0);
        tracker.button_pressed(t0 + Duration::from_secs(1));
        assert!(!tracker.button_released(t0 + Duration::from_millis(1020)));
        // The press itself still reset activity.
        assert_eq!(
            tracker.idle(t0 + Duration::from_secs(2)),
            Duration::from_secs(1)
        );

        tracker.button_pressed(t0 + Duration::from_secs(3));
        assert!(tracker.button_released(t0 + Duration::from_millis(3100)));
        assert!(!tracker.button_released(t0 + Duration::from_millis(3200)));
    }

    #[test]
    fn release_requests_transition_only_when_active() {
        let t0 = Instant::now();
        let tracker = tracker(t0);
        let panel = PanelState::new(20);

        panel.set_dimmer_state(DimmerState::Idle);
        handle_button(&tracker, &panel, ButtonEvent::Press, t0);
        handle_button(&tracker, &panel, ButtonEvent::Release, t0 + Duration::from_millis(200));
        assert!(!panel.take_transition_request());

        panel.set_dimmer_state(DimmerState::Active);
        handle_button(&tracker, &panel, ButtonEvent::Press, t0 + Duration::from_secs(1));
        handle_button(&tracker, &panel, ButtonEvent::Release, t0 + Duration::from_millis(1200));
        assert!(panel.take_transition_request());
        assert!(!panel.take_transition_request());
    }

    #[test]
    fn panel_flags_round_trip() {
        let panel = PanelState::new(0);
        assert_eq!(panel.target_fps(), 1);
        assert!(panel.is_running());
        panel.set_running(false);
        assert!(!panel.is_running());
        panel.set_dimmer_state(DimmerState::FadeOut);
        assert_eq!(panel.dimmer_state(), DimmerState::FadeOut);
    }
}
