//! Logical-to-physical backlight writer with deferred true-off.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, warn};

use super::{BacklightSink, MAX_LEVEL};

struct Inner {
    /// Last accepted logical level; `None` until the first write
    level: Option<u8>,
    /// Bumped by every accepted level; a pending true-off only fires if it
    /// still matches
    generation: u64,
    sink: Box<dyn BacklightSink>,
}

impl Inner {
    fn write(&mut self, physical: u32) {
        if let Err(e) = self.sink.write(physical) {
            warn!("{}", e);
        }
    }
}

/// Shared backlight resource.
///
/// The accepted level, the generation counter and the sink live under one
/// mutex, so the dimmer task, the deferred-off timer and any other caller
/// never interleave writes.
#[derive(Clone)]
pub struct Backlight {
    inner: Arc<Mutex<Inner>>,
    max_physical: u32,
    min_physical: u32,
    off_delay: Duration,
}

impl Backlight {
    pub fn new(
        sink: Box<dyn BacklightSink>,
        max_physical: u32,
        min_physical: u32,
        off_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                level: None,
                generation: 0,
                sink,
            })),
            max_physical,
            min_physical: min_physical.min(max_physical),
            off_delay,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last accepted logical level (0 before any write).
    pub fn level(&self) -> u8 {
        self.lock().level.unwrap_or(0)
    }

    fn to_physical(&self, level: u8) -> u32 {
        let scaled = u32::from(level) * self.max_physical / u32::from(MAX_LEVEL);
        scaled.max(self.min_physical)
    }

    /// Request a logical level, clamped to `0..=100`.
    ///
    /// Repeating the current level writes nothing. Level 0 writes the
    /// minimum physical value now and the true-off value after the off
    /// delay, unless a non-zero level is accepted first. Returns whether the
    /// level was accepted.
    pub fn set_backlight(&self, level: i32) -> bool {
        let level = level.clamp(0, i32::from(MAX_LEVEL)) as u8;
        let mut inner = self.lock();
        if inner.level == Some(level) {
            return false;
        }

        inner.level = Some(level);
        inner.generation = inner.generation.wrapping_add(1);

        if level == 0 {
            inner.write(self.min_physical);
            let armed = inner.generation;
            drop(inner);
            self.arm_true_off(armed);
        } else {
            let physical = self.to_physical(level);
            inner.write(physical);
        }
        true
    }

    fn arm_true_off(&self, armed: u64) {
        let shared = Arc::clone(&self.inner);
        let delay = self.off_delay;
        let spawned = thread::Builder::new()
            .name("backlight-off".into())
            .spawn(move || {
                thread::sleep(delay);
                let mut inner = shared.lock().unwrap_or_else(PoisonError::into_inner);
                if inner.generation == armed && inner.level == Some(0) {
                    debug!("Backlight true-off");
                    inner.write(0);
                }
            });
        if let Err(e) = spawned {
            warn!("Could not arm backlight off timer: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backlight::BacklightError;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<u32>>>);

    impl Recorder {
        fn writes(&self) -> Vec<u32> {
            self.0.lock().unwrap().clone()
        }
    }

    impl BacklightSink for Recorder {
        fn write(&mut self, physical: u32) -> Result<(), BacklightError> {
            self.0.lock().unwrap().push(physical);
            Ok(())
        }
    }

    fn backlight(delay_ms: u64) -> (Backlight, Recorder) {
        let recorder = Recorder::default();
        let backlight = Backlight::new(
            Box::new(recorder.clone()),
            255,
            1,
            Duration::from_millis(delay_ms),
        );
        (backlight, recorder)
    }

    #[test]
    fn repeated_level_writes_once() {
        let (backlight, recorder) = backlight(10);
        assert!(backlight.set_backlight(60));
        assert!(!backlight.set_backlight(60));
        assert_eq!(recorder.writes(), vec![153]);
        assert_eq!(backlight.level(), 60);
    }

    #[test]
    fn levels_are_clamped() {
        let (backlight, recorder) = backlight(10);
        backlight.set_backlight(250);
        assert_eq!(backlight.level(), 100);
        assert!(!backlight.set_backlight(100));
        assert_eq!(recorder.writes(), vec![255]);
    }

    #[test]
    fn zero_writes_minimum_then_true_off() {
        let (backlight, recorder) = backlight(20);
        backlight.set_backlight(50);
        backlight.set_backlight(-5);
        assert_eq!(backlight.level(), 0);
        assert_eq!(recorder.writes(), vec![127, 1]);

        thread::sleep(Duration::from_millis(200));
        assert_eq!(recorder.writes(), vec![127, 1, 0]);
    }

    #[test]
    fn non_zero_level_cancels_pending_off() {
        let (backlight, recorder) = backlight(50);
        backlight.set_backlight(0);
        backlight.set_backlight(30);

        thread::sleep(Duration::from_millis(250));
        assert_eq!(recorder.writes(), vec![1, 76]);
        assert_eq!(backlight.level(), 30);
    }

    #[test]
    fn failing_sink_still_accepts_level() {
        struct Broken;
        impl BacklightSink for Broken {
            fn write(&mut self, physical: u32) -> Result<(), BacklightError> {
                Err(BacklightError::Write {
                    value: physical,
                    message: "read-only".into(),
                })
            }
        }
        let backlight = Backlight::new(Box::new(Broken), 255, 1, Duration::from_millis(5));
        assert!(backlight.set_backlight(40));
        assert_eq!(backlight.level(), 40);
    }
}
