//! Shared application state
//!
//! One owned resource object per concern, each behind its own lock and
//! shared through `Arc` with the tasks that need it.

mod hardware;

pub use hardware::*;

use std::sync::Arc;
use std::time::{Duration, Instant};

use gatepanel_core::backlight::{ActivityTracker, Backlight, BacklightSink, PanelState};
use gatepanel_core::config::PanelConfig;
use gatepanel_core::display::{DataStore, PanelResources};
use gatepanel_core::messages::MessageBoard;
use gatepanel_core::power::PowerHistory;
use log::info;

pub struct AppState {
    pub store: Arc<DataStore>,
    pub panel: Arc<PanelState>,
    pub tracker: Arc<ActivityTracker>,
    pub history: Arc<PowerHistory>,
    pub board: Arc<MessageBoard>,
    pub backlight: Backlight,
}

impl AppState {
    pub fn new(config: &PanelConfig, backlight_sink: Box<dyn BacklightSink>, now: Instant) -> Self {
        let power = &config.power;
        let history = match &power.history_path {
            Some(path) => PowerHistory::load(path, power.time_frame_mins, power.max_samples),
            None => PowerHistory::new(power.time_frame_mins, power.max_samples),
        };
        info!("Power history: {} samples loaded", history.len());

        let inputs = &config.inputs;
        let bl = &config.backlight;
        Self {
            store: Arc::new(DataStore::new()),
            panel: Arc::new(PanelState::new(config.display.active_fps)),
            tracker: Arc::new(ActivityTracker::new(
                now,
                Duration::from_secs(inputs.motion_throttle_secs),
                Duration::from_millis(inputs.debounce_ms),
            )),
            history: Arc::new(history),
            board: Arc::new(MessageBoard::new()),
            backlight: Backlight::new(
                backlight_sink,
                bl.max_physical,
                bl.min_physical,
                Duration::from_millis(bl.off_delay_ms),
            ),
        }
    }

    /// The subset the render loop reads.
    pub fn resources(&self) -> PanelResources {
        PanelResources {
            store: Arc::clone(&self.store),
            panel: Arc::clone(&self.panel),
            history: Arc::clone(&self.history),
            board: Arc::clone(&self.board),
        }
    }
}
