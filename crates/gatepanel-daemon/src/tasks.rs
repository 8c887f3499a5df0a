//! Background tasks
//!
//! Every task is a named thread that runs for the life of the process and
//! talks to the render loop only through the shared resources in
//! [`AppState`].

use std::fs::File;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Local;
use gatepanel_core::backlight::Dimmer;
use gatepanel_core::config::PanelConfig;
use gatepanel_core::messages::{MessageWorker, Outcome, PageMetrics};
use log::{debug, error, info, warn};

use crate::app_state::AppState;
use crate::devices::{FileMessageSource, MotionSensor, evdev};
use crate::telemetry::{Battery, Telemetry};

/// Run `task` every `period`, measured from the start of each run.
pub fn spawn_periodic<F>(name: &str, period: Duration, mut task: F) -> io::Result<JoinHandle<()>>
where
    F: FnMut() + Send + 'static,
{
    thread::Builder::new().name(name.into()).spawn(move || {
        loop {
            let started = Instant::now();
            task();
            if let Some(rest) = period.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
    })
}

pub fn spawn_dimmer(config: &PanelConfig, state: &AppState) -> io::Result<JoinHandle<()>> {
    let mut dimmer = Dimmer::new(&config.dimmer, &config.display);
    let tracker = Arc::clone(&state.tracker);
    let panel = Arc::clone(&state.panel);
    let backlight = state.backlight.clone();
    spawn_periodic("dimmer", config.dimmer.tick(), move || {
        dimmer.tick(&tracker, &panel, &backlight, Instant::now());
    })
}

pub fn spawn_motion(path: &str, config: &PanelConfig, state: &AppState) -> io::Result<JoinHandle<()>> {
    let mut sensor = MotionSensor::new(path);
    let tracker = Arc::clone(&state.tracker);
    let period = Duration::from_millis(config.inputs.motion_poll_ms.max(1));
    spawn_periodic("motion", period, move || {
        if sensor.poll() {
            tracker.motion(Instant::now());
        }
    })
}

/// `None` when the input device cannot be opened.
pub fn spawn_button(path: &str, state: &AppState) -> io::Result<Option<JoinHandle<()>>> {
    let device = match File::open(path) {
        Ok(device) => device,
        Err(e) => {
            warn!("Power button {} unavailable: {}", path, e);
            return Ok(None);
        }
    };
    let tracker = Arc::clone(&state.tracker);
    let panel = Arc::clone(&state.panel);
    let path = path.to_owned();
    thread::Builder::new()
        .name("button".into())
        .spawn(move || match evdev::listen(device, &tracker, &panel) {
            Ok(()) => warn!("Power button {} closed", path),
            Err(e) => error!("Power button {} failed: {}", path, e),
        })
        .map(Some)
}

/// Reads the battery, when one is configured, then records whatever the
/// wattage key holds.
pub fn spawn_power_sampler(config: &PanelConfig, state: &AppState) -> io::Result<JoinHandle<()>> {
    let key = config.power.wattage_key.clone();
    let mut battery = config.telemetry.battery.as_deref().map(Battery::new);
    let store = Arc::clone(&state.store);
    let history = Arc::clone(&state.history);
    let period = Duration::from_secs(config.power.sample_interval_secs.max(1));
    spawn_periodic("power", period, move || {
        if let Some(battery) = battery.as_mut() {
            battery.collect(&store);
        }
        let Some(raw) = store.get(&key) else {
            return;
        };
        if let Err(e) = history.record_sample(&raw) {
            warn!("Power sample skipped: {}", e);
        }
    })
}

pub fn spawn_message_fetcher(
    path: &str,
    config: &PanelConfig,
    state: &AppState,
) -> io::Result<JoinHandle<()>> {
    let metrics = PageMetrics::new(
        config.display.width,
        config.display.middle_height(),
        config.messages.line_spacing,
        config.messages.show_page_footer,
    );
    let mut worker = MessageWorker::new(FileMessageSource::new(path), metrics, Arc::clone(&state.board));
    let period = Duration::from_secs(config.messages.poll_interval_secs.max(1));
    spawn_periodic("messages", period, move || {
        let result = worker.poll(Local::now().naive_local());
        if let Outcome::Rendered = result.outcome {
            debug!("{} message pages published", result.page_count);
        }
    })
}

pub fn spawn_telemetry(config: &PanelConfig, state: &AppState) -> io::Result<JoinHandle<()>> {
    let telemetry = Telemetry::new(&config.telemetry);
    let store = Arc::clone(&state.store);
    let panel = Arc::clone(&state.panel);
    let period = Duration::from_secs(config.telemetry.interval_secs.max(1));
    spawn_periodic("telemetry", period, move || {
        telemetry.collect(&store, &panel, Local::now());
    })
}

/// Start every task the configuration enables.
pub fn spawn_all(config: &PanelConfig, state: &AppState) -> io::Result<()> {
    spawn_dimmer(config, state)?;
    spawn_telemetry(config, state)?;
    spawn_power_sampler(config, state)?;

    if let Some(path) = &config.inputs.button_device {
        spawn_button(path, state)?;
    }
    if let Some(path) = &config.inputs.motion_path {
        spawn_motion(path, config, state)?;
    }
    if let Some(path) = &config.messages.source_path {
        spawn_message_fetcher(path, config, state)?;
    }
    info!("Background tasks started");
    Ok(())
}
