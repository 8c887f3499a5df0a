//! Host telemetry collectors.
//!
//! Each collector reads one `/proc` or `/sys` file and writes a display-ready
//! string into the [`DataStore`]. A failed read leaves the previous value in
//! place. [`Battery`] feeds the power sampler and runs on its thread.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use gatepanel_core::backlight::PanelState;
use gatepanel_core::config::TelemetryConfig;
use gatepanel_core::display::DataStore;
use gatepanel_core::display::store::{
    KEY_BATTERY_PERCENT, KEY_BATTERY_WATTS, KEY_CHARGING, KEY_CLOCK, KEY_NETWORK, KEY_SIGNAL_BARS,
    is_truthy,
};
use log::{debug, info, warn};

use crate::devices::sysfs::read_attribute;

pub const KEY_HOSTNAME: &str = "hostname";
pub const KEY_UPTIME: &str = "uptime";
pub const KEY_LOADAVG: &str = "loadavg";
pub const KEY_MEMORY: &str = "memory";

/// `1d 02h 03m`
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = secs % 86_400 / 3_600;
    let minutes = secs % 3_600 / 60;
    format!("{days}d {hours:02}h {minutes:02}m")
}

/// Whole seconds from `/proc/uptime`.
pub fn parse_uptime(text: &str) -> Option<u64> {
    let secs: f64 = text.split_whitespace().next()?.parse().ok()?;
    Some(secs.max(0.0) as u64)
}

/// The 1, 5 and 15 minute averages from `/proc/loadavg`.
pub fn parse_loadavg(text: &str) -> Option<String> {
    let fields: Vec<&str> = text.split_whitespace().take(3).collect();
    (fields.len() == 3).then(|| fields.join(" "))
}

/// `(used, total)` MiB from `/proc/meminfo`.
pub fn parse_meminfo(text: &str) -> Option<(u64, u64)> {
    let field = |name: &str| -> Option<u64> {
        text.lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.trim_start_matches(':').split_whitespace().next())
            .and_then(|kb| kb.parse().ok())
    };
    let total = field("MemTotal")?;
    let available = field("MemAvailable")?;
    Some((total.saturating_sub(available) / 1024, total / 1024))
}

/// Highest value of the signal gauge.
const MAX_SIGNAL_BARS: u8 = 4;

/// Watts from `voltage_now` (µV) and `current_now` (µA), negative while
/// charging. Drivers disagree on the sign of `current_now`, so only the
/// magnitude is used.
pub fn battery_watts(voltage_uv: i64, current_ua: i64, charging: bool) -> f64 {
    signed_watts(voltage_uv as f64 * current_ua as f64 / 1e12, charging)
}

fn signed_watts(watts: f64, charging: bool) -> f64 {
    if charging { -watts.abs() } else { watts.abs() }
}

/// One `power_supply` class directory.
pub struct Battery {
    dir: PathBuf,
    failing: bool,
}

impl Battery {
    pub fn new(name: &str) -> Self {
        Self::with_root("/sys/class/power_supply", name)
    }

    pub fn with_root(root: impl AsRef<Path>, name: &str) -> Self {
        Self {
            dir: root.as_ref().join(name),
            failing: false,
        }
    }

    fn attribute<T: FromStr>(&self, name: &str) -> Option<T> {
        read_attribute(&self.dir.join(name)).ok()?.parse().ok()
    }

    /// Write `charging`, `battery_percent` and `battery_watts`. An unreadable
    /// `status` skips the whole reading and is logged once.
    pub fn collect(&mut self, store: &DataStore) {
        let status = match read_attribute(&self.dir.join("status")) {
            Ok(status) => {
                if self.failing {
                    info!("Battery {} readable again", self.dir.display());
                    self.failing = false;
                }
                status
            }
            Err(e) => {
                if !self.failing {
                    warn!("Battery {} unreadable: {}", self.dir.display(), e);
                    self.failing = true;
                }
                return;
            }
        };

        let charging = status == "Charging";
        store.set(KEY_CHARGING, if charging { "1" } else { "0" });

        if let Some(percent) = self.attribute::<u8>("capacity") {
            store.set(KEY_BATTERY_PERCENT, percent.min(100).to_string());
        }

        let voltage = self.attribute::<i64>("voltage_now");
        let current = self.attribute::<i64>("current_now");
        let watts = match (voltage, current) {
            (Some(uv), Some(ua)) => Some(battery_watts(uv, ua, charging)),
            _ => self
                .attribute::<i64>("power_now")
                .map(|uw| signed_watts(uw as f64 / 1e6, charging)),
        };
        match watts {
            Some(watts) => store.set(KEY_BATTERY_WATTS, format!("{watts:.3}")),
            None => {
                store.remove(KEY_BATTERY_WATTS);
            }
        }
    }
}

pub struct Telemetry {
    proc_root: PathBuf,
    net_root: PathBuf,
    interface: String,
    running_path: Option<PathBuf>,
    signal_path: Option<PathBuf>,
}

impl Telemetry {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self::with_roots(config, "/proc", "/sys/class/net")
    }

    pub fn with_roots(
        config: &TelemetryConfig,
        proc_root: impl Into<PathBuf>,
        net_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            proc_root: proc_root.into(),
            net_root: net_root.into(),
            interface: config.interface.clone(),
            running_path: config.running_path.as_ref().map(PathBuf::from),
            signal_path: config.signal_path.as_ref().map(PathBuf::from),
        }
    }

    fn read(&self, path: &Path) -> Option<String> {
        match fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("Telemetry read {} failed: {}", path.display(), e);
                None
            }
        }
    }

    fn proc(&self, name: &str) -> Option<String> {
        self.read(&self.proc_root.join(name))
    }

    /// Run every collector once.
    pub fn collect(&self, store: &DataStore, panel: &PanelState, now: DateTime<Local>) {
        store.set(KEY_CLOCK, now.format("%H:%M").to_string());

        if let Some(name) = self.proc("sys/kernel/hostname") {
            store.set(KEY_HOSTNAME, name.trim());
        }
        if let Some(secs) = self.proc("uptime").as_deref().and_then(parse_uptime) {
            store.set(KEY_UPTIME, format_uptime(secs));
        }
        if let Some(load) = self.proc("loadavg").as_deref().and_then(parse_loadavg) {
            store.set(KEY_LOADAVG, load);
        }
        if let Some((used, total)) = self.proc("meminfo").as_deref().and_then(parse_meminfo) {
            store.set(KEY_MEMORY, format!("{used}/{total} MiB"));
        }

        let operstate = self.read(&self.net_root.join(&self.interface).join("operstate"));
        if operstate.as_deref().is_some_and(is_truthy) {
            store.set(KEY_NETWORK, self.interface.as_str());
        } else {
            store.remove(KEY_NETWORK);
        }

        if let Some(path) = &self.signal_path {
            let bars = self.read(path).and_then(|v| v.trim().parse::<u8>().ok());
            match bars {
                Some(bars) => store.set(KEY_SIGNAL_BARS, bars.min(MAX_SIGNAL_BARS).to_string()),
                None => {
                    store.remove(KEY_SIGNAL_BARS);
                }
            }
        }

        if let Some(path) = &self.running_path {
            match fs::read_to_string(path) {
                Ok(value) => panel.set_running(is_truthy(&value)),
                Err(e) => warn!("Running flag {} unreadable: {}", path.display(), e),
            }
        }
    }
}
