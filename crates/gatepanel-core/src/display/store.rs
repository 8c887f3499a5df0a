//! Concurrent string-keyed data store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Local time shown in the status bar (`HH:MM`).
pub const KEY_CLOCK: &str = "clock";
/// Network label shown in the status bar.
pub const KEY_NETWORK: &str = "network";
/// Cellular signal strength, `0..=4` bars.
pub const KEY_SIGNAL_BARS: &str = "signal_bars";
/// Battery state of charge in percent.
pub const KEY_BATTERY_PERCENT: &str = "battery_percent";
/// Battery power in watts, negative while charging.
pub const KEY_BATTERY_WATTS: &str = "battery_watts";
/// `1` while the battery charges.
pub const KEY_CHARGING: &str = "charging";

/// Values written by telemetry collectors and read by the renderer.
///
/// Locking is internal and held only for the copy in or out, so callers
/// never coordinate with each other.
#[derive(Debug, Default)]
pub struct DataStore {
    values: RwLock<HashMap<String, String>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Parse a value, `None` when absent or unparsable.
    pub fn get_parsed<T: core::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.trim().parse().ok()
    }

    /// Truthy values: `1`, `true`, `yes`, `on`, `up`.
    pub fn get_flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| is_truthy(&v))
    }
}

/// `1`, `true`, `yes`, `on` or `up`, ignoring case and whitespace.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "up"
    )
}
