//! Panel configuration
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a JSON
//! file only needs the keys it wants to change. With no `pages` key the
//! built-in status page is used.

use core::time::Duration;

use serde::Deserialize;
use thiserror_no_std::Error;

use crate::display::page::PageSpec;
use crate::display::store::KEY_BATTERY_WATTS;

/// Configuration loading errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not valid JSON or has wrongly typed fields
    #[error("config parse error: {message}")]
    Parse { message: String },
    /// A value parsed but cannot drive the panel
    #[error("invalid config value {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub display: DisplayConfig,
    pub dimmer: DimmerConfig,
    pub backlight: BacklightConfig,
    pub inputs: InputConfig,
    pub power: PowerConfig,
    pub messages: MessagesConfig,
    pub telemetry: TelemetryConfig,
    pub pages: Vec<PageSpec>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            dimmer: DimmerConfig::default(),
            backlight: BacklightConfig::default(),
            inputs: InputConfig::default(),
            power: PowerConfig::default(),
            messages: MessagesConfig::default(),
            telemetry: TelemetryConfig::default(),
            pages: vec![PageSpec::builtin_status()],
        }
    }
}

impl PanelConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the render loop or dimmer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.display;
        if d.width == 0 {
            return Err(ConfigError::Invalid {
                field: "display.width",
                reason: "must be non-zero",
            });
        }
        if d.top_bar_height + d.footer_height >= d.height {
            return Err(ConfigError::Invalid {
                field: "display.height",
                reason: "no room left for the middle region",
            });
        }
        if d.transition_steps == 0 {
            return Err(ConfigError::Invalid {
                field: "display.transition_steps",
                reason: "must be at least 1",
            });
        }
        if d.active_fps == 0 || d.idle_fps == 0 {
            return Err(ConfigError::Invalid {
                field: "display.active_fps",
                reason: "frame rates must be non-zero",
            });
        }
        if !(d.safety_factor > 0.0 && d.safety_factor <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "display.safety_factor",
                reason: "must be in (0, 1]",
            });
        }
        if self.dimmer.tick_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "dimmer.tick_ms",
                reason: "must be non-zero",
            });
        }
        if self.dimmer.floor_brightness > self.dimmer.max_brightness {
            return Err(ConfigError::Invalid {
                field: "dimmer.floor_brightness",
                reason: "must not exceed max_brightness",
            });
        }
        if self.backlight.min_physical > self.backlight.max_physical {
            return Err(ConfigError::Invalid {
                field: "backlight.min_physical",
                reason: "must not exceed max_physical",
            });
        }
        if self.messages.line_spacing < 1.0 {
            return Err(ConfigError::Invalid {
                field: "messages.line_spacing",
                reason: "must be at least 1.0",
            });
        }
        Ok(())
    }
}

/// Screen geometry, frame pacing and transitions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub top_bar_height: u32,
    pub footer_height: u32,
    /// Frame rate while the dimmer is ACTIVE or fading in
    pub active_fps: u32,
    /// Frame rate while dark or fading out
    pub idle_fps: u32,
    /// Scales the pacing sleep so frames are not overslept
    pub safety_factor: f32,
    pub transition_steps: u32,
    pub show_fps: bool,
    /// Seconds between automatic page changes, 0 disables
    pub rotate_interval_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            top_bar_height: 24,
            footer_height: 20,
            active_fps: 20,
            idle_fps: 2,
            safety_factor: 0.9,
            transition_steps: 16,
            show_fps: false,
            rotate_interval_secs: 0,
        }
    }
}

impl DisplayConfig {
    pub fn middle_height(&self) -> u32 {
        self.height - self.top_bar_height - self.footer_height
    }

    pub fn rotate_interval(&self) -> Option<Duration> {
        (self.rotate_interval_secs > 0).then(|| Duration::from_secs(self.rotate_interval_secs))
    }
}

/// Idle/backlight state machine timings, in milliseconds unless noted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DimmerConfig {
    pub tick_ms: u64,
    pub idle_timeout_secs: u64,
    pub fade_in_ms: u64,
    pub fade_out_ms: u64,
    pub off_timeout_ms: u64,
    /// Logical brightness while ACTIVE
    pub max_brightness: u8,
    /// Logical brightness reached at the end of OFF
    pub floor_brightness: u8,
}

impl Default for DimmerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 25,
            idle_timeout_secs: 30,
            fade_in_ms: 400,
            fade_out_ms: 3000,
            off_timeout_ms: 2000,
            max_brightness: 100,
            floor_brightness: 0,
        }
    }
}

impl DimmerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Physical backlight sink.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BacklightConfig {
    /// sysfs `brightness` attribute
    pub path: String,
    /// Physical value written for logical 100
    pub max_physical: u32,
    /// Physical value written immediately for logical 0
    pub min_physical: u32,
    /// Delay before the true-off write
    pub off_delay_ms: u64,
}

impl Default for BacklightConfig {
    fn default() -> Self {
        Self {
            path: "/sys/class/backlight/backlight/brightness".into(),
            max_physical: 255,
            min_physical: 1,
            off_delay_ms: 1500,
        }
    }
}

/// Power button and motion sensor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// evdev node delivering `KEY_POWER`; `None` disables the listener
    pub button_device: Option<String>,
    /// sysfs GPIO `value` file of the motion sensor; `None` disables polling
    pub motion_path: Option<String>,
    pub motion_poll_ms: u64,
    /// Minimum hold time for a release to count
    pub debounce_ms: u64,
    /// Minimum spacing between motion-triggered activity resets
    pub motion_throttle_secs: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            button_device: Some("/dev/input/event0".into()),
            motion_path: None,
            motion_poll_ms: 200,
            debounce_ms: 50,
            motion_throttle_secs: 5,
        }
    }
}

/// Power history sampling, persistence and graph page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    pub history_path: Option<String>,
    pub time_frame_mins: u32,
    pub max_samples: usize,
    pub sample_interval_secs: u64,
    /// Data store key the sampler reads wattage from
    pub wattage_key: String,
    /// Insert the power graph page into the rotation
    pub show_page: bool,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            history_path: Some("/var/lib/gatepanel/power_history.json".into()),
            time_frame_mins: 15,
            max_samples: 900,
            sample_interval_secs: 1,
            wattage_key: KEY_BATTERY_WATTS.into(),
            show_page: true,
        }
    }
}

/// Message thread source and layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// JSON file holding `{"msg": [...]}`; `None` disables message pages
    pub source_path: Option<String>,
    pub poll_interval_secs: u64,
    /// Line pitch as a multiple of the font height
    pub line_spacing: f32,
    pub show_page_footer: bool,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            source_path: None,
            poll_interval_secs: 30,
            line_spacing: 1.2,
            show_page_footer: true,
        }
    }
}

/// Host telemetry collectors run by the daemon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub interval_secs: u64,
    /// File whose content `0` clears the device running signal
    pub running_path: Option<String>,
    /// Network interface whose operstate is shown in the status bar
    pub interface: String,
    /// Directory name under `/sys/class/power_supply`; `None` disables
    /// battery readings
    pub battery: Option<String>,
    /// File holding the modem signal strength as `0..=4` bars
    pub signal_path: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            running_path: None,
            interface: "wwan0".into(),
            battery: Some("battery".into()),
            signal_path: None,
        }
    }
}
