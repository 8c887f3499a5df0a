//! Idle/backlight state machine
//!
//! Input listeners record activity in an [`ActivityTracker`]; the dimmer
//! task turns idle time, motion and the device running signal into a
//! [`DimmerState`], a logical brightness written through [`Backlight`], and
//! a target frame rate published on [`PanelState`].

use thiserror_no_std::Error;

pub mod activity;
pub mod dimmer;
pub mod writer;

pub use activity::{ActivityTracker, ButtonEvent, PanelState, handle_button};
pub use dimmer::{Decision, Dimmer, DimmerState};
pub use writer::Backlight;

/// Highest logical brightness.
pub const MAX_LEVEL: u8 = 100;

/// Backlight errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BacklightError {
    /// The physical brightness could not be written
    #[error("backlight write of {value} failed: {message}")]
    Write { value: u32, message: String },
}

/// Raw brightness output (a sysfs `brightness` file on the device).
pub trait BacklightSink: Send {
    fn write(&mut self, physical: u32) -> Result<(), BacklightError>;
}
