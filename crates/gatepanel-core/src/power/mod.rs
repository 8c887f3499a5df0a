//! Power history engine
//!
//! A time-windowed store of battery wattage samples, persisted as JSON and
//! drawn as a signed line graph (discharge above the zero line, charge below).
//!
//! - [`history`]: sample store, eviction and persistence
//! - [`graph`]: graph renderer working on a sample snapshot

use thiserror_no_std::Error;

pub mod graph;
pub mod history;

pub use graph::draw_samples;
pub use history::{PowerHistory, PowerSample};

/// Largest sliding window accepted by [`PowerHistory::set_time_frame`].
pub const MAX_TIME_FRAME_MINS: u32 = 60;

/// Recorded samples between two writes of the history file.
pub const PERSIST_EVERY: u64 = 10;

/// Power history errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// A wattage reading that does not parse as a finite number
    #[error("invalid wattage reading {raw:?}")]
    InvalidWattage { raw: String },
    /// Reading or writing the history file failed
    #[error("history file I/O failed: {message}")]
    Io { message: String },
    /// The history file is not a valid history document
    #[error("history file is malformed: {message}")]
    Format { message: String },
}
