//! sysfs attribute files: backlight brightness and the motion GPIO.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gatepanel_core::backlight::{BacklightError, BacklightSink};
use log::{info, warn};

/// Read an attribute file, trimmed.
pub fn read_attribute(path: &Path) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_owned())
}

/// Backlight `brightness` attribute.
pub struct SysfsBacklight {
    path: PathBuf,
}

impl SysfsBacklight {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BacklightSink for SysfsBacklight {
    fn write(&mut self, physical: u32) -> Result<(), BacklightError> {
        fs::write(&self.path, format!("{physical}\n")).map_err(|e| BacklightError::Write {
            value: physical,
            message: format!("{}: {e}", self.path.display()),
        })
    }
}

/// PIR sensor exposed as a GPIO `value` file.
pub struct MotionSensor {
    path: PathBuf,
    failing: bool,
}

impl MotionSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            failing: false,
        }
    }

    /// Whether the sensor currently reports motion. Read errors count as no
    /// motion and are logged once until the file is readable again.
    pub fn poll(&mut self) -> bool {
        match read_attribute(&self.path) {
            Ok(value) => {
                if self.failing {
                    info!("Motion sensor {} readable again", self.path.display());
                    self.failing = false;
                }
                value == "1"
            }
            Err(e) => {
                if !self.failing {
                    warn!("Motion sensor {} unreadable: {}", self.path.display(), e);
                    self.failing = true;
                }
                false
            }
        }
    }
}
