//! Opening the panel's devices at startup.

use std::path::Path;

use anyhow::{Context, Result};
use gatepanel_core::backlight::BacklightSink;
use gatepanel_core::config::{BacklightConfig, DisplayConfig};
use log::info;

use crate::devices::{FbDevSink, SysfsBacklight};

/// Open the framebuffer device. Failure is fatal at startup.
pub fn open_display(path: &Path, display: &DisplayConfig) -> Result<FbDevSink<std::fs::File>> {
    let sink = FbDevSink::open(path, display.width, display.height)
        .with_context(|| format!("opening framebuffer {}", path.display()))?;
    info!(
        "Framebuffer {} ready ({}x{})",
        path.display(),
        display.width,
        display.height
    );
    Ok(sink)
}

/// Backlight sink for the configured attribute. Write failures are logged by
/// the backlight writer, so a missing file is not fatal.
pub fn backlight_sink(config: &BacklightConfig) -> Box<dyn BacklightSink> {
    info!("Backlight attribute {}", config.path);
    Box::new(SysfsBacklight::new(&config.path))
}
