//! Device-backed collaborators
//!
//! - [`fbdev`]: 16 or 32 bpp framebuffer device as a [`DisplaySink`](gatepanel_core::display::DisplaySink)
//! - [`sysfs`]: backlight brightness attribute and motion GPIO value file
//! - [`evdev`]: power button events from an input device node
//! - [`message_file`]: message thread JSON read from disk

pub mod evdev;
pub mod fbdev;
pub mod message_file;
pub mod sysfs;

pub use fbdev::{FbDevSink, FbLayout, PixelFormat};
pub use message_file::FileMessageSource;
pub use sysfs::{MotionSensor, SysfsBacklight};
