//! Frame compositor and page-transition engine
//!
//! The screen is split into three regions (top bar, middle content, footer),
//! each drawn into its own double-buffered [`FrameBuffer`]. Every cycle the
//! regions are drawn in order, composited into one screen buffer and pushed
//! through a [`DisplaySink`].
//!
//! - [`store`]: concurrent key/value store fed by telemetry collectors
//! - [`page`]: declarative pages and their renderer
//! - [`icons`]: status glyphs drawn with `embedded-graphics` primitives
//! - [`status`]: top bar and footer renderers
//! - [`power_page`]: the battery power page
//! - [`regions`]: per-region double buffers
//! - [`page_manager`]: page list and current page pointer
//! - [`pacing`]: frame pacing and FPS measurement
//! - [`display_manager`]: the render loop and transitions

use core::fmt::Debug;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use thiserror_no_std::Error;

use crate::graphics::Rgba;

pub mod display_manager;
pub mod icons;
pub mod pacing;
pub mod page;
pub mod page_manager;
pub mod power_page;
pub mod regions;
pub mod status;
pub mod store;

pub use display_manager::{DisplayManager, PanelResources};
pub use page::{Element, PageSpec, render_page};
pub use page_manager::{PageManager, PageRef};
pub use store::DataStore;

/// Display output errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// The pixel slice does not match the rectangle
    #[error("pushed {got} pixels for a {width}x{height} region")]
    Geometry { width: u32, height: u32, got: usize },
    /// The transport or device rejected the push
    #[error("display transport failed: {message}")]
    Transport { message: String },
}

/// Capability to put a rectangle of pixels on the panel.
///
/// Implementations block until the transfer completes.
pub trait DisplaySink {
    fn push(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        pixels: &[Rgba],
    ) -> Result<(), DisplayError>;
}

pub(crate) fn check_geometry(width: u32, height: u32, pixels: &[Rgba]) -> Result<(), DisplayError> {
    if pixels.len() != width as usize * height as usize {
        return Err(DisplayError::Geometry {
            width,
            height,
            got: pixels.len(),
        });
    }
    Ok(())
}

/// Adapter turning any `embedded-graphics` draw target into a
/// [`DisplaySink`], e.g. an SPI panel driver or the simulator display.
pub struct DrawTargetSink<D> {
    target: D,
}

impl<D> DrawTargetSink<D> {
    pub fn new(target: D) -> Self {
        Self { target }
    }

    pub fn inner(&self) -> &D {
        &self.target
    }

    pub fn into_inner(self) -> D {
        self.target
    }
}

impl<D> DisplaySink for DrawTargetSink<D>
where
    D: DrawTarget,
    D::Color: From<Rgb888>,
    D::Error: Debug,
{
    fn push(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        pixels: &[Rgba],
    ) -> Result<(), DisplayError> {
        check_geometry(width, height, pixels)?;
        let area = Rectangle::new(Point::new(x as i32, y as i32), Size::new(width, height));
        self.target
            .fill_contiguous(&area, pixels.iter().map(|p| D::Color::from(p.to_rgb888())))
            .map_err(|e| DisplayError::Transport {
                message: format!("{e:?}"),
            })
    }
}
