//! Pixel-level utilities shared by every region renderer
//!
//! - [`color`]: RGBA pixels, alpha blending and the panel palette
//! - [`framebuffer`]: the RGBA region buffer (`embedded-graphics` draw target)
//!   with crop, composite and stitch operations
//! - [`line`]: Bresenham rasteriser used by the power graph
//! - [`easing`]: quartic ease-out curve driving page transitions

use thiserror_no_std::Error;

pub mod color;
pub mod easing;
pub mod framebuffer;
pub mod line;

pub use color::Rgba;
pub use framebuffer::{FrameBuffer, PixelRect};

/// Error types for buffer-to-buffer operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// A composite or crop rectangle does not fit inside the buffer
    #[error("region {rect:?} exceeds {width}x{height} buffer")]
    OutOfBounds {
        /// Requested placement
        rect: PixelRect,
        /// Destination width
        width: u32,
        /// Destination height
        height: u32,
    },
}
