//! Integer Bresenham line rasteriser.
//!
//! The power graph draws its polyline segment by segment with per-segment
//! colours, straight into the RGBA buffer, so it uses this instead of the
//! `embedded-graphics` `Line` primitive.

use super::color::Rgba;
use super::framebuffer::FrameBuffer;

/// Draw a one-pixel line from `(x0, y0)` to `(x1, y1)` inclusive.
///
/// Endpoints may lie outside the buffer; off-screen pixels are dropped.
pub fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        fb.set_pixel(x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Horizontal run from `x0` to `x1` inclusive, blended over the content.
pub fn blend_hline(fb: &mut FrameBuffer, x0: i32, x1: i32, y: i32, color: Rgba) {
    let (start, end) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
    for x in start..=end {
        fb.blend_pixel(x, y, color);
    }
}
