//! Heap-backed RGBA framebuffer for one display region.
//!
//! All region drawing targets one of these RAM buffers instead of the SPI
//! panel. After a cycle is fully drawn the buffer is composited into the
//! screen buffer and handed to the [`DisplaySink`](crate::display::DisplaySink)
//! as a single rectangular push.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use super::GraphicsError;
use super::color::Rgba;

/// Axis-aligned pixel rectangle in framebuffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// RGBA framebuffer implementing `DrawTarget<Color = Rgb888>`.
///
/// Drawing through `embedded-graphics` writes opaque pixels and silently
/// clips to the buffer. Compositing between buffers goes through
/// [`FrameBuffer::composite`], which instead rejects placements that do not
/// fit so the caller can decide to skip the region.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl core::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl FrameBuffer {
    /// Allocate a buffer filled with `fill`.
    pub fn new(width: u32, height: u32, fill: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Read a pixel; `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        (x < self.width && y < self.height).then(|| self.pixels[self.index(x, y)])
    }

    /// Write a pixel, ignoring coordinates outside the buffer.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            let idx = self.index(x as u32, y as u32);
            self.pixels[idx] = color;
        }
    }

    /// Alpha-blend a pixel over the existing content.
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
            let idx = self.index(x as u32, y as u32);
            self.pixels[idx] = Rgba::blend(self.pixels[idx], color);
        }
    }

    /// Fill the whole buffer with one colour.
    pub fn fill(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Fill a rectangle, clipped to the buffer.
    pub fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        let x_end = rect.right().min(self.width);
        let y_end = rect.bottom().min(self.height);
        for y in rect.y.min(y_end)..y_end {
            let row = self.index(0, y);
            let start = row + rect.x.min(x_end) as usize;
            self.pixels[start..row + x_end as usize].fill(color);
        }
    }

    /// Blend a translucent colour over a rectangle, clipped to the buffer.
    pub fn blend_rect(&mut self, rect: PixelRect, color: Rgba) {
        let x_end = rect.right().min(self.width);
        let y_end = rect.bottom().min(self.height);
        for y in rect.y.min(y_end)..y_end {
            for x in rect.x.min(x_end)..x_end {
                let idx = self.index(x, y);
                self.pixels[idx] = Rgba::blend(self.pixels[idx], color);
            }
        }
    }

    /// Copy `src` into this buffer with its top-left corner at `(x, y)`.
    ///
    /// Pixels are copied verbatim (no blending). Fails without touching the
    /// destination when the source rectangle does not fit.
    pub fn composite(&mut self, src: &FrameBuffer, x: u32, y: u32) -> Result<(), GraphicsError> {
        let placed = PixelRect::new(x, y, src.width, src.height);
        if placed.right() > self.width || placed.bottom() > self.height {
            return Err(GraphicsError::OutOfBounds {
                rect: placed,
                width: self.width,
                height: self.height,
            });
        }

        let row_len = src.width as usize;
        for row in 0..src.height {
            let src_start = src.index(0, row);
            let dst_start = self.index(x, y + row);
            self.pixels[dst_start..dst_start + row_len]
                .copy_from_slice(&src.pixels[src_start..src_start + row_len]);
        }
        Ok(())
    }

    /// Copy a sub-rectangle out into a new buffer.
    pub fn crop(&self, rect: PixelRect) -> Result<FrameBuffer, GraphicsError> {
        if rect.right() > self.width || rect.bottom() > self.height {
            return Err(GraphicsError::OutOfBounds {
                rect,
                width: self.width,
                height: self.height,
            });
        }

        let mut out = Vec::with_capacity(rect.width as usize * rect.height as usize);
        for row in rect.y..rect.bottom() {
            let start = self.index(rect.x, row);
            out.extend_from_slice(&self.pixels[start..start + rect.width as usize]);
        }
        Ok(FrameBuffer {
            width: rect.width,
            height: rect.height,
            pixels: out,
        })
    }

    /// Place `left` and `right` side by side in one buffer.
    ///
    /// Both halves must share a height; this is the stitched frame the page
    /// transition slides a crop window across.
    pub fn stitch_horizontal(
        left: &FrameBuffer,
        right: &FrameBuffer,
    ) -> Result<FrameBuffer, GraphicsError> {
        let mut out = FrameBuffer::new(
            left.width + right.width,
            left.height.max(right.height),
            Rgba::TRANSPARENT,
        );
        out.composite(left, 0, 0)?;
        out.composite(right, left.width, 0)?;
        Ok(out)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.set_pixel(coord.x, coord.y, color.into());
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let area_w = area.size.width as i32;
        let area_h = area.size.height as i32;

        let mut colors = colors.into_iter();
        for row in 0..area_h {
            for col in 0..area_w {
                let Some(color) = colors.next() else {
                    return Ok(());
                };
                self.set_pixel(area.top_left.x + col, area.top_left.y + row, color.into());
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let x0 = area.top_left.x.max(0) as u32;
        let y0 = area.top_left.y.max(0) as u32;
        let x1 = (area.top_left.x.saturating_add(area.size.width as i32)).max(0) as u32;
        let y1 = (area.top_left.y.saturating_add(area.size.height as i32)).max(0) as u32;
        self.fill_rect(
            PixelRect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0)),
            color.into(),
        );
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle as EgRect};

    fn patterned(width: u32, height: u32) -> FrameBuffer {
        let mut fb = FrameBuffer::new(width, height, Rgba::BLACK);
        for y in 0..height {
            for x in 0..width {
                fb.set_pixel(x as i32, y as i32, Rgba::opaque(x as u8, y as u8, 7));
            }
        }
        fb
    }

    #[test]
    fn composite_copies_source_at_offset() {
        let src = patterned(50, 50);
        let background = Rgba::opaque(1, 2, 3);
        let mut dst = FrameBuffer::new(100, 100, background);

        dst.composite(&src, 25, 25).unwrap();

        assert_eq!(dst.pixel(30, 30), src.pixel(5, 5));
        assert_eq!(dst.pixel(25, 25), src.pixel(0, 0));
        assert_eq!(dst.pixel(74, 74), src.pixel(49, 49));
        // Outside the pasted square nothing changed.
        assert_eq!(dst.pixel(24, 30), Some(background));
        assert_eq!(dst.pixel(75, 30), Some(background));
        assert_eq!(dst.pixel(30, 75), Some(background));
        assert_eq!(dst.pixel(0, 0), Some(background));
    }

    #[test]
    fn composite_out_of_bounds_is_rejected_untouched() {
        let src = patterned(50, 50);
        let mut dst = FrameBuffer::new(100, 100, Rgba::WHITE);
        let before = dst.clone();

        let err = dst.composite(&src, 60, 10).unwrap_err();
        assert!(matches!(err, GraphicsError::OutOfBounds { .. }));
        assert_eq!(dst, before);
    }

    #[test]
    fn crop_extracts_window() {
        let src = patterned(40, 20);
        let cropped = src.crop(PixelRect::new(10, 5, 8, 4)).unwrap();
        assert_eq!(cropped.size(), Size::new(8, 4));
        assert_eq!(cropped.pixel(0, 0), src.pixel(10, 5));
        assert_eq!(cropped.pixel(7, 3), src.pixel(17, 8));
        assert!(src.crop(PixelRect::new(35, 0, 8, 4)).is_err());
    }

    #[test]
    fn stitch_places_halves_side_by_side() {
        let left = FrameBuffer::new(10, 4, Rgba::WHITE);
        let right = FrameBuffer::new(10, 4, Rgba::BLACK);
        let stitched = FrameBuffer::stitch_horizontal(&left, &right).unwrap();
        assert_eq!(stitched.width(), 20);
        assert_eq!(stitched.pixel(9, 2), Some(Rgba::WHITE));
        assert_eq!(stitched.pixel(10, 2), Some(Rgba::BLACK));
    }

    #[test]
    fn embedded_graphics_draws_are_clipped() {
        let mut fb = FrameBuffer::new(10, 10, Rgba::BLACK);
        EgRect::new(Point::new(-5, 8), Size::new(20, 10))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb.pixel(0, 9), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(fb.pixel(9, 8), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(fb.pixel(0, 7), Some(Rgba::BLACK));
    }

    #[test]
    fn blend_rect_only_touches_area() {
        let mut fb = FrameBuffer::new(4, 4, Rgba::BLACK);
        fb.blend_rect(PixelRect::new(1, 1, 2, 2), Rgba::new(255, 255, 255, 128));
        assert_eq!(fb.pixel(0, 0), Some(Rgba::BLACK));
        let inner = fb.pixel(1, 1).unwrap();
        assert!((127..=128).contains(&inner.r));
    }
}
