//! Font handles: measure and draw text.
//!
//! Glyph rasterisation is outsourced. ASCII UI text uses the
//! `embedded-graphics` mono fonts; message bodies use a `u8g2-fonts`
//! WenQuanYi face so Han, kana and punctuation render instead of falling back
//! to replacement glyphs.

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_8X13, FONT_10X20};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::text::renderer::TextRenderer;
use embedded_graphics::text::{Baseline, Text};
use log::debug;
use serde::Deserialize;
use u8g2_fonts::types::{FontColor, VerticalPosition};
use u8g2_fonts::{FontRenderer, fonts};

use crate::graphics::Rgba;

static CJK_RENDERER: FontRenderer =
    FontRenderer::new::<fonts::u8g2_font_wqy12_t_gb2312>().with_ignore_unknown_chars(true);

/// Line pitch of the WenQuanYi 12px face.
const CJK_LINE_HEIGHT_PX: u32 = 13;

/// A font the panel can measure and draw with.
#[derive(Clone, Copy)]
pub enum FontFace {
    /// Fixed-cell `embedded-graphics` font.
    Mono(&'static MonoFont<'static>),
    /// Proportional `u8g2` font with its line pitch.
    U8g2 {
        renderer: &'static FontRenderer,
        line_height: u32,
    },
}

impl core::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FontFace::Mono(font) => write!(f, "Mono({:?})", font.character_size),
            FontFace::U8g2 { line_height, .. } => write!(f, "U8g2(line_height={line_height})"),
        }
    }
}

impl FontFace {
    /// Advance width of `text` in pixels.
    pub fn measure(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }
        match self {
            FontFace::Mono(font) => MonoTextStyle::new(*font, Rgb888::WHITE)
                .measure_string(text, Point::zero(), Baseline::Top)
                .bounding_box
                .size
                .width,
            FontFace::U8g2 { renderer, .. } => renderer
                .get_rendered_dimensions(text, Point::zero(), VerticalPosition::Top)
                .map(|dims| dims.advance.x.max(0) as u32)
                .unwrap_or(0),
        }
    }

    /// Height of one unspaced line in pixels.
    pub fn line_height(&self) -> u32 {
        match self {
            FontFace::Mono(font) => font.character_size.height,
            FontFace::U8g2 { line_height, .. } => *line_height,
        }
    }

    /// Draw `text` with its top-left corner at `top_left`.
    ///
    /// Glyphs missing from the face are skipped; only display errors
    /// propagate.
    pub fn draw<D>(
        &self,
        text: &str,
        top_left: Point,
        color: Rgba,
        target: &mut D,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        match self {
            FontFace::Mono(font) => {
                let style = MonoTextStyle::new(*font, color.to_rgb888());
                Text::with_baseline(text, top_left, style, Baseline::Top).draw(target)?;
                Ok(())
            }
            FontFace::U8g2 { renderer, .. } => match renderer.render(
                text,
                top_left,
                VerticalPosition::Top,
                FontColor::Transparent(color.to_rgb888()),
                target,
            ) {
                Ok(_) => Ok(()),
                Err(u8g2_fonts::Error::DisplayError(e)) => Err(e),
                Err(_) => {
                    debug!("u8g2 render skipped unsupported text");
                    Ok(())
                }
            },
        }
    }

    /// Draw `text` so that it ends at `right_x`.
    pub fn draw_right_aligned<D>(
        &self,
        text: &str,
        right_x: i32,
        top: i32,
        color: Rgba,
        target: &mut D,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let x = right_x - self.measure(text) as i32;
        self.draw(text, Point::new(x, top), color, target)
    }
}

/// Font names usable from page configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontId {
    /// 6x10 mono
    Small,
    /// 8x13 mono
    #[default]
    Medium,
    /// 10x20 mono
    Large,
    /// WenQuanYi 12px (Han, kana, ASCII)
    Cjk,
}

impl FontId {
    pub fn face(self) -> FontFace {
        match self {
            FontId::Small => FontFace::Mono(&FONT_6X10),
            FontId::Medium => FontFace::Mono(&FONT_8X13),
            FontId::Large => FontFace::Mono(&FONT_10X20),
            FontId::Cjk => FontFace::U8g2 {
                renderer: &CJK_RENDERER,
                line_height: CJK_LINE_HEIGHT_PX,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_measure_is_cell_based() {
        let face = FontId::Small.face();
        assert_eq!(face.measure(""), 0);
        assert_eq!(face.measure("a"), 6);
        assert_eq!(face.measure("abcd"), 24);
        assert_eq!(face.line_height(), 10);
    }

    #[test]
    fn right_alignment_ends_at_margin() {
        use crate::graphics::FrameBuffer;

        let mut fb = FrameBuffer::new(40, 12, Rgba::BLACK);
        let face = FontId::Small.face();
        face.draw_right_aligned("ll", 40, 0, Rgba::WHITE, &mut fb).unwrap();

        let lit_columns: Vec<u32> = (0..40)
            .filter(|&x| (0..12).any(|y| fb.pixel(x, y) == Some(Rgba::WHITE)))
            .collect();
        assert!(!lit_columns.is_empty());
        assert!(*lit_columns.first().unwrap() >= 28);
    }
}
