//! RGBA pixel type, alpha blending and the panel palette
//!
//! Region framebuffers store straight (non-premultiplied) 8-bit RGBA. Every
//! `embedded-graphics` draw lands as an opaque [`Rgb888`]; translucency only
//! enters through [`Rgba::blend`], which the graph background and the
//! placeholder overlays use.

use embedded_graphics::pixelcolor::{Rgb565, Rgb888, RgbColor};

/// 8-bit straight-alpha pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const WHITE: Self = Self::opaque(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Same colour with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Composite `fg` over `bg` ("source over").
    ///
    /// Colour channels are weighted by the foreground alpha; the output
    /// alpha is `fa + ba * (1 - fa)`, so an opaque background stays opaque.
    pub fn blend(bg: Self, fg: Self) -> Self {
        match fg.a {
            0 => return bg,
            255 => return fg,
            _ => {}
        }

        let fa = u32::from(fg.a);
        let inv = 255 - fa;
        let channel = |b: u8, f: u8| -> u8 {
            // Integer lerp, rounded to nearest.
            ((u32::from(f) * fa + u32::from(b) * inv + 127) / 255) as u8
        };
        let alpha = fa + (u32::from(bg.a) * inv + 127) / 255;

        Self {
            r: channel(bg.r, fg.r),
            g: channel(bg.g, fg.g),
            b: channel(bg.b, fg.b),
            a: alpha.min(255) as u8,
        }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the leading `#` is optional).
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::opaque(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Drop alpha for `embedded-graphics` primitives.
    pub const fn to_rgb888(self) -> Rgb888 {
        Rgb888::new(self.r, self.g, self.b)
    }

    /// Pack for 16-bit panels.
    pub fn to_rgb565(self) -> Rgb565 {
        Rgb565::from(self.to_rgb888())
    }
}

impl From<Rgb888> for Rgba {
    fn from(color: Rgb888) -> Self {
        Self::opaque(color.r(), color.g(), color.b())
    }
}

impl From<Rgba> for Rgb888 {
    fn from(color: Rgba) -> Self {
        color.to_rgb888()
    }
}

// ============================================================================
// Panel palette
// ============================================================================

/// Background behind every region.
pub const COLOR_BACKGROUND: Rgba = Rgba::opaque(12, 16, 20);

/// Status bar fill.
pub const COLOR_BAR: Rgba = Rgba::opaque(24, 30, 38);

/// Primary text.
pub const COLOR_TEXT: Rgba = Rgba::opaque(230, 233, 236);

/// Secondary text (dates, labels).
pub const COLOR_TEXT_DIM: Rgba = Rgba::opaque(140, 148, 156);

/// Accent for the active page dot and highlighted values.
pub const COLOR_ACCENT: Rgba = Rgba::opaque(64, 170, 230);

/// Inactive page dots and outlines.
pub const COLOR_MUTED: Rgba = Rgba::opaque(70, 78, 88);

/// Title colour for messages we sent.
pub const COLOR_MSG_OUTGOING: Rgba = Rgba::opaque(110, 200, 140);

/// Title colour for messages we received.
pub const COLOR_MSG_INCOMING: Rgba = Rgba::opaque(90, 170, 240);

/// Power graph: battery discharging (positive wattage).
pub const COLOR_DISCHARGE: Rgba = Rgba::opaque(235, 130, 60);

/// Power graph: battery charging (negative wattage).
pub const COLOR_CHARGE: Rgba = Rgba::opaque(80, 200, 110);

/// Power graph: segments near zero.
pub const COLOR_NEUTRAL: Rgba = Rgba::opaque(170, 170, 170);

/// Translucent panel placed behind graphs.
pub const COLOR_GRAPH_BACKDROP: Rgba = Rgba::new(0, 0, 0, 150);

/// Warning glyphs (low battery, no signal).
pub const COLOR_WARNING: Rgba = Rgba::opaque(220, 80, 70);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_white_over_black_is_mid_grey() {
        let out = Rgba::blend(Rgba::new(0, 0, 0, 255), Rgba::new(255, 255, 255, 128));
        for channel in [out.r, out.g, out.b] {
            assert!((127..=128).contains(&channel), "channel = {channel}");
        }
        assert_eq!(out.a, 255);
    }

    #[test]
    fn blend_extremes_short_circuit() {
        let bg = Rgba::opaque(10, 20, 30);
        let fg = Rgba::opaque(200, 100, 50);
        assert_eq!(Rgba::blend(bg, fg), fg);
        assert_eq!(Rgba::blend(bg, fg.with_alpha(0)), bg);
    }

    #[test]
    fn blend_over_transparent_keeps_foreground_alpha() {
        let out = Rgba::blend(Rgba::TRANSPARENT, Rgba::new(255, 0, 0, 100));
        assert_eq!(out.a, 100);
    }

    #[test]
    fn parses_hex_colours() {
        assert_eq!(Rgba::from_hex("#ff8000"), Some(Rgba::opaque(255, 128, 0)));
        assert_eq!(Rgba::from_hex("10203040"), Some(Rgba::new(16, 32, 48, 64)));
        assert_eq!(Rgba::from_hex("#fff"), None);
        assert_eq!(Rgba::from_hex("#gg0000"), None);
    }
}
