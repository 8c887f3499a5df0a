//! Status glyphs built from `embedded-graphics` primitives.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle, Triangle};

use crate::graphics::Rgba;
use crate::graphics::color::{COLOR_CHARGE, COLOR_MUTED, COLOR_WARNING};

/// Battery level below which the gauge turns to the warning colour.
const LOW_BATTERY_PERCENT: u8 = 20;

/// Icon names accepted by page configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Battery,
    Signal,
    Dot,
    Bolt,
    Warning,
}

impl IconKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "battery" => Some(IconKind::Battery),
            "signal" => Some(IconKind::Signal),
            "dot" => Some(IconKind::Dot),
            "bolt" => Some(IconKind::Bolt),
            "warning" => Some(IconKind::Warning),
            _ => None,
        }
    }
}

/// Battery gauge `2 * height` wide; `None` draws an empty outline.
pub fn draw_battery<D>(
    target: &mut D,
    top_left: Point,
    height: u32,
    percent: Option<u8>,
    charging: bool,
    color: Rgba,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let height = height.max(6);
    let width = height * 2;
    let outline = if percent.is_some() { color } else { COLOR_MUTED };

    Rectangle::new(top_left, Size::new(width - 2, height))
        .into_styled(PrimitiveStyle::with_stroke(outline.to_rgb888(), 1))
        .draw(target)?;
    Rectangle::new(
        top_left + Point::new(width as i32 - 2, height as i32 / 4),
        Size::new(2, height / 2),
    )
    .into_styled(PrimitiveStyle::with_fill(outline.to_rgb888()))
    .draw(target)?;

    if let Some(percent) = percent {
        let percent = percent.min(100);
        let fill_w = (width - 6) * u32::from(percent) / 100;
        let fill = if percent < LOW_BATTERY_PERCENT {
            COLOR_WARNING
        } else if charging {
            COLOR_CHARGE
        } else {
            color
        };
        if fill_w > 0 {
            Rectangle::new(top_left + Point::new(2, 2), Size::new(fill_w, height - 4))
                .into_styled(PrimitiveStyle::with_fill(fill.to_rgb888()))
                .draw(target)?;
        }
    }
    Ok(())
}

/// Four ascending bars; bars beyond `bars` are drawn muted.
pub fn draw_signal<D>(
    target: &mut D,
    top_left: Point,
    height: u32,
    bars: Option<u8>,
    color: Rgba,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let bar_w = (height / 4).max(2);
    let lit = bars.unwrap_or(0).min(4);
    for i in 0..4u32 {
        let bar_h = (height * (i + 1) / 4).max(1);
        let origin = top_left + Point::new((i * (bar_w + 1)) as i32, (height - bar_h) as i32);
        let fill = if i < u32::from(lit) { color } else { COLOR_MUTED };
        Rectangle::new(origin, Size::new(bar_w, bar_h))
            .into_styled(PrimitiveStyle::with_fill(fill.to_rgb888()))
            .draw(target)?;
    }
    Ok(())
}

/// Filled dot when `on`, muted ring otherwise.
pub fn draw_dot<D>(target: &mut D, top_left: Point, size: u32, on: bool, color: Rgba) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let style = if on {
        PrimitiveStyle::with_fill(color.to_rgb888())
    } else {
        PrimitiveStyle::with_stroke(COLOR_MUTED.to_rgb888(), 1)
    };
    Circle::new(top_left, size).into_styled(style).draw(target)
}

/// Lightning bolt inside a `size` square.
pub fn draw_bolt<D>(target: &mut D, top_left: Point, size: u32, color: Rgba) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let s = size.max(4) as i32;
    let style = PrimitiveStyle::with_fill(color.to_rgb888());
    Triangle::new(
        top_left + Point::new(s * 3 / 5, 0),
        top_left + Point::new(s / 5, s * 3 / 5),
        top_left + Point::new(s / 2, s * 3 / 5),
    )
    .into_styled(style)
    .draw(target)?;
    Triangle::new(
        top_left + Point::new(s / 2, s * 2 / 5),
        top_left + Point::new(s * 4 / 5, s * 2 / 5),
        top_left + Point::new(s * 2 / 5, s),
    )
    .into_styled(style)
    .draw(target)
}

/// Warning triangle with an exclamation stroke.
pub fn draw_warning<D>(target: &mut D, top_left: Point, size: u32, color: Rgba) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let s = size.max(6) as i32;
    Triangle::new(
        top_left + Point::new(s / 2, 0),
        top_left + Point::new(0, s - 1),
        top_left + Point::new(s - 1, s - 1),
    )
    .into_styled(PrimitiveStyle::with_stroke(color.to_rgb888(), 1))
    .draw(target)?;
    Line::new(
        top_left + Point::new(s / 2, s / 3),
        top_left + Point::new(s / 2, s * 2 / 3),
    )
    .into_styled(PrimitiveStyle::with_stroke(color.to_rgb888(), 1))
    .draw(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::FrameBuffer;

    #[test]
    fn names_map_to_kinds() {
        assert_eq!(IconKind::from_name("battery"), Some(IconKind::Battery));
        assert_eq!(IconKind::from_name("Battery"), None);
        assert_eq!(IconKind::from_name("rocket"), None);
    }

    #[test]
    fn battery_fill_tracks_percent() {
        let white = Rgba::WHITE;
        let mut full = FrameBuffer::new(40, 20, Rgba::BLACK);
        draw_battery(&mut full, Point::zero(), 12, Some(100), false, white).unwrap();
        let mut low = FrameBuffer::new(40, 20, Rgba::BLACK);
        draw_battery(&mut low, Point::zero(), 12, Some(10), false, white).unwrap();

        // Inner fill starts at (2, 2); full spans 18 px, low shows warning.
        assert_eq!(full.pixel(19, 5), Some(white));
        assert_eq!(low.pixel(2, 5), Some(COLOR_WARNING));
        assert_eq!(low.pixel(10, 5), Some(Rgba::BLACK));
    }

    #[test]
    fn signal_lights_requested_bars() {
        let color = Rgba::opaque(0, 200, 0);
        let mut fb = FrameBuffer::new(20, 12, Rgba::BLACK);
        draw_signal(&mut fb, Point::zero(), 12, Some(2), color).unwrap();
        // Bar width 3, gap 1: bar 1 at x = 4, bar 2 at x = 8.
        assert_eq!(fb.pixel(4, 11), Some(color));
        assert_eq!(fb.pixel(8, 11), Some(COLOR_MUTED));
    }
}
