//! Top bar and footer renderers.

use core::fmt::Write as _;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle};

use super::icons;
use super::store::{
    DataStore, KEY_BATTERY_PERCENT, KEY_CHARGING, KEY_CLOCK, KEY_NETWORK, KEY_SIGNAL_BARS,
};
use crate::font::FontId;
use crate::graphics::FrameBuffer;
use crate::graphics::color::{
    COLOR_ACCENT, COLOR_BACKGROUND, COLOR_BAR, COLOR_CHARGE, COLOR_MUTED, COLOR_TEXT,
    COLOR_TEXT_DIM,
};

const EDGE_PX: i32 = 6;
const ICON_PX: u32 = 10;

/// Footer shows one dot per page up to this count, then `N/total`.
pub const MAX_FOOTER_DOTS: usize = 16;
const DOT_PX: u32 = 6;
const DOT_GAP_PX: u32 = 6;

/// Clock and network label on the left; signal bars, charge bolt and
/// battery gauge on the right.
pub fn render_status_bar(fb: &mut FrameBuffer, store: &DataStore) {
    fb.fill(COLOR_BAR);
    let font = FontId::Medium.face();
    let text_y = (fb.height() as i32 - font.line_height() as i32) / 2;
    let icon_y = (fb.height() as i32 - ICON_PX as i32) / 2;

    let clock = store.get(KEY_CLOCK).unwrap_or_else(|| "--:--".into());
    let Ok(()) = font.draw(&clock, Point::new(EDGE_PX, text_y), COLOR_TEXT, fb);

    if let Some(network) = store.get(KEY_NETWORK) {
        let x = EDGE_PX + font.measure(&clock) as i32 + 12;
        let Ok(()) = font.draw(&network, Point::new(x, text_y), COLOR_TEXT_DIM, fb);
    }

    // Right-to-left: battery, percentage, bolt, signal.
    let mut x = fb.width() as i32 - EDGE_PX - 2 * ICON_PX as i32;
    let percent = store.get_parsed::<u8>(KEY_BATTERY_PERCENT);
    let charging = store.get_flag(KEY_CHARGING);
    let Ok(()) = icons::draw_battery(fb, Point::new(x, icon_y), ICON_PX, percent, charging, COLOR_TEXT);

    if let Some(percent) = percent {
        let mut label: heapless::String<8> = heapless::String::new();
        if write!(label, "{}%", percent.min(100)).is_ok() {
            let small = FontId::Small.face();
            let small_y = (fb.height() as i32 - small.line_height() as i32) / 2;
            x -= 4;
            let Ok(()) = small.draw_right_aligned(&label, x, small_y, COLOR_TEXT_DIM, fb);
            x -= small.measure(&label) as i32;
        }
    }

    if charging {
        x -= ICON_PX as i32 + 2;
        let Ok(()) = icons::draw_bolt(fb, Point::new(x, icon_y), ICON_PX, COLOR_CHARGE);
    }

    if let Some(bars) = store.get_parsed::<u8>(KEY_SIGNAL_BARS) {
        x -= 18;
        let Ok(()) = icons::draw_signal(fb, Point::new(x, icon_y), ICON_PX, Some(bars), COLOR_TEXT);
    }
}

/// Page indicator for page `current` (0-based) of `total`.
pub fn render_footer(fb: &mut FrameBuffer, current: usize, total: usize) {
    fb.fill(COLOR_BACKGROUND);
    if total == 0 {
        return;
    }

    if total <= MAX_FOOTER_DOTS {
        let span = total as u32 * DOT_PX + (total as u32 - 1) * DOT_GAP_PX;
        let x0 = (fb.width() as i32 - span as i32) / 2;
        let y = (fb.height() as i32 - DOT_PX as i32) / 2;
        for i in 0..total {
            let origin = Point::new(x0 + (i as u32 * (DOT_PX + DOT_GAP_PX)) as i32, y);
            let style = if i == current {
                PrimitiveStyle::with_fill(COLOR_ACCENT.to_rgb888())
            } else {
                PrimitiveStyle::with_fill(COLOR_MUTED.to_rgb888())
            };
            let Ok(()) = Circle::new(origin, DOT_PX).into_styled(style).draw(fb);
        }
    } else {
        let mut label: heapless::String<16> = heapless::String::new();
        if write!(label, "{}/{}", current + 1, total).is_ok() {
            let font = FontId::Small.face();
            let x = (fb.width() as i32 - font.measure(&label) as i32) / 2;
            let y = (fb.height() as i32 - font.line_height() as i32) / 2;
            let Ok(()) = font.draw(&label, Point::new(x, y), COLOR_TEXT_DIM, fb);
        }
    }
}
