//! Battery power page: live wattage readout above the history graph.

use core::fmt::Write as _;

use embedded_graphics::prelude::*;

use crate::font::FontId;
use crate::graphics::FrameBuffer;
use crate::graphics::color::{
    COLOR_BACKGROUND, COLOR_CHARGE, COLOR_DISCHARGE, COLOR_TEXT, COLOR_TEXT_DIM,
};
use crate::power::PowerHistory;

const MARGIN_PX: i32 = 8;
const HEADER_PX: i32 = 28;
const NO_READING: &str = "-- W";

/// `+1.5 W`; `None` when the value does not fit the readout.
fn format_readout(watts: f64) -> Option<heapless::String<24>> {
    let mut readout = heapless::String::new();
    write!(readout, "{watts:+.1} W").ok()?;
    Some(readout)
}

pub fn render_power_page(fb: &mut FrameBuffer, history: &PowerHistory) {
    fb.fill(COLOR_BACKGROUND);
    let title = FontId::Medium.face();
    let small = FontId::Small.face();
    let right = fb.width() as i32 - MARGIN_PX;

    let Ok(()) = title.draw("Battery power", Point::new(MARGIN_PX, MARGIN_PX), COLOR_TEXT, fb);

    let latest = history.latest().map(|sample| sample.wattage);
    let readout = latest.and_then(format_readout);
    let color = match (latest, &readout) {
        (Some(watts), Some(_)) if watts < 0.0 => COLOR_CHARGE,
        (Some(_), Some(_)) => COLOR_DISCHARGE,
        _ => COLOR_TEXT_DIM,
    };
    let text = readout.as_deref().unwrap_or(NO_READING);
    let Ok(()) = title.draw_right_aligned(text, right, MARGIN_PX, color, fb);

    let mut window: heapless::String<16> = heapless::String::new();
    if write!(window, "last {} min", history.time_frame_mins()).is_ok() {
        let y = fb.height() as i32 - MARGIN_PX - small.line_height() as i32;
        let Ok(()) = small.draw_right_aligned(&window, right, y, COLOR_TEXT_DIM, fb);
    }

    let graph_top = MARGIN_PX + HEADER_PX;
    let graph_h = fb.height() as i32 - graph_top - 2 * MARGIN_PX - small.line_height() as i32;
    let graph_w = fb.width() as i32 - 2 * MARGIN_PX;
    if graph_h > 1 && graph_w > 1 {
        history.draw_graph(fb, MARGIN_PX, graph_top, graph_w as u32, graph_h as u32);
    }
}
