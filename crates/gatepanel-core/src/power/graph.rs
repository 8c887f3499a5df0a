//! Signed wattage line graph.

use super::history::PowerSample;
use crate::graphics::color::{
    COLOR_CHARGE, COLOR_DISCHARGE, COLOR_GRAPH_BACKDROP, COLOR_MUTED, COLOR_NEUTRAL,
};
use crate::graphics::line::{blend_hline, draw_line};
use crate::graphics::{FrameBuffer, PixelRect, Rgba};

/// Minimum vertical span in watts.
const MIN_RANGE_W: f64 = 2.0;

/// Segments whose mean is within this of zero use the neutral colour.
const NEUTRAL_BAND_W: f64 = 0.05;

/// Backdrop used when there is nothing to plot.
const PLACEHOLDER_BACKDROP: Rgba = Rgba::new(0, 0, 0, 80);

/// Value range of the plot: always contains zero and spans at least
/// [`MIN_RANGE_W`], widened symmetrically around its midpoint.
pub fn graph_range(samples: &[PowerSample]) -> (f64, f64) {
    let (lo, hi) = samples
        .iter()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), s| (lo.min(s.wattage), hi.max(s.wattage)));

    if hi - lo < MIN_RANGE_W {
        let mid = (hi + lo) / 2.0;
        (mid - MIN_RANGE_W / 2.0, mid + MIN_RANGE_W / 2.0)
    } else {
        (lo, hi)
    }
}

/// Colour of the segment between two readings.
pub fn segment_color(a: f64, b: f64) -> Rgba {
    let mean = (a + b) / 2.0;
    if mean > NEUTRAL_BAND_W {
        COLOR_DISCHARGE
    } else if mean < -NEUTRAL_BAND_W {
        COLOR_CHARGE
    } else {
        COLOR_NEUTRAL
    }
}

/// Plot `samples` (oldest first) inside the `width x height` box at `(x, y)`.
///
/// With fewer than two samples only a dim backdrop and a centred zero line
/// are drawn.
pub fn draw_samples(
    fb: &mut FrameBuffer,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    samples: &[PowerSample],
) {
    if width < 2 || height < 2 {
        return;
    }
    let area = clip_rect(x, y, width, height);
    let right = x + width as i32 - 1;

    if samples.len() < 2 {
        fb.blend_rect(area, PLACEHOLDER_BACKDROP);
        blend_hline(fb, x, right, y + height as i32 / 2, COLOR_MUTED);
        return;
    }

    let (min, max) = graph_range(samples);
    let range = max - min;

    fb.blend_rect(area, COLOR_GRAPH_BACKDROP);

    let x_span = f64::from(width - 1);
    let y_span = f64::from(height - 1);

    // Same scale as the samples so a 0 W reading lands on this row.
    let zero_y = y + ((y_span * max / range).round() as i32).clamp(0, height as i32 - 1);
    blend_hline(fb, x, right, zero_y, COLOR_MUTED);

    let first = samples[0].timestamp;
    let span_ms = (samples[samples.len() - 1].timestamp - first).num_milliseconds();
    let last_index = (samples.len() - 1) as f64;

    let point = |i: usize, s: &PowerSample| -> (i32, i32) {
        let fx = if span_ms > 0 {
            (s.timestamp - first).num_milliseconds() as f64 / span_ms as f64
        } else {
            i as f64 / last_index
        };
        let fy = (max - s.wattage) / range;
        (
            x + (fx * x_span).round() as i32,
            y + (fy * y_span).round() as i32,
        )
    };

    for (i, pair) in samples.windows(2).enumerate() {
        let (x0, y0) = point(i, &pair[0]);
        let (x1, y1) = point(i + 1, &pair[1]);
        draw_line(fb, x0, y0, x1, y1, segment_color(pair[0].wattage, pair[1].wattage));
    }
}

fn clip_rect(x: i32, y: i32, width: u32, height: u32) -> PixelRect {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + width as i32).max(x0);
    let y1 = (y + height as i32).max(y0);
    PixelRect::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
}
