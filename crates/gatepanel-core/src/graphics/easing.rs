//! Easing curves for the page-transition slide.

/// Quartic ease-out: fast start, gentle landing. `t` is clamped to `[0, 1]`.
#[inline]
pub fn ease_out_quart(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv * inv
}

/// Horizontal crop offset for animation step `step` of `steps`.
///
/// `t = step / steps`, so the sequence starts at 0 and approaches (but for
/// `step < steps` never reaches) `width`.
pub fn transition_offset(step: u32, steps: u32, width: u32) -> u32 {
    if steps == 0 {
        return width;
    }
    let t = step as f32 / steps as f32;
    let offset = (ease_out_quart(t) * width as f32).round();
    (offset.max(0.0) as u32).min(width)
}

/// Step at which the logical current page flips to the incoming page.
pub const fn flip_step(steps: u32) -> u32 {
    steps / 2
}
