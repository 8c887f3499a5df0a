//! Page packing and rendering for message threads.

use core::fmt::Write as _;

use chrono::NaiveDateTime;
use embedded_graphics::prelude::Point;

use super::model::{Direction, Message, Title};
use super::wrap::wrap_text;
use crate::font::{FontFace, FontId};
use crate::graphics::FrameBuffer;
use crate::graphics::color::{
    COLOR_BACKGROUND, COLOR_MSG_INCOMING, COLOR_MSG_OUTGOING, COLOR_TEXT, COLOR_TEXT_DIM,
};

const PAGE_MARGIN_PX: u32 = 6;

/// One row of a message page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutLine {
    Title(Title, Direction),
    Body(String),
    Spacer,
}

/// Geometry and fonts of a message page.
#[derive(Debug, Clone, Copy)]
pub struct PageMetrics {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub line_spacing: f32,
    pub show_footer: bool,
    pub body_font: FontFace,
    pub footer_font: FontFace,
}

impl PageMetrics {
    pub fn new(width: u32, height: u32, line_spacing: f32, show_footer: bool) -> Self {
        Self {
            width,
            height,
            margin: PAGE_MARGIN_PX,
            line_spacing,
            show_footer,
            body_font: FontId::Cjk.face(),
            footer_font: FontId::Small.face(),
        }
    }

    /// Vertical advance of one layout line.
    pub fn line_pitch(&self) -> u32 {
        ((self.body_font.line_height() as f32 * self.line_spacing).ceil() as u32).max(1)
    }

    /// Height available to layout lines.
    pub fn usable_height(&self) -> u32 {
        let footer = if self.show_footer {
            self.footer_font.line_height() + self.margin / 2
        } else {
            0
        };
        self.height.saturating_sub(2 * self.margin + footer)
    }

    /// Width available to body text.
    pub fn text_width(&self) -> u32 {
        self.width.saturating_sub(2 * self.margin)
    }
}

struct Packer {
    pages: Vec<Vec<LayoutLine>>,
    current: Vec<LayoutLine>,
    used: u32,
    pitch: u32,
    usable: u32,
}

impl Packer {
    fn fits(&self, lines: u32) -> bool {
        self.used + lines * self.pitch <= self.usable
    }

    fn push(&mut self, line: LayoutLine) {
        self.current.push(line);
        self.used += self.pitch;
    }

    fn open_page(&mut self) {
        if !self.current.is_empty() {
            self.pages.push(core::mem::take(&mut self.current));
        }
        self.used = 0;
    }
}

/// Pack `messages` (newest first) into pages of layout lines.
///
/// A message title is never left alone at the bottom of a page, and a
/// message continued on the next page repeats its title there. An empty
/// thread yields one empty page.
pub fn pack_pages(
    messages: &[Message],
    metrics: &PageMetrics,
    now: NaiveDateTime,
) -> Vec<Vec<LayoutLine>> {
    let font = metrics.body_font;
    let mut packer = Packer {
        pages: Vec::new(),
        current: Vec::new(),
        used: 0,
        pitch: metrics.line_pitch(),
        usable: metrics.usable_height(),
    };

    for message in messages {
        let title = LayoutLine::Title(Title::new(message, now), message.direction);
        let body = wrap_text(&message.content, metrics.text_width(), |s| font.measure(s));

        let needed = if body.is_empty() { 1 } else { 2 };
        if !packer.current.is_empty() && !packer.fits(needed) {
            packer.open_page();
        }
        packer.push(title.clone());

        for line in body {
            if !packer.fits(1) {
                packer.open_page();
                packer.push(title.clone());
            }
            packer.push(LayoutLine::Body(line));
        }

        if packer.fits(1) {
            packer.push(LayoutLine::Spacer);
        }
    }

    packer.open_page();
    if packer.pages.is_empty() {
        packer.pages.push(Vec::new());
    }
    packer.pages
}

/// Draw one packed page; `page_no` is 1-based.
pub fn render_page(
    lines: &[LayoutLine],
    metrics: &PageMetrics,
    page_no: usize,
    total: usize,
) -> FrameBuffer {
    let mut fb = FrameBuffer::new(metrics.width, metrics.height, COLOR_BACKGROUND);
    let font = metrics.body_font;
    let left = metrics.margin as i32;
    let right = metrics.width.saturating_sub(metrics.margin) as i32;
    let pitch = metrics.line_pitch() as i32;

    if lines.is_empty() {
        let text = "No messages";
        let x = (metrics.width as i32 - font.measure(text) as i32) / 2;
        let y = (metrics.height as i32 - font.line_height() as i32) / 2;
        let Ok(()) = font.draw(text, Point::new(x, y), COLOR_TEXT_DIM, &mut fb);
    }

    let mut y = metrics.margin as i32;
    for line in lines {
        match line {
            LayoutLine::Title(title, direction) => {
                let color = if direction.is_outgoing() {
                    COLOR_MSG_OUTGOING
                } else {
                    COLOR_MSG_INCOMING
                };
                let Ok(()) = font.draw(&title.sender, Point::new(left, y), color, &mut fb);
                let Ok(()) = font.draw_right_aligned(&title.date, right, y, COLOR_TEXT_DIM, &mut fb);
            }
            LayoutLine::Body(text) => {
                let Ok(()) = font.draw(text, Point::new(left, y), COLOR_TEXT, &mut fb);
            }
            LayoutLine::Spacer => {}
        }
        y += pitch;
    }

    if metrics.show_footer && total > 0 {
        let mut label: heapless::String<16> = heapless::String::new();
        if write!(label, "{page_no}/{total}").is_ok() {
            let footer = metrics.footer_font;
            let top =
                metrics.height as i32 - (metrics.margin / 2) as i32 - footer.line_height() as i32;
            let Ok(()) = footer.draw_right_aligned(&label, right, top, COLOR_TEXT_DIM, &mut fb);
        }
    }

    fb
}

/// Pack and render a whole thread.
pub fn render_thread(
    messages: &[Message],
    metrics: &PageMetrics,
    now: NaiveDateTime,
) -> Vec<FrameBuffer> {
    let pages = pack_pages(messages, metrics, now);
    let total = pages.len();
    pages
        .iter()
        .enumerate()
        .map(|(i, lines)| render_page(lines, metrics, i + 1, total))
        .collect()
}
