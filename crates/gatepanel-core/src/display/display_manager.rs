//! Display manager: the render loop and animated page transitions.
//!
//! The manager is the single owner of every region buffer. Each cycle draws
//! the top bar, the middle region and the footer in that order, composites
//! them into the screen buffer and pushes it through the [`DisplaySink`].
//! A page change slides a crop window across `[outgoing | incoming]` with a
//! quartic ease-out.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use embedded_graphics::prelude::*;
use log::{debug, error, info, warn};

use super::page::render_page;
use super::page_manager::{PageManager, PageRef};
use super::pacing::{FpsCounter, pacing_sleep};
use super::power_page::render_power_page;
use super::regions::RegionBuffers;
use super::status::{render_footer, render_status_bar};
use super::store::DataStore;
use super::DisplaySink;
use crate::backlight::PanelState;
use crate::config::{DisplayConfig, PanelConfig};
use crate::font::FontId;
use crate::graphics::color::{COLOR_BACKGROUND, COLOR_BAR, COLOR_GRAPH_BACKDROP, COLOR_TEXT};
use crate::graphics::easing::{flip_step, transition_offset};
use crate::graphics::{FrameBuffer, PixelRect};
use crate::messages::MessageBoard;
use crate::power::PowerHistory;

/// Shared resources the render loop reads.
#[derive(Clone)]
pub struct PanelResources {
    pub store: Arc<DataStore>,
    pub panel: Arc<PanelState>,
    pub history: Arc<PowerHistory>,
    pub board: Arc<MessageBoard>,
}

/// Owns the display sink and all region buffers.
pub struct DisplayManager<S> {
    sink: S,
    config: DisplayConfig,
    resources: PanelResources,
    pages: PageManager,
    top: RegionBuffers,
    middle: RegionBuffers,
    footer: RegionBuffers,
    screen: FrameBuffer,
    fps: FpsCounter,
    last_page_change: Instant,
    in_transition: bool,
}

impl<S: DisplaySink> DisplayManager<S> {
    pub fn new(sink: S, config: &PanelConfig, resources: PanelResources, now: Instant) -> Self {
        let d = config.display.clone();
        let middle_h = d.middle_height();
        Self {
            sink,
            top: RegionBuffers::new(d.width, d.top_bar_height, 0, COLOR_BAR),
            middle: RegionBuffers::new(d.width, middle_h, d.top_bar_height, COLOR_BACKGROUND),
            footer: RegionBuffers::new(
                d.width,
                d.footer_height,
                d.top_bar_height + middle_h,
                COLOR_BACKGROUND,
            ),
            screen: FrameBuffer::new(d.width, d.height, COLOR_BACKGROUND),
            pages: PageManager::new(config.pages.clone(), config.power.show_page),
            fps: FpsCounter::new(now),
            last_page_change: now,
            in_transition: false,
            resources,
            config: d,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn current_page(&mut self) -> usize {
        let messages = self.resources.board.page_count();
        self.pages.current(messages)
    }

    pub fn page_count(&self) -> usize {
        self.pages.page_count(self.resources.board.page_count())
    }

    pub fn is_transitioning(&self) -> bool {
        self.in_transition
    }

    /// One ordinary frame: top bar, middle, footer, composite, push.
    pub fn run_cycle(&mut self, now: Instant) {
        let messages = self.resources.board.pages();
        let index = self.pages.current(messages.len());
        let total = self.pages.page_count(messages.len());

        render_status_bar(self.top.begin(), &self.resources.store);

        let page = self.pages.resolve(index, messages.len());
        let middle = self.middle.begin();
        draw_middle(&self.pages, &self.resources, &messages, page, middle);
        if self.config.show_fps {
            draw_fps_overlay(middle, self.fps.fps());
        }

        render_footer(self.footer.begin(), index, total);

        let top_y = self.top.y();
        let middle_y = self.middle.y();
        let footer_y = self.footer.y();
        composite_region(&mut self.screen, self.top.finish(), top_y, "top bar");
        composite_region(&mut self.screen, self.middle.finish(), middle_y, "middle");
        composite_region(&mut self.screen, self.footer.finish(), footer_y, "footer");

        self.push_screen(now);
    }

    /// Slide from the current page to page `to`.
    ///
    /// The current-page pointer flips to `to` at step `N / 2`, so the footer
    /// indicator changes mid-slide.
    pub fn transition(&mut self, to: usize, now: Instant) {
        let messages = self.resources.board.pages();
        let total = self.pages.page_count(messages.len());
        let from = self.pages.current(messages.len());
        if to == from || to >= total {
            return;
        }

        info!("Page transition {} -> {}", from, to);
        self.in_transition = true;
        self.last_page_change = now;

        let incoming = self.pages.resolve(to, messages.len());
        draw_middle(&self.pages, &self.resources, &messages, incoming, self.middle.begin());
        self.middle.finish();

        let stitched = match FrameBuffer::stitch_horizontal(self.middle.back(), self.middle.front()) {
            Ok(stitched) => stitched,
            Err(e) => {
                warn!("Transition skipped: {}", e);
                self.pages.set_current(to);
                self.in_transition = false;
                return;
            }
        };

        let steps = self.config.transition_steps.max(1);
        let width = self.config.width;
        let height = self.middle.front().height();
        let flip = flip_step(steps);

        for step in 0..steps {
            if step == flip {
                self.pages.set_current(to);
            }
            let offset = transition_offset(step, steps, width);
            let mut frame = match stitched.crop(PixelRect::new(offset, 0, width, height)) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Transition step {} skipped: {}", step, e);
                    continue;
                }
            };
            if self.config.show_fps {
                draw_fps_overlay(&mut frame, self.fps.fps());
            }

            let current = self.pages.current(messages.len());
            render_footer(self.footer.begin(), current, total);

            let top_y = self.top.y();
            let middle_y = self.middle.y();
            let footer_y = self.footer.y();
            composite_region(&mut self.screen, self.top.front(), top_y, "top bar");
            composite_region(&mut self.screen, &frame, middle_y, "middle");
            composite_region(&mut self.screen, self.footer.finish(), footer_y, "footer");

            self.push_screen(Instant::now());
        }

        self.pages.set_current(to);
        self.in_transition = false;
    }

    /// One loop iteration. Returns whether a transition ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        let messages = self.resources.board.page_count();
        let rotate_due = self.config.rotate_interval().is_some_and(|every| {
            now.saturating_duration_since(self.last_page_change) >= every
                && !self.resources.panel.dimmer_state().is_dimmed()
        });

        if self.resources.panel.take_transition_request() || rotate_due {
            let next = self.pages.next_index(messages);
            if next != self.pages.current(messages) {
                self.transition(next, now);
                return true;
            }
            self.last_page_change = now;
        }

        self.run_cycle(now);
        false
    }

    /// Render forever at the frame rate published by the dimmer.
    pub fn run(&mut self) -> ! {
        info!(
            "Display manager started ({}x{}, {} pages)",
            self.config.width,
            self.config.height,
            self.page_count()
        );
        loop {
            let started = Instant::now();
            let transitioned = self.tick(started);
            if transitioned {
                continue;
            }
            let target = self.resources.panel.target_fps();
            if let Some(sleep) = pacing_sleep(target, self.config.safety_factor, started.elapsed()) {
                thread::sleep(sleep);
            }
        }
    }

    fn push_screen(&mut self, now: Instant) {
        let (w, h) = (self.screen.width(), self.screen.height());
        if let Err(e) = self.sink.push(0, 0, w, h, self.screen.pixels()) {
            error!("Display push failed: {}", e);
        }
        self.fps.frame(now);
    }
}

fn composite_region(screen: &mut FrameBuffer, region: &FrameBuffer, y: u32, name: &str) {
    if let Err(e) = screen.composite(region, 0, y) {
        warn!("Skipping {} region this cycle: {}", name, e);
    }
}

fn draw_middle(
    pages: &PageManager,
    resources: &PanelResources,
    messages: &Arc<Vec<FrameBuffer>>,
    page: Option<PageRef>,
    fb: &mut FrameBuffer,
) {
    fb.fill(COLOR_BACKGROUND);
    match page {
        Some(PageRef::Layout(i)) => {
            if let Some(layout) = pages.layout(i) {
                let Ok(skipped) = render_page(layout, &resources.store, fb);
                if skipped > 0 {
                    debug!("{} elements skipped on page {}", skipped, layout.name);
                }
            }
        }
        Some(PageRef::Power) => render_power_page(fb, &resources.history),
        Some(PageRef::Message(i)) => {
            if let Some(image) = messages.get(i) {
                if let Err(e) = fb.composite(image, 0, 0) {
                    warn!("Message page {} does not fit: {}", i, e);
                }
            }
        }
        None => {}
    }
}

fn draw_fps_overlay(fb: &mut FrameBuffer, fps: u32) {
    use core::fmt::Write as _;

    let mut label: heapless::String<12> = heapless::String::new();
    if write!(label, "{fps} fps").is_err() {
        return;
    }
    let font = FontId::Small.face();
    let width = font.measure(&label) + 4;
    fb.blend_rect(
        PixelRect::new(0, 0, width, font.line_height() + 2),
        COLOR_GRAPH_BACKDROP,
    );
    let Ok(()) = font.draw(&label, Point::new(2, 1), COLOR_TEXT, fb);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::display::DisplayError;
    use crate::graphics::Rgba;
    use crate::graphics::color::COLOR_ACCENT;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Vec<Rgba>>,
        fail: bool,
    }

    impl DisplaySink for Recorder {
        fn push(
            &mut self,
            _x: u32,
            _y: u32,
            _width: u32,
            _height: u32,
            pixels: &[Rgba],
        ) -> Result<(), DisplayError> {
            self.frames.push(pixels.to_vec());
            if self.fail {
                return Err(DisplayError::Transport {
                    message: "spi busy".into(),
                });
            }
            Ok(())
        }
    }

    fn resources() -> PanelResources {
        PanelResources {
            store: Arc::new(DataStore::new()),
            panel: Arc::new(PanelState::new(20)),
            history: Arc::new(PowerHistory::new(15, 900)),
            board: Arc::new(MessageBoard::new()),
        }
    }

    fn pixel(frame: &[Rgba], x: u32, y: u32) -> Rgba {
        frame[(y * 320 + x) as usize]
    }

    /// Footer dots for two pages sit at x = 151 and x = 163; row 230 is the
    /// footer's vertical centre.
    fn footer_page(frame: &[Rgba]) -> Option<usize> {
        if pixel(frame, 153, 230) == COLOR_ACCENT {
            Some(0)
        } else if pixel(frame, 165, 230) == COLOR_ACCENT {
            Some(1)
        } else {
            None
        }
    }

    #[test]
    fn cycle_pushes_full_screen() {
        let config = PanelConfig::default();
        let mut manager =
            DisplayManager::new(Recorder::default(), &config, resources(), Instant::now());
        manager.run_cycle(Instant::now());

        let frames = &manager.sink().frames;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 320 * 240);
        assert_eq!(pixel(&frames[0], 319, 0), COLOR_BAR);
        assert_eq!(footer_page(&frames[0]), Some(0));
        assert_eq!(manager.page_count(), 2);
    }

    #[test]
    fn transition_pushes_steps_and_flips_midway() {
        let config = PanelConfig::default();
        let mut manager =
            DisplayManager::new(Recorder::default(), &config, resources(), Instant::now());
        manager.run_cycle(Instant::now());
        manager.transition(1, Instant::now());

        let frames = &manager.sink().frames;
        assert_eq!(frames.len(), 1 + 16);
        let shown: Vec<Option<usize>> = frames[1..].iter().map(|f| footer_page(f)).collect();
        assert!(shown[..8].iter().all(|p| *p == Some(0)), "{shown:?}");
        assert!(shown[8..].iter().all(|p| *p == Some(1)), "{shown:?}");

        // Step 0 has offset 0: the middle region still shows the outgoing page.
        let middle_row = 24 + 50;
        for x in 0..320 {
            assert_eq!(pixel(&frames[1], x, middle_row), pixel(&frames[0], x, middle_row));
        }
        assert_eq!(manager.current_page(), 1);
        assert!(!manager.is_transitioning());
    }

    #[test]
    fn button_request_triggers_transition_on_tick() {
        let config = PanelConfig::default();
        let res = resources();
        let panel = Arc::clone(&res.panel);
        let mut manager = DisplayManager::new(Recorder::default(), &config, res, Instant::now());

        assert!(!manager.tick(Instant::now()));
        panel.request_transition();
        assert!(manager.tick(Instant::now()));
        assert_eq!(manager.current_page(), 1);
        assert!(!manager.tick(Instant::now()));
    }

    #[test]
    fn auto_rotation_waits_for_interval() {
        let mut config = PanelConfig::default();
        config.display.rotate_interval_secs = 10;
        let t0 = Instant::now();
        let res = resources();
        res.panel.set_dimmer_state(crate::backlight::DimmerState::Active);
        let mut manager = DisplayManager::new(Recorder::default(), &config, res, t0);

        assert!(!manager.tick(t0 + Duration::from_secs(5)));
        assert!(manager.tick(t0 + Duration::from_secs(10)));
        assert_eq!(manager.current_page(), 1);
        assert!(!manager.tick(t0 + Duration::from_secs(15)));
    }

    #[test]
    fn push_errors_do_not_stop_the_loop() {
        let config = PanelConfig::default();
        let sink = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let mut manager = DisplayManager::new(sink, &config, resources(), Instant::now());
        manager.run_cycle(Instant::now());
        manager.run_cycle(Instant::now());
        assert_eq!(manager.sink().frames.len(), 2);
    }

    #[test]
    fn message_pages_join_the_rotation() {
        let config = PanelConfig::default();
        let res = resources();
        let (w, h) = (config.display.width, config.display.middle_height());
        let red = Rgba::opaque(255, 0, 0);
        res.board
            .publish(Arc::new(vec![FrameBuffer::new(w, h, red)]));
        let mut manager = DisplayManager::new(Recorder::default(), &config, res, Instant::now());

        assert_eq!(manager.page_count(), 3);
        manager.transition(2, Instant::now());
        manager.run_cycle(Instant::now());
        let last = manager.sink().frames.last().unwrap();
        assert_eq!(pixel(last, 10, 100), red);
    }
}
