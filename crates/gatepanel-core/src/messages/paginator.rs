//! Payload cache, fetch fallback and the page board shared with the
//! render loop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use log::{debug, info, warn};

use super::layout::{PageMetrics, render_thread};
use super::model::{EMPTY_PAYLOAD, parse_payload};
use super::{MessageError, MessageSource};
use crate::graphics::FrameBuffer;

/// What a call to [`SmsPaginator::paginate`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// New pages were rendered
    Rendered,
    /// The payload matched the previous one byte for byte
    Unchanged,
    /// The payload was refused; the previous pages are still current
    Rejected(MessageError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page_count: usize,
    pub outcome: Outcome,
}

/// Turns message payloads into page images, re-rendering only when the raw
/// payload bytes change.
pub struct SmsPaginator {
    metrics: PageMetrics,
    last_payload: Option<Vec<u8>>,
    pages: Arc<Vec<FrameBuffer>>,
}

impl SmsPaginator {
    pub fn new(metrics: PageMetrics) -> Self {
        Self {
            metrics,
            last_payload: None,
            pages: Arc::new(Vec::new()),
        }
    }

    pub fn pages(&self) -> Arc<Vec<FrameBuffer>> {
        Arc::clone(&self.pages)
    }

    pub fn paginate(&mut self, payload: &[u8], now: NaiveDateTime) -> Pagination {
        if self.last_payload.as_deref() == Some(payload) {
            return self.result(Outcome::Unchanged);
        }

        let messages = match parse_payload(payload) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Message payload rejected: {}", e);
                return self.result(Outcome::Rejected(e));
            }
        };

        let pages = render_thread(&messages, &self.metrics, now);
        info!(
            "Paginated {} messages into {} pages",
            messages.len(),
            pages.len()
        );
        self.pages = Arc::new(pages);
        self.last_payload = Some(payload.to_vec());
        self.result(Outcome::Rendered)
    }

    fn result(&self, outcome: Outcome) -> Pagination {
        Pagination {
            page_count: self.pages.len(),
            outcome,
        }
    }
}

/// Wraps a [`MessageSource`] with last-good fallback.
pub struct MessageFeed<S> {
    source: S,
    last_good: Option<Vec<u8>>,
}

impl<S: MessageSource> MessageFeed<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            last_good: None,
        }
    }

    /// Fetch a payload; on failure reuse the last successful one, else an
    /// empty thread.
    pub fn next_payload(&mut self) -> Vec<u8> {
        match self.source.fetch() {
            Ok(payload) => {
                self.last_good = Some(payload.clone());
                payload
            }
            Err(e) => {
                warn!("Message fetch failed: {}", e);
                self.last_good
                    .clone()
                    .unwrap_or_else(|| EMPTY_PAYLOAD.to_vec())
            }
        }
    }
}

/// Latest message page images, written by the fetcher and read by the
/// render loop.
#[derive(Default)]
pub struct MessageBoard {
    pages: Mutex<Arc<Vec<FrameBuffer>>>,
}

impl MessageBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Arc<Vec<FrameBuffer>>> {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, pages: Arc<Vec<FrameBuffer>>) {
        *self.lock() = pages;
    }

    pub fn pages(&self) -> Arc<Vec<FrameBuffer>> {
        Arc::clone(&self.lock())
    }

    pub fn page_count(&self) -> usize {
        self.lock().len()
    }
}

/// One fetch → paginate → publish step, run periodically by the fetcher
/// thread.
pub struct MessageWorker<S> {
    feed: MessageFeed<S>,
    paginator: SmsPaginator,
    board: Arc<MessageBoard>,
}

impl<S: MessageSource> MessageWorker<S> {
    pub fn new(source: S, metrics: PageMetrics, board: Arc<MessageBoard>) -> Self {
        Self {
            feed: MessageFeed::new(source),
            paginator: SmsPaginator::new(metrics),
            board,
        }
    }

    pub fn poll(&mut self, now: NaiveDateTime) -> Pagination {
        let payload = self.feed.next_payload();
        let result = self.paginator.paginate(&payload, now);
        match result.outcome {
            Outcome::Rendered => self.board.publish(self.paginator.pages()),
            Outcome::Unchanged => debug!("Message payload unchanged"),
            Outcome::Rejected(_) => {}
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontId;
    use std::collections::VecDeque;

    fn metrics() -> PageMetrics {
        let mut m = PageMetrics::new(200, 100, 1.0, true);
        m.body_font = FontId::Small.face();
        m
    }

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-05-10 18:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    const ONE: &[u8] =
        br#"{"msg":[{"sender":"+1","timestamp":"2024-05-10 10:00:00","content":"hello"}]}"#;

    struct Scripted(VecDeque<Result<Vec<u8>, MessageError>>);

    impl MessageSource for Scripted {
        fn fetch(&mut self) -> Result<Vec<u8>, MessageError> {
            self.0.pop_front().unwrap_or(Err(MessageError::Fetch {
                message: "exhausted".into(),
            }))
        }
    }

    #[test]
    fn identical_bytes_short_circuit() {
        let mut paginator = SmsPaginator::new(metrics());
        let first = paginator.paginate(ONE, now());
        assert_eq!(first.outcome, Outcome::Rendered);
        let before = paginator.pages();

        let second = paginator.paginate(ONE, now());
        assert_eq!(second.outcome, Outcome::Unchanged);
        assert_eq!(second.page_count, first.page_count);
        assert!(Arc::ptr_eq(&before, &paginator.pages()));
    }

    #[test]
    fn reformatted_payload_re_renders() {
        let mut paginator = SmsPaginator::new(metrics());
        paginator.paginate(ONE, now());
        let spaced = String::from_utf8(ONE.to_vec()).unwrap().replace(',', ", ");
        let result = paginator.paginate(spaced.as_bytes(), now());
        assert_eq!(result.outcome, Outcome::Rendered);
    }

    #[test]
    fn rejected_payload_keeps_previous_pages() {
        let mut paginator = SmsPaginator::new(metrics());
        let good = paginator.paginate(ONE, now());
        let before = paginator.pages();

        let bad = paginator.paginate(b"{\"msg\":[{\"content\":\"<script>\"}]}", now());
        assert!(matches!(
            bad.outcome,
            Outcome::Rejected(MessageError::Injection { .. })
        ));
        assert_eq!(bad.page_count, good.page_count);
        assert!(Arc::ptr_eq(&before, &paginator.pages()));

        // The last good payload is still the cache key.
        assert_eq!(paginator.paginate(ONE, now()).outcome, Outcome::Unchanged);
    }

    #[test]
    fn feed_falls_back_to_last_good_then_empty() {
        let fail = || {
            Err(MessageError::Fetch {
                message: "timeout".into(),
            })
        };
        let mut feed = MessageFeed::new(Scripted(VecDeque::from([fail()])));
        assert_eq!(feed.next_payload(), EMPTY_PAYLOAD);

        let mut feed = MessageFeed::new(Scripted(VecDeque::from([Ok(ONE.to_vec()), fail()])));
        assert_eq!(feed.next_payload(), ONE);
        assert_eq!(feed.next_payload(), ONE);
    }

    #[test]
    fn worker_publishes_rendered_pages() {
        let board = Arc::new(MessageBoard::new());
        let source = Scripted(VecDeque::from([Ok(ONE.to_vec()), Ok(ONE.to_vec())]));
        let mut worker = MessageWorker::new(source, metrics(), Arc::clone(&board));

        assert_eq!(board.page_count(), 0);
        assert_eq!(worker.poll(now()).outcome, Outcome::Rendered);
        assert_eq!(board.page_count(), 1);
        assert_eq!(worker.poll(now()).outcome, Outcome::Unchanged);
        assert_eq!(board.page_count(), 1);
    }

    #[test]
    fn fetch_failure_without_history_shows_placeholder_page() {
        let board = Arc::new(MessageBoard::new());
        let mut worker = MessageWorker::new(Scripted(VecDeque::new()), metrics(), Arc::clone(&board));
        let result = worker.poll(now());
        assert_eq!(result.outcome, Outcome::Rendered);
        assert_eq!(board.page_count(), 1);
    }
}
