//! Message thread pagination
//!
//! Payloads of the form `{"msg": [...]}` are validated, sorted newest first,
//! word-wrapped with CJK-aware breaking, packed into pages that fit the
//! middle region and rendered to page images. The render loop shows those
//! images like any other content page.
//!
//! - [`wrap`]: CJK classification and word wrapping
//! - [`model`]: payload types, injection check, title dates
//! - [`layout`]: page packing and rendering
//! - [`paginator`]: byte-equality cache, fetch fallback, [`MessageBoard`]

use thiserror_no_std::Error;

pub mod layout;
pub mod model;
pub mod paginator;
pub mod wrap;

pub use layout::{LayoutLine, PageMetrics};
pub use model::{Direction, Message};
pub use paginator::{MessageBoard, MessageFeed, MessageWorker, Outcome, Pagination, SmsPaginator};
pub use wrap::{is_cjk, wrap_text};

/// Message pipeline errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The payload contains script or markup
    #[error("payload contains injected markup ({marker})")]
    Injection { marker: &'static str },
    /// The payload is not a valid message list
    #[error("malformed message payload: {message}")]
    Malformed { message: String },
    /// The source could not be read
    #[error("message fetch failed: {message}")]
    Fetch { message: String },
}

/// Pull-based source of raw message payloads.
pub trait MessageSource: Send {
    fn fetch(&mut self) -> Result<Vec<u8>, MessageError>;
}
