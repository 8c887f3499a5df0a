use std::fs;
use std::path::PathBuf;

use gatepanel_core::messages::{MessageError, MessageSource};

/// Reads the message thread from a JSON file kept current by the modem
/// tooling.
pub struct FileMessageSource {
    path: PathBuf,
}

impl FileMessageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MessageSource for FileMessageSource {
    fn fetch(&mut self) -> Result<Vec<u8>, MessageError> {
        fs::read(&self.path).map_err(|e| MessageError::Fetch {
            message: format!("{}: {e}", self.path.display()),
        })
    }
}
