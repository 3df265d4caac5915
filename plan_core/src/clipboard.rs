//! Clipboard abstraction for the grid.
//!
//! The core only defines the interface and error types; the terminal front
//! end supplies a system clipboard. Failures never reach the edit state
//! machine: [`read_text`] and [`write_text`] log them and report `None` /
//! `false`.

use std::borrow::Cow;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard is empty")]
    Empty,
    #[error("clipboard does not hold text")]
    NotText,
    #[error("clipboard access denied: {0}")]
    Denied(String),
    #[error("clipboard provider does not support reading")]
    ReadingNotSupported,
    #[error("clipboard provider does not support writing")]
    WritingNotSupported,
    #[error("clipboard error: {0}")]
    Platform(String),
}

pub type Result<T> = std::result::Result<T, ClipboardError>;

pub trait ClipboardProvider {
    fn name(&self) -> Cow<'_, str>;
    fn get_contents(&mut self) -> Result<String>;
    fn set_contents(&mut self, content: &str) -> Result<()>;
}

/// Process-local clipboard, used in tests and when no system clipboard
/// is available
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        MemoryClipboard {
            contents: Some(contents.into()),
        }
    }
}

impl ClipboardProvider for MemoryClipboard {
    fn name(&self) -> Cow<'_, str> {
        "memory".into()
    }

    fn get_contents(&mut self) -> Result<String> {
        self.contents.clone().ok_or(ClipboardError::Empty)
    }

    fn set_contents(&mut self, content: &str) -> Result<()> {
        self.contents = Some(content.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NoClipboard;

impl ClipboardProvider for NoClipboard {
    fn name(&self) -> Cow<'_, str> {
        "none".into()
    }

    fn get_contents(&mut self) -> Result<String> {
        Err(ClipboardError::ReadingNotSupported)
    }

    fn set_contents(&mut self, _content: &str) -> Result<()> {
        Err(ClipboardError::WritingNotSupported)
    }
}

/// Read plain text; an empty string counts as an empty clipboard
pub fn read_text(provider: &mut dyn ClipboardProvider) -> Option<String> {
    let result = provider.get_contents().and_then(|text| {
        if text.is_empty() {
            Err(ClipboardError::Empty)
        } else {
            Ok(text)
        }
    });
    match result {
        Ok(text) => Some(text),
        Err(e) => {
            log::warn!("paste from {} clipboard failed: {e}", provider.name());
            None
        }
    }
}

pub fn write_text(provider: &mut dyn ClipboardProvider, text: &str) -> bool {
    match provider.set_contents(text) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("copy to {} clipboard failed: {e}", provider.name());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DeniedClipboard;

    impl ClipboardProvider for DeniedClipboard {
        fn name(&self) -> Cow<'_, str> {
            "denied".into()
        }

        fn get_contents(&mut self) -> Result<String> {
            Err(ClipboardError::Denied("sandboxed".to_string()))
        }

        fn set_contents(&mut self, _content: &str) -> Result<()> {
            Err(ClipboardError::Denied("sandboxed".to_string()))
        }
    }

    #[test]
    fn test_memory_clipboard() {
        let mut clipboard = MemoryClipboard::default();
        assert!(read_text(&mut clipboard).is_none());
        assert!(write_text(&mut clipboard, "60"));
        assert_eq!(read_text(&mut clipboard).as_deref(), Some("60"));
    }

    #[test]
    fn test_empty_text_is_empty_clipboard() {
        let mut clipboard = MemoryClipboard::with_contents("");
        assert!(read_text(&mut clipboard).is_none());
    }

    #[test]
    fn test_failures_are_swallowed() {
        assert!(read_text(&mut DeniedClipboard).is_none());
        assert!(!write_text(&mut DeniedClipboard, "x"));
        assert!(read_text(&mut NoClipboard).is_none());
        assert!(!write_text(&mut NoClipboard, "x"));
    }
}
