use plan_core::clipboard::{ClipboardError, ClipboardProvider, MemoryClipboard, Result};
use std::borrow::Cow;

/// Platform clipboard through `arboard`
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> std::result::Result<Self, arboard::Error> {
        Ok(SystemClipboard {
            inner: arboard::Clipboard::new()?,
        })
    }
}

impl ClipboardProvider for SystemClipboard {
    fn name(&self) -> Cow<'_, str> {
        "system".into()
    }

    fn get_contents(&mut self) -> Result<String> {
        self.inner.get_text().map_err(map_error)
    }

    fn set_contents(&mut self, content: &str) -> Result<()> {
        self.inner.set_text(content).map_err(map_error)
    }
}

fn map_error(error: arboard::Error) -> ClipboardError {
    match error {
        arboard::Error::ContentNotAvailable => ClipboardError::Empty,
        arboard::Error::ConversionFailure => ClipboardError::NotText,
        arboard::Error::ClipboardNotSupported => ClipboardError::ReadingNotSupported,
        other => ClipboardError::Platform(other.to_string()),
    }
}

/// The system clipboard when the platform has one, otherwise a
/// clipboard local to this process
pub fn open() -> Box<dyn ClipboardProvider> {
    match SystemClipboard::new() {
        Ok(clipboard) => Box::new(clipboard),
        Err(e) => {
            log::warn!("system clipboard unavailable, using in-memory clipboard: {e}");
            Box::new(MemoryClipboard::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            map_error(arboard::Error::ContentNotAvailable),
            ClipboardError::Empty
        ));
        assert!(matches!(
            map_error(arboard::Error::ConversionFailure),
            ClipboardError::NotText
        ));
        assert!(matches!(
            map_error(arboard::Error::ClipboardOccupied),
            ClipboardError::Platform(_)
        ));
    }
}
