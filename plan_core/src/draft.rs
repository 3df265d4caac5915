/// Uncommitted text of a cell being edited, with caret management.
/// The caret is a char index so multi-byte input stays on boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftBuffer {
    value: String,
    cursor: usize,
}

impl DraftBuffer {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn into_value(self) -> String {
        self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_offset(self.cursor);
        self.value.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_offset(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_offset(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    /// Get the value with cursor indicator for display
    pub fn display_with_cursor(&self) -> String {
        let mut result = self.value.clone();
        result.insert(self.byte_offset(self.cursor), '|');
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_typing() {
        let mut draft = DraftBuffer::new(String::new());
        for c in "72".chars() {
            draft.insert(c);
        }
        assert_eq!(draft.value(), "72");
        assert_eq!(draft.cursor(), 2);
    }

    #[test]
    fn test_draft_backspace_and_delete() {
        let mut draft = DraftBuffer::new("hello");
        draft.backspace();
        assert_eq!(draft.value(), "hell");
        draft.move_home();
        draft.delete();
        assert_eq!(draft.value(), "ell");
        draft.move_end();
        draft.delete();
        assert_eq!(draft.value(), "ell");
    }

    #[test]
    fn test_draft_cursor_movement() {
        let mut draft = DraftBuffer::new("hello");
        assert_eq!(draft.cursor(), 5);
        draft.move_left();
        assert_eq!(draft.cursor(), 4);
        draft.move_home();
        draft.move_left();
        assert_eq!(draft.cursor(), 0);
        draft.move_end();
        draft.move_right();
        assert_eq!(draft.cursor(), 5);
    }

    #[test]
    fn test_draft_multibyte() {
        let mut draft = DraftBuffer::new("Übung");
        draft.move_home();
        draft.move_right();
        draft.insert('-');
        assert_eq!(draft.value(), "Ü-bung");
        draft.backspace();
        draft.backspace();
        assert_eq!(draft.value(), "bung");
        assert_eq!(draft.display_with_cursor(), "|bung");
    }

    #[test]
    fn test_draft_insert_str() {
        let mut draft = DraftBuffer::new("6");
        draft.insert_str("2.5");
        assert_eq!(draft.value(), "62.5");
        assert_eq!(draft.display_with_cursor(), "62.5|");
    }
}
