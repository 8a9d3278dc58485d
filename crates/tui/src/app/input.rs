use unicode_segmentation::UnicodeSegmentation;

use super::App;

// Cursor positions index grapheme clusters, not bytes, so edits splice a
// grapheme vector and rebuild the string.
fn clusters(s: &str) -> Vec<&str> {
    s.graphemes(true).collect()
}

impl App {
    pub fn insert_text(&mut self, s: &str) {
        let mut parts = clusters(&self.input);
        let idx = self.input_cursor.min(parts.len());
        let added: Vec<&str> = s.graphemes(true).collect();
        let count = added.len();
        parts.splice(idx..idx, added);
        self.input = parts.concat();
        self.input_cursor = idx + count;
    }

    pub fn delete_left_grapheme(&mut self) {
        let mut parts = clusters(&self.input);
        let idx = self.input_cursor.min(parts.len());
        if idx == 0 {
            return;
        }
        parts.remove(idx - 1);
        self.input = parts.concat();
        self.input_cursor = idx - 1;
    }

    pub fn delete_right_grapheme(&mut self) {
        let mut parts = clusters(&self.input);
        let idx = self.input_cursor.min(parts.len());
        if idx >= parts.len() {
            return;
        }
        parts.remove(idx);
        self.input = parts.concat();
    }

    pub fn move_cursor_line_start(&mut self) {
        let parts = clusters(&self.input);
        let mut i = self.input_cursor.min(parts.len());
        while i > 0 && parts[i - 1] != "\n" {
            i -= 1;
        }
        self.input_cursor = i;
    }

    pub fn move_cursor_line_end(&mut self) {
        let parts = clusters(&self.input);
        let mut i = self.input_cursor.min(parts.len());
        while i < parts.len() && parts[i] != "\n" {
            i += 1;
        }
        self.input_cursor = i;
    }

    pub fn move_cursor_word_left(&mut self) {
        let parts = clusters(&self.input);
        let mut i = self.input_cursor.min(parts.len());
        while i > 0 && parts[i - 1].trim().is_empty() {
            i -= 1;
        }
        while i > 0 && !parts[i - 1].trim().is_empty() {
            i -= 1;
        }
        self.input_cursor = i;
    }

    pub fn move_cursor_word_right(&mut self) {
        let parts = clusters(&self.input);
        let mut i = self.input_cursor.min(parts.len());
        while i < parts.len() && parts[i].trim().is_empty() {
            i += 1;
        }
        while i < parts.len() && !parts[i].trim().is_empty() {
            i += 1;
        }
        self.input_cursor = i;
    }
}
