use unicode_segmentation::UnicodeSegmentation;

use super::{App, Focus, Message};
use crate::strings;

impl App {
    // Record input text for Up/Down recall if it's new, and reset the
    // recall cursor.
    pub fn record_recall_entry(&mut self, text: &str) {
        if self.recall.last().map(String::as_str) != Some(text) {
            self.recall.push(text.to_string());
        }
        self.recall_index = None;
    }

    pub fn recall_older(&mut self) {
        if self.recall.is_empty() {
            return;
        }
        let idx = match self.recall_index {
            None => self.recall.len() - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.recall_index = Some(idx);
        self.input = self.recall[idx].clone();
        self.input_cursor = self.input.graphemes(true).count();
    }

    pub fn recall_newer(&mut self) {
        let Some(i) = self.recall_index else {
            return;
        };
        if i + 1 < self.recall.len() {
            self.recall_index = Some(i + 1);
            self.input = self.recall[i + 1].clone();
            self.input_cursor = self.input.graphemes(true).count();
        } else {
            self.recall_index = None;
            self.input.clear();
            self.input_cursor = 0;
        }
    }

    /// Readers never hold a copy of the store: every refresh takes a fresh
    /// snapshot so the sidebar matches what actually persisted.
    pub fn refresh_sidebar(&mut self) {
        self.sidebar_entries = self.store.list();
        if !self.sidebar_entries.is_empty() {
            self.sidebar_selected = self.sidebar_selected.min(self.sidebar_entries.len() - 1);
        } else {
            self.sidebar_selected = 0;
            self.focus = match self.focus {
                Focus::Sidebar => Focus::Input,
                f => f,
            };
        }
        self.ensure_sidebar_visible();
    }

    /// Repopulate a stored exchange into the chat, tagged with its stored
    /// hid. No network involved.
    pub fn recall_selected_exchange(&mut self) {
        let Some(entry) = self.sidebar_entries.get(self.sidebar_selected).cloned() else {
            return;
        };
        self.messages
            .push(Message::user(entry.question.clone(), entry.hid));
        let answer = if entry.answer.is_empty() {
            strings::NO_STORED_ANSWER.to_string()
        } else {
            entry.answer.clone()
        };
        self.messages.push(Message::assistant(answer, entry.hid));
        self.stick_to_bottom = true;
        self.chat_scroll = 0;
        self.dirty = true;
    }

    pub fn drop_most_recent(&mut self) {
        if self.store.pop_most_recent().is_some() {
            self.refresh_sidebar();
        }
    }

    pub fn sidebar_inner_height(&self) -> u16 {
        self.sidebar_area
            .map(|a| a.height.saturating_sub(2))
            .unwrap_or(0)
    }

    pub fn sidebar_max_scroll(&self) -> u16 {
        let h = self.sidebar_inner_height() as usize;
        if h == 0 {
            0
        } else {
            self.sidebar_entries.len().saturating_sub(h) as u16
        }
    }

    pub fn sidebar_select_up(&mut self) {
        if self.sidebar_selected > 0 {
            self.sidebar_selected -= 1;
        }
        self.ensure_sidebar_visible();
    }

    pub fn sidebar_select_down(&mut self) {
        if self.sidebar_selected + 1 < self.sidebar_entries.len() {
            self.sidebar_selected += 1;
        }
        self.ensure_sidebar_visible();
    }

    pub fn ensure_sidebar_visible(&mut self) {
        let start = self.sidebar_scroll as usize;
        let h = self.sidebar_inner_height() as usize;
        if h == 0 {
            return;
        }
        let end = start + h.saturating_sub(1);
        if self.sidebar_selected < start {
            self.sidebar_scroll = self.sidebar_selected as u16;
        } else if self.sidebar_selected > end {
            self.sidebar_scroll = (self.sidebar_selected + 1 - h) as u16;
        }
        self.sidebar_scroll = self.sidebar_scroll.min(self.sidebar_max_scroll());
    }
}
