use textwrap::{wrap, Options};
use unicode_width::UnicodeWidthStr;

use crate::strings::{PREFIX_ASSISTANT, PREFIX_USER};

use super::{App, Message, Role};

#[derive(Clone)]
pub struct WrappedMsg {
    pub role: Role,
    pub is_error: bool,
    pub content_len: usize,
    pub lines: Vec<String>,
}

impl App {
    /// Keep the wrap cache in step with the messages. A full rebuild only
    /// happens on width or count changes; otherwise rewrap just the
    /// bubbles whose content changed (a pending placeholder can resolve
    /// anywhere in the list, not only at the tail).
    pub fn ensure_chat_wrapped(&mut self, width: u16) {
        let width = width.max(1);
        if self.chat_wrap_width != width || self.chat_cache.len() != self.messages.len() {
            self.chat_cache = self
                .messages
                .iter()
                .map(|m| Self::wrap_message(m, width))
                .collect();
            self.chat_wrap_width = width;
        } else {
            for (i, m) in self.messages.iter().enumerate() {
                if self.chat_cache[i].content_len != m.content.len() {
                    self.chat_cache[i] = Self::wrap_message(m, width);
                }
            }
        }
        self.chat_total_lines = self.chat_cache.iter().map(|w| w.lines.len()).sum();
    }

    /// Scroll bookkeeping for the chat viewport. `chat_scroll` counts
    /// lines up from the bottom; returns (viewport, max_scroll,
    /// start_offset) in lines.
    pub fn compute_chat_layout(&mut self, viewport_h: u16) -> (usize, usize, usize) {
        let viewport = viewport_h as usize;
        let max_scroll = self.chat_total_lines.saturating_sub(viewport);
        if self.stick_to_bottom {
            self.chat_scroll = 0;
        }
        self.chat_scroll = self.chat_scroll.min(max_scroll.min(u16::MAX as usize) as u16);
        let start_offset = max_scroll - self.chat_scroll as usize;
        (viewport, max_scroll, start_offset)
    }

    fn wrap_message(m: &Message, width: u16) -> WrappedMsg {
        let prefix = match m.role {
            Role::User => PREFIX_USER,
            Role::Assistant => PREFIX_ASSISTANT,
        };
        let full = format!("{}{}", prefix, m.content);
        let indent = " ".repeat(UnicodeWidthStr::width(prefix));
        let opts = Options::new(width as usize).subsequent_indent(&indent);
        let lines = wrap(&full, opts)
            .into_iter()
            .map(|c| c.into_owned())
            .collect::<Vec<_>>();
        WrappedMsg {
            role: m.role.clone(),
            is_error: m.is_error,
            content_len: m.content.len(),
            lines,
        }
    }
}
