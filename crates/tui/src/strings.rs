// Centralized UI strings and labels. ASCII-friendly by default.

use unicode_width::UnicodeWidthStr;

// Minimal role prefixes; color is applied at render time.
pub const PREFIX_USER: &str = "| ";
pub const PREFIX_ASSISTANT: &str = "> ";

pub const PENDING_ANSWER: &str = "(waiting for guidance...)";
pub const NO_STORED_ANSWER: &str = "(no stored answer for this question)";

pub const BANNER: &str =
    "Ask a market question. Enter: send; Shift+Enter: newline; F1: help; Esc: quit.";

pub const INPUT_HINT: &str = "Type a question, Enter to send / Shift+Enter for newline";

// UI block titles (keep surrounding spaces for visual padding)
pub const TITLE_HISTORY: &str = " History ";
pub const TITLE_CHAT: &str = " Advice ";
pub const TITLE_INPUT: &str = " Question ";
pub const TITLE_HELP: &str = " Help / Shortcuts ";
pub const TITLE_WELCOME: &str = " Welcome ";
pub const TITLE_CONFIRM: &str = " Confirm ";

pub const CONFIRM_DROP_RECENT: &str =
    "Drop the most recent exchange from history? Press Y to confirm, N/Esc to cancel.";

// Inline error bubble. Diagnostics arrive already truncated upstream.
pub fn format_error(detail: &str) -> String {
    format!("[error] {}", detail)
}

// Sidebar rows show the question only; squeeze to the pane width.
pub fn sidebar_row(question: &str, max_width: usize) -> String {
    let flat = question.replace('\n', " ");
    if UnicodeWidthStr::width(flat.as_str()) <= max_width {
        return flat;
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in flat.chars() {
        let w = UnicodeWidthStr::width(ch.to_string().as_str());
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('~');
    out
}

// Status bar stick label
pub const STICK_BOTTOM: &str = "Bottom";

pub fn build_stick_label(scroll: u16) -> String {
    if scroll == 0 {
        STICK_BOTTOM.to_string()
    } else {
        format!("+{} lines", scroll)
    }
}

// Build the status bar line with width-aware compaction: fixed segments
// first, then hints in importance order while space allows.
pub fn build_status_line(
    stick: &str,
    focus: &str,
    theme: &str,
    history_len: usize,
    pending: usize,
    max_width: u16,
) -> String {
    let mut segments: Vec<String> = Vec::new();
    segments.push(format!("[{}][{}]", stick, focus));
    segments.push(format!("Theme:{}", theme));
    segments.push(format!("Hist:{}", history_len));
    if pending > 0 {
        segments.push(format!("Pending:{}", pending));
    }
    let hints: [&str; 6] = [
        "Enter: send; Shift+Enter: newline",
        "Up/Down: recall",
        "Tab: history pane",
        "PgUp/PgDn: scroll",
        "F4: theme; F5: digest",
        "F1: help",
    ];
    for h in hints {
        segments.push(h.to_string());
    }

    let sep = "  |  ";
    let mut out = String::new();
    let mut used = 0usize;
    for (i, seg) in segments.iter().enumerate() {
        let segw = UnicodeWidthStr::width(seg.as_str());
        let addw = segw
            + if i == 0 {
                0
            } else {
                UnicodeWidthStr::width(sep)
            };
        if used + addw > max_width as usize {
            break;
        }
        if i > 0 {
            out.push_str(sep);
            used += UnicodeWidthStr::width(sep);
        }
        out.push_str(seg);
        used += segw;
    }
    out
}

pub fn welcome_lines() -> &'static [&'static str] {
    &[
        "pulse asks a market-advice backend on your behalf and keeps",
        "your last 20 exchanges on this machine.",
        "",
        "  Enter         Send the question in the input box",
        "  Tab           Jump to the history pane; Enter re-opens an exchange",
        "  F4            Toggle dark/light theme",
        "  F5            Refresh the market digest line",
        "",
        "Nothing here is financial advice. Figures can be stale or absent;",
        "the digest line says so when it is offline.",
        "",
        "Press Enter to continue. This notice will not be shown again.",
    ]
}

pub fn help_lines() -> &'static [&'static str] {
    &[
        "Basic",
        "  Enter: Send    Shift+Enter: Newline    Esc/Ctrl-C: Quit",
        "Input Editing",
        "  Left/Right: Cursor    Backspace/Delete: Delete prev/next char",
        "  Home/End: Line start/end    Ctrl+Left/Right: Word move",
        "  Up/Down: Recall previous questions",
        "Chat Scrolling",
        "  Mouse wheel: Scroll    PgUp/PgDn: Page    Ctrl+Up/Down: Fine scroll",
        "  Stick to bottom: Auto when at bottom",
        "History Pane",
        "  F2: Show/hide    Tab: Focus    Up/Down: Select    Enter: Re-open exchange",
        "  D or Delete: Drop the most recent exchange",
        "Appearance & Data",
        "  F4: Toggle theme    F5: Refresh market digest",
        "Help",
        "  F1: Open/close this panel",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidebar_row_keeps_short_questions_whole() {
        assert_eq!(sidebar_row("btc or gold?", 20), "btc or gold?");
    }

    #[test]
    fn sidebar_row_squeezes_and_marks_long_questions() {
        let row = sidebar_row("should i rotate out of tech into energy this quarter", 16);
        assert!(row.ends_with('~'));
        assert!(UnicodeWidthStr::width(row.as_str()) <= 16);
    }

    #[test]
    fn sidebar_row_flattens_newlines() {
        assert_eq!(sidebar_row("a\nb", 10), "a b");
    }

    #[test]
    fn status_line_respects_width() {
        let line = build_status_line("Bottom", "Input", "dark", 3, 1, 24);
        assert!(UnicodeWidthStr::width(line.as_str()) <= 24);
        assert!(line.starts_with("[Bottom][Input]"));
    }
}
