use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame,
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Focus, Role};
use crate::strings::{
    build_status_line, build_stick_label, help_lines, sidebar_row, welcome_lines,
    CONFIRM_DROP_RECENT, INPUT_HINT, PREFIX_ASSISTANT, PREFIX_USER, TITLE_CHAT, TITLE_CONFIRM,
    TITLE_HELP, TITLE_HISTORY, TITLE_INPUT, TITLE_WELCOME,
};
use crate::theme::Theme;

pub fn draw(f: &mut Frame, app: &mut App) {
    // Layout: one digest line on top, then optional history sidebar + main.
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(10)])
        .split(f.area());
    draw_digest(f, rows[0], app);

    let mut constraints: Vec<Constraint> = Vec::new();
    if app.show_sidebar {
        constraints.push(Constraint::Length(30));
    }
    constraints.push(Constraint::Min(10));
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(rows[1]);
    let mut idx = 0usize;
    if app.show_sidebar {
        app.sidebar_area = Some(cols[idx]);
        {
            let app_ref: &App = &*app;
            draw_sidebar(f, cols[idx], app_ref);
        }
        idx += 1;
    } else {
        app.sidebar_area = None;
    }
    draw_main(f, cols[idx], app);

    if app.confirm.is_some() {
        draw_confirm(f, f.area(), &app.theme);
    }
    if app.show_help {
        draw_help(f, f.area(), &app.theme);
    }
    if app.show_welcome {
        draw_welcome(f, f.area(), &app.theme);
    }
}

fn draw_digest(f: &mut Frame, area: Rect, app: &App) {
    let line = Line::from(Span::styled(
        format!(" digest | {}", app.digest.line),
        Style::default().fg(app.theme.digest_fg),
    ));
    f.render_widget(Paragraph::new(line), area);
}

fn draw_sidebar(f: &mut Frame, area: Rect, app: &App) {
    let focused = matches!(app.focus, Focus::Sidebar);
    let title = Span::styled(
        TITLE_HISTORY,
        Style::default()
            .fg(app.theme.title_fg)
            .add_modifier(Modifier::BOLD),
    );
    let border_style = if focused {
        Style::default().fg(app.theme.border_focus)
    } else {
        Style::default().fg(app.theme.border_inactive)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner_h = area.height.saturating_sub(2) as usize;
    let inner_w = area.width.saturating_sub(4) as usize;
    let start = app.sidebar_scroll as usize;
    let mut lines: Vec<Line> = Vec::new();
    for (i, entry) in app
        .sidebar_entries
        .iter()
        .enumerate()
        .skip(start)
        .take(inner_h)
    {
        let prefix = if i == app.sidebar_selected { "> " } else { "  " };
        let style = if i == app.sidebar_selected {
            if focused {
                Style::default()
                    .fg(app.theme.sidebar_selected_fg)
                    .bg(app.theme.sidebar_selected_bg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .fg(app.theme.border_focus)
                    .add_modifier(Modifier::BOLD)
            }
        } else {
            Style::default()
        };
        let row = sidebar_row(&entry.question, inner_w);
        lines.push(Line::from(Span::styled(format!("{}{}", prefix, row), style)));
    }
    if start >= app.sidebar_entries.len() {
        lines.clear();
    }
    if app.sidebar_entries.is_empty() {
        lines.push(Line::from(Span::styled(
            "(no saved exchanges yet)",
            Style::default().fg(app.theme.hint_fg),
        )));
    }
    f.render_widget(Paragraph::new(lines).block(block), area);

    let inner = Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    let total = app.sidebar_entries.len();
    if total > inner.height as usize {
        let mut sb_state = ScrollbarState::new(total).position(app.sidebar_scroll as usize);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(sb, inner, &mut sb_state);
    }
}

fn draw_main(f: &mut Frame, area: Rect, app: &mut App) {
    let inner_width = area.width.saturating_sub(2);
    let input_total_lines = measure_total_lines(&app.input, inner_width).max(1) as u16;
    let target_lines = input_total_lines.min(app.input_max_lines);
    // Grow/shrink one row per frame so the input box does not jump.
    let current = app.input_visible_lines.max(1);
    app.input_visible_lines = if current < target_lines {
        current + 1
    } else if current > target_lines {
        current - 1
    } else {
        current
    };
    let input_height = app.input_visible_lines + 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(input_height),
        ])
        .split(area);

    app.chat_area = Some(chunks[0]);
    draw_chat(f, chunks[0], app);
    draw_status(f, chunks[1], app);
    draw_input(f, chunks[2], app, inner_width);
}

fn draw_chat(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .title(TITLE_CHAT)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.chat_border));

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    app.ensure_chat_wrapped(inner_width);
    let (viewport, _max_scroll, start_offset) = app.compute_chat_layout(inner_height);
    app.chat_viewport = viewport as u16;

    let mut y_offset = start_offset;
    let mut remaining = viewport;
    let mut vis_lines: Vec<Line> = Vec::new();

    for cached in app.chat_cache.iter() {
        let total = cached.lines.len();
        if y_offset >= total {
            y_offset -= total;
            continue;
        }
        let prefix = match cached.role {
            Role::User => PREFIX_USER,
            Role::Assistant => PREFIX_ASSISTANT,
        };
        let header_style = match cached.role {
            Role::User => Style::default()
                .fg(app.theme.user_fg)
                .add_modifier(Modifier::BOLD),
            Role::Assistant => Style::default()
                .fg(app.theme.assistant_fg)
                .add_modifier(Modifier::BOLD),
        };
        let body_style = if cached.is_error {
            Style::default().fg(app.theme.error_fg)
        } else {
            Style::default()
        };
        for (i, line) in cached.lines.iter().enumerate().skip(y_offset) {
            if remaining == 0 {
                break;
            }
            let mut spans: Vec<Span> = Vec::new();
            if i == 0 {
                // Prefixes are ASCII, so display width doubles as the
                // byte boundary for the colored header segment.
                let hb = UnicodeWidthStr::width(prefix).min(line.len());
                spans.push(Span::styled(line[..hb].to_string(), header_style));
                spans.push(Span::styled(line[hb..].to_string(), body_style));
            } else {
                spans.push(Span::styled(line.clone(), body_style));
            }
            vis_lines.push(Line::from(spans));
            remaining -= 1;
        }
        y_offset = 0;
        if remaining == 0 {
            break;
        }
    }

    f.render_widget(Paragraph::new(vis_lines).block(block), area);

    let inner = Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    };
    if app.chat_total_lines > inner.height as usize {
        let mut sb_state = ScrollbarState::new(app.chat_total_lines).position(start_offset);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(sb, inner, &mut sb_state);
    }
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let stick = build_stick_label(app.chat_scroll);
    let focus = match app.focus {
        Focus::Input => "Input",
        Focus::Sidebar => "History",
    };
    let text = build_status_line(
        &stick,
        focus,
        app.theme.name(),
        app.sidebar_entries.len(),
        app.pending.len(),
        area.width,
    );
    let line = Line::from(Span::styled(text, Style::default().fg(app.theme.hint_fg)));
    f.render_widget(Paragraph::new(line), area);
}

fn draw_input(f: &mut Frame, area: Rect, app: &App, inner_width: u16) {
    let focused = matches!(app.focus, Focus::Input);
    let border_style = if focused {
        Style::default().fg(app.theme.border_focus)
    } else {
        Style::default().fg(app.theme.border_inactive)
    };
    let block = Block::default()
        .title(TITLE_INPUT)
        .borders(Borders::ALL)
        .border_style(border_style);

    let graphemes: Vec<&str> = app.input.graphemes(true).collect();
    let upto = app.input_cursor.min(graphemes.len());
    let (cursor_line, cursor_col) = cursor_line_col(&graphemes, upto, inner_width);
    let offset_y = cursor_line.saturating_sub(app.input_visible_lines.saturating_sub(1));

    let para = if app.input.is_empty() {
        let hint = Line::from(Span::styled(
            INPUT_HINT,
            Style::default().fg(app.theme.hint_fg),
        ));
        Paragraph::new(hint).block(block).wrap(Wrap { trim: false })
    } else {
        Paragraph::new(app.input.clone())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((offset_y, 0))
    };
    f.render_widget(para, area);

    if focused {
        let cursor_x = area.x + 1 + cursor_col;
        let cursor_y = area.y + 1 + cursor_line.saturating_sub(offset_y);
        f.set_cursor_position(Position::new(cursor_x, cursor_y));
    }
}

fn draw_welcome(f: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = centered_rect(70, 60, area);
    let block = Block::default()
        .title(Span::styled(
            TITLE_WELCOME,
            Style::default()
                .fg(theme.title_fg)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let lines = welcome_lines()
        .iter()
        .map(|s| Line::from(*s))
        .collect::<Vec<Line>>();
    let para = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn draw_help(f: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = centered_rect(70, 70, area);
    let block = Block::default()
        .title(Span::styled(
            TITLE_HELP,
            Style::default()
                .fg(theme.title_fg)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let lines = help_lines()
        .iter()
        .map(|s| Line::from(*s))
        .collect::<Vec<Line>>();
    let para = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn draw_confirm(f: &mut Frame, area: Rect, theme: &Theme) {
    let popup_area = centered_rect(60, 30, area);
    let block = Block::default()
        .title(Span::styled(
            TITLE_CONFIRM,
            Style::default()
                .fg(theme.title_fg)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let lines = vec![Line::from(CONFIRM_DROP_RECENT)];
    let para = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1]);
    horiz[1]
}

fn measure_total_lines(s: &str, width: u16) -> usize {
    if width == 0 {
        return 1;
    }
    let mut lines = 1usize;
    let mut col = 0usize;
    for g in s.graphemes(true) {
        if g == "\n" {
            lines += 1;
            col = 0;
            continue;
        }
        let w = UnicodeWidthStr::width(g);
        if col + w > width as usize {
            lines += 1;
            col = 0;
        }
        col += w;
    }
    lines
}

// Where the caret lands after `upto` clusters, in wrapped (line, column)
// terms. Mirrors the Paragraph wrap above so the cursor tracks the text.
fn cursor_line_col(graphemes: &[&str], upto: usize, width: u16) -> (u16, u16) {
    if width == 0 {
        return (0, 0);
    }
    let mut line = 0usize;
    let mut col = 0usize;
    for g in graphemes.iter().take(upto) {
        if *g == "\n" {
            line += 1;
            col = 0;
            continue;
        }
        let w = UnicodeWidthStr::width(*g);
        if col + w > width as usize {
            line += 1;
            col = 0;
        }
        col += w;
    }
    (line as u16, col as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_counts_wrapped_and_explicit_lines() {
        assert_eq!(measure_total_lines("abcdef", 5), 2);
        assert_eq!(measure_total_lines("ab\ncdef", 80), 2);
        assert_eq!(measure_total_lines("", 10), 1);
    }

    #[test]
    fn cursor_tracks_wrap_boundaries() {
        let s = "abcdef";
        let g: Vec<&str> = s.graphemes(true).collect();
        assert_eq!(cursor_line_col(&g, 5, 5), (0, 5));
        assert_eq!(cursor_line_col(&g, 6, 5), (1, 1));
    }

    #[test]
    fn cursor_tracks_newlines() {
        let s = "ab\ncd";
        let g: Vec<&str> = s.graphemes(true).collect();
        assert_eq!(cursor_line_col(&g, 2, 80), (0, 2));
        assert_eq!(cursor_line_col(&g, 5, 80), (1, 2));
    }
}
