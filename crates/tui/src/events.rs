use std::time::{Duration, Instant};

use crossterm::event::{self, Event, MouseButton, MouseEventKind};
use ratatui::{backend::Backend, Terminal};

use crate::{app::App, persist, ui};

pub fn run<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let mut last_draw = Instant::now();
    let heartbeat = Duration::from_millis(500);
    loop {
        if app.dirty || last_draw.elapsed() >= heartbeat {
            terminal.draw(|f| ui::draw(f, app))?;
            app.dirty = false;
            last_draw = Instant::now();
        }
        if matches!(app.focus, crate::app::Focus::Input) {
            let _ = terminal.show_cursor();
        } else {
            let _ = terminal.hide_cursor();
        }

        if event::poll(Duration::from_millis(120))? {
            match event::read()? {
                Event::Key(key) => {
                    app.on_key(key);
                }
                Event::Paste(s) => {
                    app.insert_text(&s);
                    app.dirty = true;
                }
                Event::Resize(_, _) => {
                    app.dirty = true;
                }
                Event::Mouse(me) => {
                    if app.show_welcome || app.show_help {
                        // overlays are keyboard-dismissed
                    } else {
                        handle_mouse(app, me);
                    }
                }
                _ => {}
            }
        }

        app.on_tick();

        if app.should_quit {
            let _ = persist::save_state(app);
            break;
        }
    }
    Ok(())
}

fn handle_mouse(app: &mut App, me: crossterm::event::MouseEvent) {
    let inside = |area: ratatui::layout::Rect| {
        me.column >= area.x
            && me.column < area.x + area.width
            && me.row >= area.y
            && me.row < area.y + area.height
    };

    if let Some(area) = app.chat_area {
        if inside(area) {
            match me.kind {
                MouseEventKind::ScrollUp => {
                    app.chat_scroll = app.chat_scroll.saturating_add(3);
                    app.stick_to_bottom = false;
                    app.dirty = true;
                }
                MouseEventKind::ScrollDown => {
                    app.chat_scroll = app.chat_scroll.saturating_sub(3);
                    if app.chat_scroll == 0 {
                        app.stick_to_bottom = true;
                    }
                    app.dirty = true;
                }
                _ => {}
            }
        }
    }

    if !app.show_sidebar {
        return;
    }
    if let Some(area) = app.sidebar_area {
        if inside(area) {
            match me.kind {
                MouseEventKind::ScrollUp => {
                    app.sidebar_scroll = app.sidebar_scroll.saturating_sub(1);
                    app.dirty = true;
                }
                MouseEventKind::ScrollDown => {
                    app.sidebar_scroll =
                        (app.sidebar_scroll + 1).min(app.sidebar_max_scroll());
                    app.dirty = true;
                }
                MouseEventKind::Down(MouseButton::Left) => {
                    if me.row > area.y && me.row < area.y + area.height - 1 {
                        let idx =
                            app.sidebar_scroll as usize + (me.row - (area.y + 1)) as usize;
                        if idx < app.sidebar_entries.len() {
                            app.sidebar_selected = idx;
                            app.focus = crate::app::Focus::Sidebar;
                            app.recall_selected_exchange();
                            app.dirty = true;
                        }
                    }
                }
                _ => {}
            }
        }
    }
}
