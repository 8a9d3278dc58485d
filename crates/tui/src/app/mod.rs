use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use pulse_core::advice::{AdviceBackend as _, AdviceRequest};
use ratatui::layout::Rect;
use std::sync::mpsc::{Receiver, TryRecvError};
use tracing::{error, info};
use unicode_segmentation::UnicodeSegmentation;

pub mod chat;
pub mod digest;
pub mod history;
pub mod input;

use crate::persist::{self, HistoryEntry, HistoryStore};
use crate::strings;
use crate::theme::Theme;
use digest::DigestState;

#[derive(Clone, Debug)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Grouping key tying this bubble to its exchange (the hid).
    pub hid: u64,
    pub is_error: bool,
}

impl Message {
    pub fn user<S: Into<String>>(s: S, hid: u64) -> Self {
        Self {
            role: Role::User,
            content: s.into(),
            hid,
            is_error: false,
        }
    }
    pub fn assistant<S: Into<String>>(s: S, hid: u64) -> Self {
        Self {
            role: Role::Assistant,
            content: s.into(),
            hid,
            is_error: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sidebar,
}

#[derive(Clone)]
pub struct ConfirmState {
    pub action: ConfirmAction,
}

#[derive(Clone)]
pub enum ConfirmAction {
    DropMostRecent,
}

/// One in-flight advice call. Requests never cancel each other: every
/// submission gets its own channel and target bubble, and all of them may
/// settle independently.
pub struct PendingAsk {
    pub target_index: usize,
    pub question: String,
    pub hid: u64,
    pub rx: Receiver<Result<String, String>>,
}

pub struct App {
    pub messages: Vec<Message>,
    pub input: String,
    pub input_cursor: usize,
    pub recall: Vec<String>,
    pub recall_index: Option<usize>,
    pub store: HistoryStore,
    pub sidebar_entries: Vec<HistoryEntry>,
    pub sidebar_selected: usize,
    pub sidebar_scroll: u16,
    pub show_sidebar: bool,
    pub show_help: bool,
    pub show_welcome: bool,
    pub welcome_dismissed: bool,
    pub confirm: Option<ConfirmState>,
    pub theme: Theme,
    pub focus: Focus,
    pub should_quit: bool,
    pub dirty: bool,
    pub chat_scroll: u16,
    pub stick_to_bottom: bool,
    pub chat_viewport: u16,
    pub chat_area: Option<Rect>,
    pub sidebar_area: Option<Rect>,
    pub chat_wrap_width: u16,
    pub chat_cache: Vec<chat::WrappedMsg>,
    pub chat_total_lines: usize,
    pub input_visible_lines: u16,
    pub input_max_lines: u16,
    pub pending: Vec<PendingAsk>,
    pub digest: DigestState,
    cfg: providers::advice::AdviceConfig,
}

impl App {
    pub fn new() -> Self {
        let cfg = providers::advice::AdviceConfig::from_env_and_file();
        let store = HistoryStore::open();
        let saved = persist::load_state().ok().flatten().unwrap_or_default();
        // Input recall wants oldest-first so Up starts from the latest.
        let recall: Vec<String> = store
            .list()
            .iter()
            .rev()
            .map(|e| e.question.clone())
            .collect();
        let mut s = Self {
            messages: vec![Message::assistant(strings::BANNER, 0)],
            input: String::new(),
            input_cursor: 0,
            recall,
            recall_index: None,
            store,
            sidebar_entries: Vec::new(),
            sidebar_selected: 0,
            sidebar_scroll: 0,
            show_sidebar: saved.show_sidebar,
            show_help: false,
            show_welcome: !saved.welcome_dismissed,
            welcome_dismissed: saved.welcome_dismissed,
            confirm: None,
            theme: Theme::named(&saved.theme),
            focus: Focus::Input,
            should_quit: false,
            dirty: true,
            chat_scroll: 0,
            stick_to_bottom: true,
            chat_viewport: 0,
            chat_area: None,
            sidebar_area: None,
            chat_wrap_width: 0,
            chat_cache: Vec::new(),
            chat_total_lines: 0,
            input_visible_lines: 1,
            input_max_lines: 6,
            pending: Vec::new(),
            digest: DigestState::new(),
            cfg,
        };
        s.refresh_sidebar();
        s.spawn_digest_fetch();
        s
    }

    pub fn submit(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }
        self.record_recall_entry(&text);

        // The hid is minted here, once; the pending bubble and the later
        // history write share it.
        let hid = persist::now_ms();
        self.messages.push(Message::user(text.clone(), hid));
        let target_index = self.messages.len();
        self.messages
            .push(Message::assistant(strings::PENDING_ANSWER, hid));

        let (tx, rx) = std::sync::mpsc::channel::<Result<String, String>>();
        self.pending.push(PendingAsk {
            target_index,
            question: text.clone(),
            hid,
            rx,
        });
        info!(target: "tui", "submit: hid={} query_len={} in_flight={}", hid, text.len(), self.pending.len());

        let cfg = self.cfg.clone();
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = tx.send(Err(format!("runtime: {}", e)));
                    return;
                }
            };
            rt.block_on(async move {
                let client = match providers::advice::AdviceClient::new(cfg) {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(format!("client: {}", e)));
                        error!(target: "tui", "client build error: {}", e);
                        return;
                    }
                };
                let req = AdviceRequest::for_query(text);
                match client.ask(&req).await {
                    Ok(answer) => {
                        let _ = tx.send(Ok(answer));
                    }
                    Err(e) => {
                        error!(target: "tui", "ask failed: {}", e);
                        let _ = tx.send(Err(e.to_string()));
                    }
                }
            });
        });

        self.input.clear();
        self.input_cursor = 0;
        self.stick_to_bottom = true;
        self.chat_scroll = 0;
        self.dirty = true;
    }

    /// Replace the pending bubble with the definitive outcome and only
    /// then write history. Failed questions are kept with an empty answer
    /// so they stay recallable; the error text itself is not persisted.
    fn resolve_ask(&mut self, ask: PendingAsk, outcome: Result<String, String>) {
        match outcome {
            Ok(answer) => {
                if let Some(msg) = self.messages.get_mut(ask.target_index) {
                    msg.content = answer.clone();
                }
                self.store.push(&ask.question, &answer, Some(ask.hid));
            }
            Err(detail) => {
                if let Some(msg) = self.messages.get_mut(ask.target_index) {
                    msg.content = strings::format_error(&detail);
                    msg.is_error = true;
                }
                self.store.push(&ask.question, "", Some(ask.hid));
            }
        }
        self.refresh_sidebar();
        self.stick_to_bottom = true;
        self.dirty = true;
    }

    pub fn on_tick(&mut self) {
        // Drain settled advice calls. Each channel yields at most one
        // message; a dropped sender counts as a failed exchange.
        let mut done: Vec<(usize, Result<String, String>)> = Vec::new();
        for (i, p) in self.pending.iter().enumerate() {
            match p.rx.try_recv() {
                Ok(outcome) => done.push((i, outcome)),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    done.push((i, Err("request worker vanished".to_string())));
                }
            }
        }
        for (i, outcome) in done.into_iter().rev() {
            let ask = self.pending.remove(i);
            self.resolve_ask(ask, outcome);
        }

        if self.digest.poll() {
            self.dirty = true;
        }
        if self.digest.needs_refresh() {
            self.spawn_digest_fetch();
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if let KeyEventKind::Press = key.kind {
            if self.show_welcome {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                    self.show_welcome = false;
                    self.welcome_dismissed = true;
                    let _ = persist::save_state(self);
                }
                self.dirty = true;
                return;
            }

            if self.show_help {
                match key.code {
                    KeyCode::Esc | KeyCode::F(1) => {
                        self.show_help = false;
                    }
                    _ => {}
                }
                self.dirty = true;
                return;
            }

            if let Some(confirm) = self.confirm.clone() {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => {
                        match confirm.action {
                            ConfirmAction::DropMostRecent => self.drop_most_recent(),
                        }
                        self.confirm = None;
                    }
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                        self.confirm = None;
                    }
                    _ => {}
                }
                self.dirty = true;
                return;
            }

            match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.should_quit = true;
                }
                KeyCode::Esc => self.should_quit = true,
                KeyCode::F(1) => {
                    self.show_help = true;
                }
                KeyCode::F(2) => {
                    self.show_sidebar = !self.show_sidebar;
                    if !self.show_sidebar {
                        self.focus = Focus::Input;
                    }
                    let _ = persist::save_state(self);
                }
                KeyCode::F(4) => {
                    self.theme = self.theme.toggled();
                    let _ = persist::save_state(self);
                }
                KeyCode::F(5) => {
                    self.digest.mark_stale();
                }
                KeyCode::Tab => {
                    self.focus = match self.focus {
                        Focus::Input if self.show_sidebar => Focus::Sidebar,
                        _ => Focus::Input,
                    };
                }
                KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                    self.insert_text("\n");
                }
                KeyCode::Enter => match self.focus {
                    Focus::Input => self.submit(),
                    Focus::Sidebar => self.recall_selected_exchange(),
                },
                KeyCode::Backspace if matches!(self.focus, Focus::Input) => {
                    self.delete_left_grapheme();
                }
                KeyCode::Delete if matches!(self.focus, Focus::Input) => {
                    self.delete_right_grapheme();
                }
                KeyCode::Char('d') | KeyCode::Char('D')
                    if matches!(self.focus, Focus::Sidebar) =>
                {
                    if !self.sidebar_entries.is_empty() {
                        self.confirm = Some(ConfirmState {
                            action: ConfirmAction::DropMostRecent,
                        });
                    }
                }
                KeyCode::Delete if matches!(self.focus, Focus::Sidebar) => {
                    if !self.sidebar_entries.is_empty() {
                        self.confirm = Some(ConfirmState {
                            action: ConfirmAction::DropMostRecent,
                        });
                    }
                }
                KeyCode::Char(ch) => {
                    if matches!(self.focus, Focus::Input)
                        && !key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        let mut buf = [0u8; 4];
                        let s = ch.encode_utf8(&mut buf);
                        self.insert_text(s);
                    }
                }
                KeyCode::Left if matches!(self.focus, Focus::Input) => {
                    if key.modifiers.contains(KeyModifiers::CONTROL) {
                        self.move_cursor_word_left();
                    } else if self.input_cursor > 0 {
                        self.input_cursor -= 1;
                    }
                }
                KeyCode::Right if matches!(self.focus, Focus::Input) => {
                    if key.modifiers.contains(KeyModifiers::CONTROL) {
                        self.move_cursor_word_right();
                    } else {
                        let len = self.input.graphemes(true).count();
                        if self.input_cursor < len {
                            self.input_cursor += 1;
                        }
                    }
                }
                KeyCode::Home if matches!(self.focus, Focus::Input) => {
                    self.move_cursor_line_start();
                }
                KeyCode::End if matches!(self.focus, Focus::Input) => {
                    self.move_cursor_line_end();
                }
                KeyCode::Up if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.chat_scroll = self.chat_scroll.saturating_add(1);
                    self.stick_to_bottom = false;
                }
                KeyCode::Down if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.chat_scroll = self.chat_scroll.saturating_sub(1);
                    if self.chat_scroll == 0 {
                        self.stick_to_bottom = true;
                    }
                }
                KeyCode::Up if matches!(self.focus, Focus::Input) => {
                    self.recall_older();
                }
                KeyCode::Down if matches!(self.focus, Focus::Input) => {
                    self.recall_newer();
                }
                KeyCode::Up if matches!(self.focus, Focus::Sidebar) => {
                    self.sidebar_select_up();
                }
                KeyCode::Down if matches!(self.focus, Focus::Sidebar) => {
                    self.sidebar_select_down();
                }
                KeyCode::PageUp => {
                    let step = self.chat_viewport.max(1);
                    self.chat_scroll = self.chat_scroll.saturating_add(step);
                    self.stick_to_bottom = false;
                }
                KeyCode::PageDown => {
                    let step = self.chat_viewport.max(1);
                    self.chat_scroll = self.chat_scroll.saturating_sub(step);
                    if self.chat_scroll == 0 {
                        self.stick_to_bottom = true;
                    }
                }
                _ => {}
            }
            self.dirty = true;
        }
    }
}
