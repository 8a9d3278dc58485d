use std::{
    fs,
    io::Write,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::app::App;

/// Most exchanges the question/answer history will hold.
pub const HISTORY_CAP: usize = 20;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Dedup key: byte-identical question text, nothing normalized.
    pub question: String,
    /// Empty when the exchange never got a usable answer.
    pub answer: String,
    /// Millisecond timestamp assigned when the exchange was created.
    /// Groups the question with its answer bubble; never recomputed.
    pub hid: u64,
}

/// Capped, deduplicated, most-recent-first store of past exchanges,
/// serialized as one JSON file. Storage trouble of any kind (missing dir,
/// unwritable file, corrupt JSON) degrades to empty/no-op: history is
/// convenience state the rest of the app must never fail over.
///
/// The read-modify-write in `push`/`pop_most_recent` is not atomic against
/// a second process; accepted limitation.
pub struct HistoryStore {
    path: Option<PathBuf>,
}

impl HistoryStore {
    pub fn open() -> Self {
        Self {
            path: history_path(),
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn at(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Fresh snapshot, most-recent-first, length <= HISTORY_CAP.
    pub fn list(&self) -> Vec<HistoryEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(data) = fs::read(path) else {
            return Vec::new();
        };
        serde_json::from_slice(&data).unwrap_or_default()
    }

    /// Record an exchange: drop any prior entry with the same question,
    /// prepend, truncate to the cap, persist. Returns the effective hid so
    /// the caller can tag its bubbles with the same grouping key.
    pub fn push(&self, question: &str, answer: &str, hid: Option<u64>) -> u64 {
        let hid = hid.unwrap_or_else(now_ms);
        let mut entries = self.list();
        entries.retain(|e| e.question != question);
        entries.insert(
            0,
            HistoryEntry {
                question: question.to_string(),
                answer: answer.to_string(),
                hid,
            },
        );
        entries.truncate(HISTORY_CAP);
        self.write_entries(&entries);
        hid
    }

    /// Remove and return entry 0. On an empty list nothing is written.
    pub fn pop_most_recent(&self) -> Option<HistoryEntry> {
        let mut entries = self.list();
        if entries.is_empty() {
            return None;
        }
        let entry = entries.remove(0);
        self.write_entries(&entries);
        Some(entry)
    }

    fn write_entries(&self, entries: &[HistoryEntry]) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let Ok(data) = serde_json::to_vec_pretty(entries) else {
            return;
        };
        let mut tmp = path.clone();
        tmp.set_extension("json.tmp");
        let written = fs::File::create(&tmp)
            .and_then(|mut f| {
                f.write_all(&data)?;
                f.flush()
            })
            .is_ok();
        if written {
            let _ = fs::rename(&tmp, path);
        }
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn history_path() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.config_dir().join("pulse").join("history.json"))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedState {
    pub theme: String,
    pub welcome_dismissed: bool,
    pub show_sidebar: bool,
}

impl Default for SavedState {
    fn default() -> Self {
        SavedState {
            theme: "dark".to_string(),
            welcome_dismissed: false,
            show_sidebar: true,
        }
    }
}

impl From<&App> for SavedState {
    fn from(a: &App) -> Self {
        SavedState {
            theme: a.theme.name().to_string(),
            welcome_dismissed: a.welcome_dismissed,
            show_sidebar: a.show_sidebar,
        }
    }
}

pub fn state_path() -> Option<PathBuf> {
    let base = BaseDirs::new()?;
    Some(base.config_dir().join("pulse").join("ui_state.json"))
}

pub fn load_state() -> Result<Option<SavedState>> {
    let Some(path) = state_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read(&path).with_context(|| format!("read state file: {}", path.display()))?;
    let s: SavedState = serde_json::from_slice(&data).with_context(|| "parse state json")?;
    Ok(Some(s))
}

pub fn save_state(app: &App) -> Result<()> {
    let Some(path) = state_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let s: SavedState = app.into();
    let data = serde_json::to_vec_pretty(&s)?;
    let mut tmp = path.clone();
    tmp.set_extension("json.tmp");
    {
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("create tmp: {}", tmp.display()))?;
        f.write_all(&data)?;
        f.flush()?;
    }
    fs::rename(tmp, &path).with_context(|| format!("persist state to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, HistoryStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let s = HistoryStore::at(dir.path().join("history.json"));
        (dir, s)
    }

    #[test]
    fn list_is_empty_before_any_push() {
        let (_dir, s) = store();
        assert!(s.list().is_empty());
    }

    #[test]
    fn push_caps_at_twenty_most_recent_first() {
        let (_dir, s) = store();
        for i in 0..25 {
            s.push(&format!("q{}", i), "a", Some(i as u64));
        }
        let entries = s.list();
        assert_eq!(entries.len(), HISTORY_CAP);
        assert_eq!(entries[0].question, "q24");
        assert_eq!(entries.last().unwrap().question, "q5");
    }

    #[test]
    fn duplicate_question_replaces_and_moves_to_front() {
        let (_dir, s) = store();
        s.push("a", "1", Some(10));
        s.push("b", "2", Some(20));
        s.push("a", "3", Some(30));
        let entries = s.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], HistoryEntry { question: "a".into(), answer: "3".into(), hid: 30 });
        assert_eq!(entries[1], HistoryEntry { question: "b".into(), answer: "2".into(), hid: 20 });
    }

    #[test]
    fn near_duplicate_questions_stay_distinct() {
        let (_dir, s) = store();
        s.push("btc?", "1", None);
        s.push("BTC?", "2", None);
        s.push(" btc?", "3", None);
        assert_eq!(s.list().len(), 3);
    }

    #[test]
    fn pop_on_empty_returns_none_and_touches_nothing() {
        let (dir, s) = store();
        assert!(s.pop_most_recent().is_none());
        assert!(!dir.path().join("history.json").exists());
    }

    #[test]
    fn pop_after_push_returns_entry_and_empties_list() {
        let (_dir, s) = store();
        let hid = s.push("a", "1", None);
        let popped = s.pop_most_recent().expect("entry");
        assert_eq!(popped.question, "a");
        assert_eq!(popped.answer, "1");
        assert_eq!(popped.hid, hid);
        assert!(s.list().is_empty());
    }

    #[test]
    fn explicit_hid_is_kept_verbatim() {
        let (_dir, s) = store();
        assert_eq!(s.push("q", "a", Some(42)), 42);
        assert_eq!(s.list()[0].hid, 42);
    }

    #[test]
    fn assigned_hid_is_current_time() {
        let (_dir, s) = store();
        let before = now_ms();
        let hid = s.push("q", "a", None);
        assert!(hid >= before && hid <= now_ms());
    }

    #[test]
    fn malformed_json_reads_as_empty() {
        let (dir, s) = store();
        fs::write(dir.path().join("history.json"), b"{not json!").unwrap();
        assert!(s.list().is_empty());
        // and the store keeps working on top of the wreckage
        s.push("q", "a", Some(1));
        assert_eq!(s.list().len(), 1);
    }

    #[test]
    fn unwritable_location_is_a_silent_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        // a file where the parent dir should be makes every write fail
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let s = HistoryStore::at(blocker.join("history.json"));
        let hid = s.push("q", "a", Some(5));
        assert_eq!(hid, 5);
        assert!(s.list().is_empty());
        assert!(s.pop_most_recent().is_none());
    }
}
