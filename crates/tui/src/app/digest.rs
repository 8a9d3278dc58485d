use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use pulse_core::advice::{AdviceBackend as _, PriceMap};
use tracing::warn;

use super::App;

/// How long a fetched digest stays fresh before the next poll.
pub const REFRESH_AFTER: Duration = Duration::from_secs(300);

/// The market digest line is strictly best-effort: a fetch that fails or
/// comes back empty turns into the offline placeholder, never an error.
pub struct DigestState {
    pub line: String,
    fetched_at: Option<Instant>,
    rx: Option<Receiver<Option<PriceMap>>>,
}

impl DigestState {
    pub fn new() -> Self {
        Self {
            line: placeholder_line(),
            fetched_at: None,
            rx: None,
        }
    }

    /// True when no fetch is in flight and the last one is stale or absent.
    pub fn needs_refresh(&self) -> bool {
        self.rx.is_none()
            && self
                .fetched_at
                .map_or(true, |t| t.elapsed() >= REFRESH_AFTER)
    }

    /// Manual refresh: forget freshness so the next tick refetches.
    pub fn mark_stale(&mut self) {
        self.fetched_at = None;
    }

    pub fn begin(&mut self, rx: Receiver<Option<PriceMap>>) {
        self.rx = Some(rx);
    }

    /// Drain the in-flight fetch, if any. Returns true when the line changed.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.rx else {
            return false;
        };
        match rx.try_recv() {
            Ok(report) => {
                self.line = match report {
                    Some(map) => digest_line(&map),
                    None => placeholder_line(),
                };
                self.fetched_at = Some(Instant::now());
                self.rx = None;
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.line = placeholder_line();
                self.fetched_at = Some(Instant::now());
                self.rx = None;
                true
            }
        }
    }
}

impl App {
    pub fn spawn_digest_fetch(&mut self) {
        let (tx, rx) = std::sync::mpsc::channel::<Option<PriceMap>>();
        self.digest.begin(rx);
        let cfg = self.cfg.clone();
        std::thread::spawn(move || {
            let Ok(rt) = tokio::runtime::Runtime::new() else {
                let _ = tx.send(None);
                return;
            };
            rt.block_on(async move {
                let report = match providers::advice::AdviceClient::new(cfg.clone()) {
                    Ok(client) => match client.prices(&cfg.digest_symbols).await {
                        Ok(map) if !map.is_empty() => Some(map),
                        Ok(_) => None,
                        Err(e) => {
                            warn!(target: "tui", "digest fetch failed: {}", e);
                            None
                        }
                    },
                    Err(e) => {
                        warn!(target: "tui", "digest client build error: {}", e);
                        None
                    }
                };
                let _ = tx.send(report);
            });
        });
    }
}

pub fn placeholder_line() -> String {
    "mood: unknown | opportunity: unknown | risk: unknown (offline)".to_string()
}

/// Reduce the per-symbol figures to the three digest indicators.
pub fn digest_line(map: &PriceMap) -> String {
    format!(
        "mood: {} | opportunity: {} | risk: {}",
        mood_label(map),
        opportunity_label(map),
        risk_label(map)
    )
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v;
        n += 1;
    }
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

// Mood follows the average 24-hour move across the tracked symbols.
fn mood_label(map: &PriceMap) -> String {
    match mean(map.values().filter_map(|s| s.pct24)) {
        Some(m) if m >= 0.5 => "risk-on".to_string(),
        Some(m) if m <= -0.5 => "risk-off".to_string(),
        Some(_) => "neutral".to_string(),
        None => "unknown".to_string(),
    }
}

// Opportunity calls out RSI extremes by symbol; oversold outranks
// stretched when both exist.
fn opportunity_label(map: &PriceMap) -> String {
    let oversold: Vec<&str> = map
        .iter()
        .filter(|(_, s)| s.rsi.is_some_and(|r| r <= 35.0))
        .map(|(k, _)| k.as_str())
        .collect();
    if !oversold.is_empty() {
        return format!("oversold {}", oversold.join("/"));
    }
    let stretched: Vec<&str> = map
        .iter()
        .filter(|(_, s)| s.rsi.is_some_and(|r| r >= 70.0))
        .map(|(k, _)| k.as_str())
        .collect();
    if !stretched.is_empty() {
        return format!("stretched {}", stretched.join("/"));
    }
    if map.values().any(|s| s.rsi.is_some()) {
        "balanced".to_string()
    } else {
        "unknown".to_string()
    }
}

// Risk tracks how much volume is moving around, sign ignored.
fn risk_label(map: &PriceMap) -> String {
    match mean(map.values().filter_map(|s| s.vol_chg).map(f64::abs)) {
        Some(v) if v >= 25.0 => "elevated".to_string(),
        Some(_) => "contained".to_string(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::advice::SymbolStats;

    fn stats(pct24: Option<f64>, rsi: Option<f64>, vol_chg: Option<f64>) -> SymbolStats {
        SymbolStats { pct24, rsi, vol_chg }
    }

    #[test]
    fn placeholder_says_offline() {
        assert!(placeholder_line().contains("(offline)"));
    }

    #[test]
    fn calm_positive_tape_reads_risk_on_and_contained() {
        let mut map = PriceMap::new();
        map.insert("btc".into(), stats(Some(2.0), Some(55.0), Some(5.0)));
        map.insert("eth".into(), stats(Some(1.0), Some(60.0), Some(-3.0)));
        let line = digest_line(&map);
        assert_eq!(line, "mood: risk-on | opportunity: balanced | risk: contained");
    }

    #[test]
    fn selloff_with_heavy_volume_reads_risk_off_and_elevated() {
        let mut map = PriceMap::new();
        map.insert("btc".into(), stats(Some(-4.0), Some(28.0), Some(40.0)));
        map.insert("sol".into(), stats(Some(-6.0), Some(31.0), Some(55.0)));
        let line = digest_line(&map);
        assert!(line.starts_with("mood: risk-off"));
        assert!(line.contains("opportunity: oversold btc/sol"));
        assert!(line.ends_with("risk: elevated"));
    }

    #[test]
    fn stretched_symbols_are_named_when_nothing_is_oversold() {
        let mut map = PriceMap::new();
        map.insert("btc".into(), stats(Some(0.1), Some(74.0), Some(2.0)));
        map.insert("xau".into(), stats(Some(-0.2), Some(50.0), Some(1.0)));
        let line = digest_line(&map);
        assert!(line.contains("mood: neutral"));
        assert!(line.contains("opportunity: stretched btc"));
    }

    #[test]
    fn absent_figures_read_unknown_without_offline_marker() {
        let mut map = PriceMap::new();
        map.insert("btc".into(), stats(None, None, None));
        let line = digest_line(&map);
        assert_eq!(line, "mood: unknown | opportunity: unknown | risk: unknown");
    }
}
