use directories::BaseDirs;
use serde::Deserialize;
use std::{env, fs, path::PathBuf, time::Duration};

const DEFAULT_API_BASE: &str = "http://localhost:8081";
const DEFAULT_ADVICE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_ADVICE_RETRIES: u32 = 1;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 400;
const DEFAULT_DIGEST_TIMEOUT_MS: u64 = 7_000;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AdviceFileConfig {
    pub api_base: Option<String>,
    pub advice_timeout_ms: Option<u64>,
    pub advice_retries: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub digest_timeout_ms: Option<u64>,
    pub digest_symbols: Option<Vec<String>>,
}

#[derive(Clone, Debug)]
pub struct AdviceConfig {
    pub api_base: String,
    pub advice_timeout: Duration,
    pub advice_retries: u32,
    pub retry_backoff: Duration,
    pub digest_timeout: Duration,
    pub digest_symbols: Vec<String>,
}

impl AdviceConfig {
    /// The base URL comes from `PULSE_API_BASE` when set, otherwise from the
    /// config file, otherwise the local default. Everything else is file
    /// values over built-in defaults; an unreadable or invalid file never
    /// blocks startup.
    pub fn from_env_and_file() -> Self {
        let mut file_cfg = AdviceFileConfig::default();
        if let Some(path) = Self::config_path() {
            if path.exists() {
                if let Ok(raw) = fs::read_to_string(&path) {
                    if let Ok(parsed) = toml::from_str::<AdviceFileConfig>(&raw) {
                        file_cfg = parsed;
                    }
                }
            }
        }
        let env_base = env::var("PULSE_API_BASE").ok().filter(|s| !s.trim().is_empty());
        Self::resolve(file_cfg, env_base)
    }

    fn resolve(file_cfg: AdviceFileConfig, env_base: Option<String>) -> Self {
        let api_base = env_base
            .or(file_cfg.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        AdviceConfig {
            api_base,
            advice_timeout: Duration::from_millis(
                file_cfg.advice_timeout_ms.unwrap_or(DEFAULT_ADVICE_TIMEOUT_MS),
            ),
            advice_retries: file_cfg.advice_retries.unwrap_or(DEFAULT_ADVICE_RETRIES),
            retry_backoff: Duration::from_millis(
                file_cfg.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
            ),
            digest_timeout: Duration::from_millis(
                file_cfg.digest_timeout_ms.unwrap_or(DEFAULT_DIGEST_TIMEOUT_MS),
            ),
            digest_symbols: file_cfg
                .digest_symbols
                .unwrap_or_else(default_digest_symbols),
        }
    }

    fn config_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        let p = if cfg!(target_os = "windows") {
            base.home_dir().join(".pulse").join("config.toml")
        } else {
            base.config_dir().join("pulse").join("config.toml")
        };
        Some(p)
    }
}

fn default_digest_symbols() -> Vec<String> {
    ["btc", "eth", "sol", "xau"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_configured() {
        let cfg = AdviceConfig::resolve(AdviceFileConfig::default(), None);
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.advice_timeout, Duration::from_millis(10_000));
        assert_eq!(cfg.advice_retries, 1);
        assert_eq!(cfg.retry_backoff, Duration::from_millis(400));
        assert_eq!(cfg.digest_timeout, Duration::from_millis(7_000));
        assert_eq!(cfg.digest_symbols, default_digest_symbols());
    }

    #[test]
    fn env_base_wins_over_file_base() {
        let file_cfg = AdviceFileConfig {
            api_base: Some("https://file.example".into()),
            ..Default::default()
        };
        let cfg = AdviceConfig::resolve(file_cfg, Some("https://env.example".into()));
        assert_eq!(cfg.api_base, "https://env.example");
    }

    #[test]
    fn file_ms_keys_are_honored() {
        let raw = r#"
            api_base = "https://advice.example"
            advice_timeout_ms = 4000
            advice_retries = 2
            retry_backoff_ms = 250
            digest_timeout_ms = 1500
            digest_symbols = ["btc", "spx"]
        "#;
        let file_cfg: AdviceFileConfig = toml::from_str(raw).unwrap();
        let cfg = AdviceConfig::resolve(file_cfg, None);
        assert_eq!(cfg.api_base, "https://advice.example");
        assert_eq!(cfg.advice_timeout, Duration::from_millis(4000));
        assert_eq!(cfg.advice_retries, 2);
        assert_eq!(cfg.retry_backoff, Duration::from_millis(250));
        assert_eq!(cfg.digest_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.digest_symbols, vec!["btc".to_string(), "spx".to_string()]);
    }
}
