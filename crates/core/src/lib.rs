pub mod advice {
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;
    use thiserror::Error;

    /// JSON body accepted by the advice endpoint. Only `user_query` varies
    /// in this build; the profile fields are always sent with the fixed
    /// defaults from [`AdviceRequest::for_query`].
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AdviceRequest {
        pub user_query: String,
        pub goal: String,
        pub horizon: String,
        pub risk: String,
        pub capital: Option<f64>,
        pub stop_pct: Option<f64>,
        pub show_prices: bool,
        pub suppress_disclaimer: bool,
    }

    impl AdviceRequest {
        pub fn for_query<S: Into<String>>(q: S) -> Self {
            Self {
                user_query: q.into(),
                goal: String::new(),
                horizon: String::new(),
                risk: String::new(),
                capital: None,
                stop_pct: None,
                show_prices: true,
                suppress_disclaimer: false,
            }
        }
    }

    /// Digest figures for one symbol as served by the prices endpoint.
    /// Fields are optional so a partially populated payload still decodes.
    #[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
    pub struct SymbolStats {
        #[serde(default)]
        pub pct24: Option<f64>,
        #[serde(default)]
        pub rsi: Option<f64>,
        #[serde(default, rename = "volChg")]
        pub vol_chg: Option<f64>,
    }

    pub type PriceMap = BTreeMap<String, SymbolStats>;

    #[derive(Error, Debug)]
    pub enum AdviceError {
        #[error("timeout: {0}")] Timeout(String),
        #[error("network: {0}")] Network(String),
        #[error("status {code}: {snippet}")] Status { code: u16, snippet: String },
        #[error("decode: {0}")] Decode(String),
        #[error("other: {0}")] Other(String),
    }

    /// Shown in place of an answer when the backend reply carries none.
    pub const ANSWER_FALLBACK: &str =
        "No guidance came back for this question. Try rephrasing it.";

    /// Response-body diagnostics are capped at this many characters.
    pub const SNIPPET_MAX: usize = 180;

    pub fn snippet(body: &str) -> String {
        body.chars().take(SNIPPET_MAX).collect()
    }

    /// Extract the `answer` field from a raw advice response body. A body
    /// that is not JSON, or that has no string `answer`, yields the
    /// fallback text rather than an error.
    pub fn parse_answer(body: &str) -> String {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(v) => v["answer"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| ANSWER_FALLBACK.to_string()),
            Err(_) => ANSWER_FALLBACK.to_string(),
        }
    }

    #[allow(async_fn_in_trait)]
    pub trait AdviceBackend: Send + Sync {
        async fn ask(&self, req: &AdviceRequest) -> Result<String, AdviceError>;
        async fn prices(&self, symbols: &[String]) -> Result<PriceMap, AdviceError>;
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parse_answer_reads_the_answer_field() {
            let body = r#"{"answer":"hold both, size by risk"}"#;
            assert_eq!(parse_answer(body), "hold both, size by risk");
        }

        #[test]
        fn missing_answer_field_yields_fallback() {
            assert_eq!(parse_answer(r#"{"text":"nope"}"#), ANSWER_FALLBACK);
            assert_eq!(parse_answer(r#"{"answer":42}"#), ANSWER_FALLBACK);
        }

        #[test]
        fn non_json_body_yields_fallback() {
            assert_eq!(parse_answer("<html>502</html>"), ANSWER_FALLBACK);
            assert_eq!(parse_answer(""), ANSWER_FALLBACK);
        }

        #[test]
        fn snippet_caps_at_budget() {
            let long = "x".repeat(500);
            let s = snippet(&long);
            assert_eq!(s.chars().count(), SNIPPET_MAX);
            assert!(long.starts_with(&s));

            let short = "bad gateway";
            assert_eq!(snippet(short), short);
        }

        #[test]
        fn snippet_respects_char_boundaries() {
            let body = "é".repeat(200);
            assert_eq!(snippet(&body).chars().count(), SNIPPET_MAX);
        }

        #[test]
        fn symbol_stats_decode_with_renamed_and_missing_fields() {
            let raw = r#"{"btc":{"pct24":1.8,"rsi":64.0,"volChg":-3.2},"xau":{"rsi":51.0}}"#;
            let map: PriceMap = serde_json::from_str(raw).unwrap();
            let btc = &map["btc"];
            assert_eq!(btc.pct24, Some(1.8));
            assert_eq!(btc.vol_chg, Some(-3.2));
            let xau = &map["xau"];
            assert_eq!(xau.pct24, None);
            assert_eq!(xau.rsi, Some(51.0));
        }

        #[test]
        fn request_defaults_match_the_fixed_build_values() {
            let req = AdviceRequest::for_query("btc or gold? (6 months)");
            assert_eq!(req.user_query, "btc or gold? (6 months)");
            assert!(req.goal.is_empty() && req.horizon.is_empty() && req.risk.is_empty());
            assert!(req.capital.is_none() && req.stop_pct.is_none());
            assert!(req.show_prices);
            assert!(!req.suppress_disclaimer);
        }
    }
}
