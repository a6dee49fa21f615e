use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_BULK_TIME_LIMIT: Duration = Duration::from_secs(300);

/// How answers reach the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitMode {
    /// One submission per question; the client advances after each ack.
    #[default]
    PerQuestion,
    /// Answers are collected locally and sent together at the end.
    Bulk,
}

impl FromStr for SubmitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-question" | "per_question" | "question" => Ok(Self::PerQuestion),
            "bulk" => Ok(Self::Bulk),
            other => Err(format!("unknown submit mode: {other}")),
        }
    }
}

impl fmt::Display for SubmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerQuestion => f.write_str("per-question"),
            Self::Bulk => f.write_str("bulk"),
        }
    }
}

/// Settings for a participant client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub poll_interval: Duration,
    /// Total answering budget. `None` disables the countdown.
    pub time_limit: Option<Duration>,
    pub mode: SubmitMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            time_limit: None,
            mode: SubmitMode::PerQuestion,
        }
    }
}

impl ClientConfig {
    /// Read `QUIZ_API_URL`, `QUIZ_POLL_SECS`, `QUIZ_TIME_LIMIT_SECS` and `QUIZ_MODE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` over an arbitrary lookup. Unparseable values fall
    /// back to their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mode = lookup("QUIZ_MODE")
            .and_then(|raw| raw.parse::<SubmitMode>().ok())
            .unwrap_or_default();
        let api_base_url = lookup("QUIZ_API_URL")
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let poll_interval = lookup("QUIZ_POLL_SECS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_secs);
        let time_limit = lookup("QUIZ_TIME_LIMIT_SECS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        Self {
            api_base_url,
            poll_interval,
            time_limit: None,
            mode,
        }
        .with_mode(mode)
        .with_time_limit_override(time_limit)
    }

    /// Switch mode. Bulk mode gets the default budget if none is set.
    #[must_use]
    pub fn with_mode(mut self, mode: SubmitMode) -> Self {
        self.mode = mode;
        if mode == SubmitMode::Bulk && self.time_limit.is_none() {
            self.time_limit = Some(DEFAULT_BULK_TIME_LIMIT);
        }
        self
    }

    /// Explicit budget; a zero duration disables the countdown.
    #[must_use]
    pub fn with_time_limit_override(mut self, limit: Option<Duration>) -> Self {
        if let Some(limit) = limit {
            self.time_limit = (!limit.is_zero()).then_some(limit);
        }
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.poll_interval = interval;
        }
        self
    }

    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Budget for a single backend call. One poll interval, so a hung
    /// request has given up by the time the next poll goes out.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.poll_interval
    }

    /// Countdown budget in whole seconds, if any.
    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit
            .map(|limit| u32::try_from(limit.as_secs()).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert!(config.time_limit.is_none());
    }

    #[test]
    fn bulk_mode_gets_default_budget() {
        let config = ClientConfig::from_lookup(lookup(&[("QUIZ_MODE", "bulk")]));
        assert_eq!(config.mode, SubmitMode::Bulk);
        assert_eq!(config.time_limit_secs(), Some(300));
    }

    #[test]
    fn explicit_values_win() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("QUIZ_API_URL", "https://quiz.example/api"),
            ("QUIZ_POLL_SECS", "5"),
            ("QUIZ_TIME_LIMIT_SECS", "60"),
            ("QUIZ_MODE", "per-question"),
        ]));
        assert_eq!(config.api_base_url, "https://quiz.example/api");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.time_limit_secs(), Some(60));
    }

    #[test]
    fn request_timeout_follows_poll_interval() {
        let config = ClientConfig::default();
        assert_eq!(config.request_timeout(), DEFAULT_POLL_INTERVAL);
        let config = config.with_poll_interval(Duration::from_secs(7));
        assert_eq!(config.request_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("QUIZ_POLL_SECS", "soon"),
            ("QUIZ_TIME_LIMIT_SECS", "-1"),
        ]));
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert!(config.time_limit.is_none());
    }

    #[test]
    fn zero_limit_disables_bulk_countdown() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("QUIZ_MODE", "bulk"),
            ("QUIZ_TIME_LIMIT_SECS", "0"),
        ]));
        assert!(config.time_limit.is_none());
    }

    #[test]
    fn mode_parses_and_displays() {
        assert_eq!("Bulk".parse::<SubmitMode>().unwrap(), SubmitMode::Bulk);
        assert_eq!(SubmitMode::PerQuestion.to_string(), "per-question");
        assert!("sometimes".parse::<SubmitMode>().is_err());
    }
}
