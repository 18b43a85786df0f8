use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_BILLING_LINK: &str = "https://ai.google.dev/gemini-api/docs/billing";

#[derive(Debug, Clone)]
pub struct GenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub request_timeout: Option<Duration>,
}

/// Timing and limits for a single generation cycle.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub poll_interval: Duration,
    /// `None` keeps polling until the operation reports done or an error.
    pub max_poll_attempts: Option<u32>,
    pub status_rotation_interval: Duration,
    pub max_image_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub genai: GenAiConfig,
    pub generation: GenerationSettings,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        GenAiConfig {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

impl GenAiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let base_url = env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let request_timeout = positive_secs(env::var("VIDEO_REQUEST_TIMEOUT_SECS").ok());

        GenAiConfig {
            api_key,
            base_url,
            request_timeout,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().map_or(false, |key| !key.is_empty())
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        GenerationSettings {
            poll_interval: Duration::from_secs(10),
            max_poll_attempts: None,
            status_rotation_interval: Duration::from_secs(5),
            max_image_bytes: 20 * 1024 * 1024,
        }
    }
}

impl GenerationSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let poll_interval = positive_secs(env::var("VIDEO_POLL_INTERVAL_SECS").ok())
            .unwrap_or(defaults.poll_interval);
        let max_poll_attempts = env::var("VIDEO_MAX_POLL_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|attempts: &u32| *attempts > 0);
        let status_rotation_interval =
            positive_secs(env::var("VIDEO_STATUS_ROTATION_SECS").ok())
                .unwrap_or(defaults.status_rotation_interval);

        GenerationSettings {
            poll_interval,
            max_poll_attempts,
            status_rotation_interval,
            ..defaults
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = Some(attempts);
        self
    }

    pub fn with_status_rotation_interval(mut self, interval: Duration) -> Self {
        self.status_rotation_interval = interval;
        self
    }

    pub fn with_max_image_bytes(mut self, bytes: u64) -> Self {
        self.max_image_bytes = bytes;
        self
    }
}

/// Whole seconds from an env value. Zero and garbage fall back to the default.
fn positive_secs(value: Option<String>) -> Option<Duration> {
    value
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

impl Default for Config {
    fn default() -> Self {
        Config {
            genai: GenAiConfig::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            genai: GenAiConfig::from_env(),
            generation: GenerationSettings::from_env(),
        }
    }

    pub fn with_genai(mut self, config: GenAiConfig) -> Self {
        self.genai = config;
        self
    }

    pub fn with_generation(mut self, settings: GenerationSettings) -> Self {
        self.generation = settings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_timings() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.poll_interval, Duration::from_secs(10));
        assert_eq!(settings.status_rotation_interval, Duration::from_secs(5));
        assert!(settings.max_poll_attempts.is_none());
    }

    #[test]
    fn test_zero_intervals_are_ignored() {
        assert_eq!(positive_secs(Some("0".into())), None);
        assert_eq!(positive_secs(Some("ten".into())), None);
        assert_eq!(positive_secs(None), None);
        assert_eq!(positive_secs(Some(" 3 ".into())), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_builder_sets_key() {
        let config = GenAiConfig::new().with_api_key("abc");
        assert!(config.has_api_key());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(!GenAiConfig::new().with_api_key("").has_api_key());
    }
}
