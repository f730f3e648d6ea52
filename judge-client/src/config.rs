use std::time::Duration;

use crate::error::Error;

/// Connection settings for a Judge0-compatible service
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Base URL of the judge API
    pub api_url: String,

    /// API key sent as `X-RapidAPI-Key`
    pub api_key: String,

    /// Optional `X-RapidAPI-Host` header value
    pub api_host: Option<String>,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

impl JudgeConfig {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            api_host: None,
            request_timeout: default_request_timeout(),
        }
    }

    /// Builds a configuration only when both the URL and the key are present.
    /// Missing credentials mean remote judging is switched off.
    pub fn from_parts(api_url: Option<String>, api_key: Option<String>) -> Option<Self> {
        let api_url = api_url.filter(|u| !u.trim().is_empty())?;
        let api_key = api_key.filter(|k| !k.trim().is_empty())?;
        Some(Self::new(api_url, api_key))
    }

    pub fn with_api_host(mut self, api_host: Option<String>) -> Self {
        self.api_host = api_host.filter(|h| !h.trim().is_empty());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(Error::Configuration(format!(
                "judge URL must be http(s): {}",
                self.api_url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_requires_both_values() {
        assert!(JudgeConfig::from_parts(None, Some("key".into())).is_none());
        assert!(JudgeConfig::from_parts(Some("http://judge".into()), None).is_none());
        assert!(JudgeConfig::from_parts(Some("http://judge".into()), Some("  ".into())).is_none());

        let config =
            JudgeConfig::from_parts(Some("http://judge/".into()), Some("key".into())).unwrap();
        assert_eq!(config.api_url, "http://judge");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = JudgeConfig::new("ftp://judge".into(), "key".into());
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }
}
