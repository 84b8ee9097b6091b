//! Runtime configuration
//!
//! Built once at process start and handed by reference to every
//! collaborator constructor. Core code never reads the environment.

use crate::error::ChatbotError;
use crate::Result;
use reqwest::{Client, ClientBuilder};
use std::env;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SERPER_ENDPOINT: &str = "https://google.serper.dev/search";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

pub const DEFAULT_SYSTEM_PROMPT: &str = "Eres un asistente útil. Cuando uses fuentes externas, cita al final \
con una lista de URLs. Si no encuentras información confiable, dilo claramente.";

#[derive(Debug, Clone)]
pub struct Settings {
    pub serper_api_key: String,
    pub openai_api_key: String,
    pub model: String,
    pub serper_endpoint: String,
    pub openai_base_url: String,
    pub http_timeout: Duration,
    pub temperature: f32,
    pub system_prompt: String,
    /// Ignore proxy environment variables for outbound HTTP.
    pub no_proxy: bool,
}

impl Settings {
    /// Settings with the given keys and every optional value at its default.
    pub fn new(serper_api_key: impl Into<String>, openai_api_key: impl Into<String>) -> Self {
        Self {
            serper_api_key: serper_api_key.into(),
            openai_api_key: openai_api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            serper_endpoint: DEFAULT_SERPER_ENDPOINT.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            no_proxy: false,
        }
    }

    /// Connection-pooled HTTP client for request/response calls. The
    /// timeout bounds the whole exchange, body included.
    pub fn http_client(&self) -> Result<Client> {
        Ok(self.client_builder().timeout(self.http_timeout).build()?)
    }

    /// Client for long-lived streamed responses. Only connecting and the
    /// gap between reads are bounded, so a healthy stream may run as long
    /// as it keeps producing.
    pub fn streaming_http_client(&self) -> Result<Client> {
        Ok(self
            .client_builder()
            .connect_timeout(self.http_timeout)
            .read_timeout(self.http_timeout)
            .build()?)
    }

    fn client_builder(&self) -> ClientBuilder {
        let builder = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .user_agent(concat!("web-search-chatbot/", env!("CARGO_PKG_VERSION")));

        if self.no_proxy {
            builder.no_proxy()
        } else {
            builder
        }
    }

    /// Load `.env` (if any) and read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let serper_api_key = non_empty("SERPER_API_KEY")
            .ok_or_else(|| ChatbotError::ConfigMissing("SERPER_API_KEY".to_string()))?;
        let openai_api_key = non_empty("OPENAI_API_KEY")
            .ok_or_else(|| ChatbotError::ConfigMissing("OPENAI_API_KEY".to_string()))?;

        let mut settings = Self::new(serper_api_key, openai_api_key);

        if let Some(model) = non_empty("MODEL") {
            settings.model = model;
        }
        if let Some(endpoint) = non_empty("SERPER_ENDPOINT") {
            settings.serper_endpoint = endpoint;
        }
        if let Some(base_url) = non_empty("OPENAI_BASE_URL") {
            settings.openai_base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = non_empty("HTTP_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ChatbotError::InvalidConfig(format!(
                    "HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?;
            settings.http_timeout = Duration::from_secs(secs);
        }
        if let Some(prompt) = non_empty("SYSTEM_PROMPT") {
            settings.system_prompt = prompt;
        }
        if let Some(raw) = non_empty("HTTP_NO_PROXY") {
            settings.no_proxy = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        debug!(
            model = %settings.model,
            serper_endpoint = %settings.serper_endpoint,
            openai_base_url = %settings.openai_base_url,
            timeout_secs = settings.http_timeout.as_secs(),
            "Settings loaded"
        );

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio_test::{assert_err, assert_ok};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let settings = assert_ok!(Settings::from_lookup(lookup_from(&[
            ("SERPER_API_KEY", "test-serper-key"),
            ("OPENAI_API_KEY", "test-openai-key"),
        ])));

        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.serper_endpoint, DEFAULT_SERPER_ENDPOINT);
        assert_eq!(settings.http_timeout, Duration::from_secs(20));
        assert_eq!(settings.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_missing_serper_key() {
        let err = assert_err!(Settings::from_lookup(lookup_from(&[(
            "OPENAI_API_KEY",
            "test-openai-key"
        )])));
        assert!(matches!(err, ChatbotError::ConfigMissing(ref k) if k == "SERPER_API_KEY"));
    }

    #[test]
    fn test_empty_openai_key_counts_as_missing() {
        let err = assert_err!(Settings::from_lookup(lookup_from(&[
            ("SERPER_API_KEY", "test-serper-key"),
            ("OPENAI_API_KEY", "  "),
        ])));
        assert!(matches!(err, ChatbotError::ConfigMissing(ref k) if k == "OPENAI_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let settings = assert_ok!(Settings::from_lookup(lookup_from(&[
            ("SERPER_API_KEY", "s"),
            ("OPENAI_API_KEY", "o"),
            ("MODEL", "gpt-4o"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("HTTP_TIMEOUT_SECS", "5"),
        ])));

        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.openai_base_url, "http://localhost:8080/v1");
        assert_eq!(settings.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let err = assert_err!(Settings::from_lookup(lookup_from(&[
            ("SERPER_API_KEY", "s"),
            ("OPENAI_API_KEY", "o"),
            ("HTTP_TIMEOUT_SECS", "soon"),
        ])));
        assert!(matches!(err, ChatbotError::InvalidConfig(_)));
    }
}
