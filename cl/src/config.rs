//! Clarifier configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::clarify::Locale;
use crate::llm::LlmError;

/// Upper bound on `server.session-ttl-secs` (ten years)
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Main Clarifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Clarification behaviour
    pub clarifier: ClarifierConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Log filter used when `--log-level` is not given
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key is present and the numeric settings are in
    /// range. Call this early in startup to fail fast with clear messages.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key().is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if self.clarifier.max_rounds == 0 {
            return Err(eyre::eyre!("clarifier.max-rounds must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(eyre::eyre!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            ));
        }
        if self.server.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(eyre::eyre!(
                "server.session-ttl-secs must be at most {}, got {}",
                MAX_SESSION_TTL_SECS,
                self.server.session_ttl_secs
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.apply_overrides_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .clarifier.yml
        let local_config = PathBuf::from(".clarifier.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/clarifier/clarifier.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("clarifier").join("clarifier.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply `CLARIFIER_*` overrides, reading variables through `lookup`
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("CLARIFIER_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Some(model) = lookup("CLARIFIER_MODEL") {
            self.llm.model = model;
        }
        if let Some(rounds) = lookup("CLARIFIER_MAX_ROUNDS") {
            self.clarifier.max_rounds = rounds
                .trim()
                .parse()
                .context(format!("Invalid CLARIFIER_MAX_ROUNDS: {}", rounds))?;
        }
        if let Some(temperature) = lookup("CLARIFIER_TEMPERATURE") {
            self.llm.temperature = temperature
                .trim()
                .parse()
                .context(format!("Invalid CLARIFIER_TEMPERATURE: {}", temperature))?;
        }
        if let Some(bind) = lookup("CLARIFIER_BIND") {
            self.server.bind = bind;
        }
        if let Some(locale) = lookup("CLARIFIER_LOCALE") {
            self.clarifier.locale = locale
                .parse()
                .map_err(|e: String| eyre::eyre!("Invalid CLARIFIER_LOCALE: {}", e))?;
        }
        Ok(())
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("deepseek" or "openai")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Sampling temperature
    pub temperature: f32,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    ///
    /// An empty or whitespace-only value counts as missing.
    pub fn api_key(&self) -> Result<String, LlmError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(self.api_key_env.clone()))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
            model: "deepseek-chat".to_string(),
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
            base_url: "https://api.deepseek.com".to_string(),
            max_tokens: 1024,
            timeout_ms: 60_000,
            temperature: 0.0,
        }
    }
}

/// Clarification behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClarifierConfig {
    /// Upper bound on rounds per session
    #[serde(rename = "max-rounds")]
    pub max_rounds: u32,

    /// Language of hints, fallbacks and summaries
    pub locale: Locale,

    /// Keywords that trigger a context question; locale defaults when unset
    #[serde(rename = "context-keywords", skip_serializing_if = "Option::is_none")]
    pub context_keywords: Option<Vec<String>>,

    /// Directory holding `.pmt` prompt overrides
    #[serde(rename = "prompts-dir", skip_serializing_if = "Option::is_none")]
    pub prompts_dir: Option<PathBuf>,
}

impl ClarifierConfig {
    /// Configured keywords, or the locale's defaults
    pub fn context_keywords(&self) -> Vec<String> {
        self.context_keywords
            .clone()
            .unwrap_or_else(|| self.locale.default_context_keywords())
    }
}

impl Default for ClarifierConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            locale: Locale::default(),
            context_keywords: None,
            prompts_dir: None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,

    /// Idle time after which a session is evicted; 0 disables eviction
    #[serde(rename = "session-ttl-secs")]
    pub session_ttl_secs: u64,

    /// Interval between eviction sweeps
    #[serde(rename = "sweep-interval-secs")]
    pub sweep_interval_secs: u64,
}

impl ServerConfig {
    /// Idle TTL as a duration; `None` when eviction is disabled or the value is out of range
    pub fn session_ttl(&self) -> Option<chrono::Duration> {
        if self.session_ttl_secs == 0 || self.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return None;
        }
        i64::try_from(self.session_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:18890".to_string(),
            session_ttl_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "deepseek");
        assert_eq!(config.clarifier.max_rounds, 5);
        assert_eq!(config.server.bind, "0.0.0.0:18890");
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();

        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.api_key_env, "DEEPSEEK_API_KEY");
        assert_eq!(config.base_url, "https://api.deepseek.com");
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  provider: openai
  model: gpt-4o-mini
  api-key-env: MY_API_KEY
  base-url: https://api.example.com
  max-tokens: 2048
  timeout-ms: 30000
  temperature: 0.3

clarifier:
  max-rounds: 3
  locale: zh
  context-keywords: [budget, family]
  prompts-dir: /etc/clarifier/prompts

server:
  bind: 127.0.0.1:9000
  session-ttl-secs: 600

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.temperature, 0.3);
        assert_eq!(config.clarifier.max_rounds, 3);
        assert_eq!(config.clarifier.locale, Locale::Chinese);
        assert_eq!(config.clarifier.context_keywords(), vec!["budget", "family"]);
        assert_eq!(config.clarifier.prompts_dir, Some(PathBuf::from("/etc/clarifier/prompts")));
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.server.session_ttl_secs, 600);
        assert_eq!(config.server.sweep_interval_secs, 60);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: deepseek-reasoner
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.llm.model, "deepseek-reasoner");

        // Defaults for unspecified
        assert_eq!(config.llm.provider, "deepseek");
        assert_eq!(config.clarifier.locale, Locale::English);
        assert_eq!(
            config.clarifier.context_keywords(),
            Locale::English.default_context_keywords()
        );
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "clarifier:\n  max-rounds: 2").unwrap();

        let config = Config::load_file_chain(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.clarifier.max_rounds, 2);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yml");
        assert!(Config::load_file_chain(Some(&missing)).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CLARIFIER_BASE_URL", "http://localhost:8080"),
            ("CLARIFIER_MODEL", "local-model"),
            ("CLARIFIER_MAX_ROUNDS", "7"),
            ("CLARIFIER_TEMPERATURE", "0.5"),
            ("CLARIFIER_BIND", "127.0.0.1:1234"),
            ("CLARIFIER_LOCALE", "zh"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.llm.base_url, "http://localhost:8080");
        assert_eq!(config.llm.model, "local-model");
        assert_eq!(config.clarifier.max_rounds, 7);
        assert_eq!(config.llm.temperature, 0.5);
        assert_eq!(config.server.bind, "127.0.0.1:1234");
        assert_eq!(config.clarifier.locale, Locale::Chinese);
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let mut config = Config::default();
        let result = config.apply_overrides_from(|key| (key == "CLARIFIER_MAX_ROUNDS").then(|| "many".to_string()));
        assert!(result.is_err());
    }

    #[test]
    #[serial_test::serial]
    fn test_validate() {
        let mut config = Config::default();
        config.llm.api_key_env = "CLARIFIER_TEST_VALIDATE_KEY".to_string();

        // SAFETY: serialized with other env-mutating tests
        unsafe { std::env::remove_var("CLARIFIER_TEST_VALIDATE_KEY") };
        assert!(config.validate().is_err());

        unsafe { std::env::set_var("CLARIFIER_TEST_VALIDATE_KEY", "sk-test") };
        assert!(config.validate().is_ok());

        config.clarifier.max_rounds = 0;
        assert!(config.validate().is_err());
        config.clarifier.max_rounds = 5;

        config.llm.temperature = 2.5;
        assert!(config.validate().is_err());

        unsafe { std::env::remove_var("CLARIFIER_TEST_VALIDATE_KEY") };
    }

    #[test]
    #[serial_test::serial]
    fn test_blank_api_key_counts_as_missing() {
        let mut config = Config::default();
        config.llm.api_key_env = "CLARIFIER_TEST_BLANK_KEY".to_string();

        for blank in ["", "   "] {
            // SAFETY: serialized with other env-mutating tests
            unsafe { std::env::set_var("CLARIFIER_TEST_BLANK_KEY", blank) };
            assert!(config.validate().is_err(), "accepted key {:?}", blank);
            assert!(matches!(
                config.llm.api_key(),
                Err(LlmError::MissingApiKey(name)) if name == "CLARIFIER_TEST_BLANK_KEY"
            ));
        }

        unsafe { std::env::set_var("CLARIFIER_TEST_BLANK_KEY", "sk-test") };
        assert_eq!(config.llm.api_key().unwrap(), "sk-test");

        unsafe { std::env::remove_var("CLARIFIER_TEST_BLANK_KEY") };
    }

    #[test]
    #[serial_test::serial]
    fn test_validate_session_ttl_range() {
        let mut config = Config::default();
        config.llm.api_key_env = "CLARIFIER_TEST_TTL_KEY".to_string();
        // SAFETY: serialized with other env-mutating tests
        unsafe { std::env::set_var("CLARIFIER_TEST_TTL_KEY", "sk-test") };

        config.server.session_ttl_secs = 0;
        assert!(config.validate().is_ok());

        config.server.session_ttl_secs = MAX_SESSION_TTL_SECS;
        assert!(config.validate().is_ok());

        for too_large in [MAX_SESSION_TTL_SECS + 1, 10_000_000_000_000, i64::MAX as u64 + 1, u64::MAX] {
            config.server.session_ttl_secs = too_large;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("session-ttl-secs"));
        }

        unsafe { std::env::remove_var("CLARIFIER_TEST_TTL_KEY") };
    }

    #[test]
    fn test_session_ttl_conversion() {
        let mut server = ServerConfig::default();
        assert_eq!(server.session_ttl(), Some(chrono::Duration::seconds(3600)));

        server.session_ttl_secs = 0;
        assert_eq!(server.session_ttl(), None);

        for too_large in [MAX_SESSION_TTL_SECS + 1, i64::MAX as u64 + 1, u64::MAX] {
            server.session_ttl_secs = too_large;
            assert_eq!(server.session_ttl(), None);
        }
    }
}
