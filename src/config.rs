use std::{env, fmt, time::Duration};

use thiserror::Error;

use crate::util::redact::redact;

#[derive(Clone, PartialEq)]
pub struct Config {
    api_key: String,
    llm_base_url: String,
    llm_model: String,
    llm_temperature: f64,
    llm_max_tokens: u32,
    llm_request_timeout: Duration,
    call_delay: Duration,
    cost_per_million_tokens: f64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から Taxonomy Mapper の設定値を読み込み、検証する。
    ///
    /// # Errors
    /// `GROQ_API_KEY` が未設定（または空）、もしくは各種値のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_var("GROQ_API_KEY")?;
        let llm_base_url = env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1/".to_string());
        let llm_model =
            env::var("LLM_MODEL").unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string());
        let llm_temperature = parse_f64("LLM_TEMPERATURE", 0.1)?;
        if !(0.0..=2.0).contains(&llm_temperature) {
            return Err(ConfigError::Invalid {
                name: "LLM_TEMPERATURE",
                source: anyhow::anyhow!("value must be between 0 and 2"),
            });
        }
        let llm_max_tokens = parse_u32("LLM_MAX_TOKENS", 500)?;
        let llm_request_timeout = parse_duration_secs("LLM_REQUEST_TIMEOUT_SECS", 60)?;

        // Batch throttle between cases
        let call_delay = parse_duration_ms("MAPPER_CALL_DELAY_MS", 500)?;
        let cost_per_million_tokens = parse_f64("MAPPER_COST_PER_MILLION_TOKENS", 0.20)?;

        Ok(Self {
            api_key,
            llm_base_url,
            llm_model,
            llm_temperature,
            llm_max_tokens,
            llm_request_timeout,
            call_delay,
            cost_per_million_tokens,
        })
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    #[must_use]
    pub fn llm_base_url(&self) -> &str {
        &self.llm_base_url
    }

    #[must_use]
    pub fn llm_model(&self) -> &str {
        &self.llm_model
    }

    #[must_use]
    pub fn llm_temperature(&self) -> f64 {
        self.llm_temperature
    }

    #[must_use]
    pub fn llm_max_tokens(&self) -> u32 {
        self.llm_max_tokens
    }

    #[must_use]
    pub fn llm_request_timeout(&self) -> Duration {
        self.llm_request_timeout
    }

    #[must_use]
    pub fn call_delay(&self) -> Duration {
        self.call_delay
    }

    #[must_use]
    pub fn cost_per_million_tokens(&self) -> f64 {
        self.cost_per_million_tokens
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &redact(&self.api_key))
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("llm_temperature", &self.llm_temperature)
            .field("llm_max_tokens", &self.llm_max_tokens)
            .field("llm_request_timeout", &self.llm_request_timeout)
            .field("call_delay", &self.call_delay)
            .field("cost_per_million_tokens", &self.cost_per_million_tokens)
            .finish()
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_duration_secs(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let value = parse_u64(name, default_secs)?;
    Ok(Duration::from_secs(value))
}

fn parse_duration_ms(name: &'static str, default_ms: u64) -> Result<Duration, ConfigError> {
    let value = parse_u64(name, default_ms)?;
    Ok(Duration::from_millis(value))
}

fn parse_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 8] = [
        "GROQ_API_KEY",
        "LLM_BASE_URL",
        "LLM_MODEL",
        "LLM_TEMPERATURE",
        "LLM_MAX_TOKENS",
        "LLM_REQUEST_TIMEOUT_SECS",
        "MAPPER_CALL_DELAY_MS",
        "MAPPER_COST_PER_MILLION_TOKENS",
    ];

    fn with_env<F: FnOnce()>(overrides: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = KEYS
            .iter()
            .map(|key| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| *value);
                (*key, value)
            })
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn from_env_uses_defaults_when_optional_missing() {
        with_env(&[("GROQ_API_KEY", "gsk_test")], || {
            let config = Config::from_env().expect("config should load");

            assert_eq!(config.api_key(), "gsk_test");
            assert_eq!(config.llm_base_url(), "https://api.groq.com/openai/v1/");
            assert_eq!(config.llm_model(), "llama-3.3-70b-versatile");
            assert!((config.llm_temperature() - 0.1).abs() < f64::EPSILON);
            assert_eq!(config.llm_max_tokens(), 500);
            assert_eq!(config.llm_request_timeout(), Duration::from_secs(60));
            assert_eq!(config.call_delay(), Duration::from_millis(500));
            assert!((config.cost_per_million_tokens() - 0.20).abs() < f64::EPSILON);
        });
    }

    #[test]
    fn from_env_overrides_values() {
        with_env(
            &[
                ("GROQ_API_KEY", "gsk_other"),
                ("LLM_BASE_URL", "http://localhost:8080/v1/"),
                ("LLM_MODEL", "llama-3.1-8b-instant"),
                ("LLM_TEMPERATURE", "0"),
                ("LLM_MAX_TOKENS", "256"),
                ("LLM_REQUEST_TIMEOUT_SECS", "15"),
                ("MAPPER_CALL_DELAY_MS", "0"),
                ("MAPPER_COST_PER_MILLION_TOKENS", "0.59"),
            ],
            || {
                let config = Config::from_env().expect("config should load");

                assert_eq!(config.llm_base_url(), "http://localhost:8080/v1/");
                assert_eq!(config.llm_model(), "llama-3.1-8b-instant");
                assert!(config.llm_temperature().abs() < f64::EPSILON);
                assert_eq!(config.llm_max_tokens(), 256);
                assert_eq!(config.llm_request_timeout(), Duration::from_secs(15));
                assert_eq!(config.call_delay(), Duration::ZERO);
                assert!((config.cost_per_million_tokens() - 0.59).abs() < f64::EPSILON);
            },
        );
    }

    #[test]
    fn from_env_errors_when_api_key_missing() {
        with_env(&[], || {
            let error = Config::from_env().expect_err("missing key should fail");
            assert!(matches!(error, ConfigError::Missing("GROQ_API_KEY")));
        });
    }

    #[test]
    fn from_env_treats_blank_api_key_as_missing() {
        with_env(&[("GROQ_API_KEY", "   ")], || {
            let error = Config::from_env().expect_err("blank key should fail");
            assert!(matches!(error, ConfigError::Missing("GROQ_API_KEY")));
        });
    }

    #[test]
    fn from_env_rejects_invalid_numbers() {
        with_env(
            &[("GROQ_API_KEY", "gsk_test"), ("LLM_MAX_TOKENS", "lots")],
            || {
                let error = Config::from_env().expect_err("invalid number should fail");
                assert!(matches!(
                    error,
                    ConfigError::Invalid {
                        name: "LLM_MAX_TOKENS",
                        ..
                    }
                ));
            },
        );
    }

    #[test]
    fn from_env_rejects_out_of_range_temperature() {
        with_env(
            &[("GROQ_API_KEY", "gsk_test"), ("LLM_TEMPERATURE", "3.5")],
            || {
                let error = Config::from_env().expect_err("temperature should fail");
                assert!(matches!(
                    error,
                    ConfigError::Invalid {
                        name: "LLM_TEMPERATURE",
                        ..
                    }
                ));
            },
        );
    }

    #[test]
    fn debug_output_redacts_api_key() {
        with_env(&[("GROQ_API_KEY", "gsk_secret_value")], || {
            let config = Config::from_env().expect("config should load");
            let rendered = format!("{config:?}");
            assert!(!rendered.contains("secret_value"));
        });
    }
}
