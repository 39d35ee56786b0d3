use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::pipeline::analysis::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};

/// Application-level constants
pub const APP_NAME: &str = "health-profiler";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default model request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_BASE_URL: &str = "GEMINI_API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "GEMINI_TIMEOUT_SECS";
pub const ENV_TEMPERATURE: &str = "GEMINI_TEMPERATURE";
pub const ENV_ATTACH_IMAGE: &str = "HEALTH_PROFILER_ATTACH_IMAGE";
pub const ENV_ENFORCE_COMPLETENESS: &str = "HEALTH_PROFILER_ENFORCE_COMPLETENESS";
pub const ENV_TESSDATA: &str = "TESSDATA_PREFIX";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "health_profiler=debug,warn"
    } else {
        "health_profiler=info,warn"
    }
}

/// Everything the analyzer reads at runtime. Loaded once by the host and
/// injected; nothing reads the environment after construction.
#[derive(Clone)]
pub struct AnalyzerConfig {
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Sampling temperature; the service default applies when unset.
    pub temperature: Option<f32>,
    /// Send the normalized image alongside the OCR text.
    pub attach_image: bool,
    /// Downgrade `ok` results whose own extraction is mostly unknown.
    pub enforce_completeness: bool,
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            temperature: None,
            attach_image: false,
            enforce_completeness: true,
            tessdata_dir: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("gemini_api_key", &self.api_key().map(|_| "***"))
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("temperature", &self.temperature)
            .field("attach_image", &self.attach_image)
            .field("enforce_completeness", &self.enforce_completeness)
            .field("tessdata_dir", &self.tessdata_dir)
            .finish()
    }
}

impl AnalyzerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_map(&std::env::vars().collect())
    }

    /// Load from a provided map (useful for testing).
    ///
    /// Malformed values never fail loading: they fall back to the default
    /// with a warning.
    pub fn from_env_map(env: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let get = |name: &str| {
            env.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let config = Self {
            gemini_api_key: get(ENV_API_KEY).map(str::to_string),
            model: get(ENV_MODEL).map_or(defaults.model, str::to_string),
            api_base_url: get(ENV_BASE_URL)
                .map_or(defaults.api_base_url, |url| url.trim_end_matches('/').to_string()),
            request_timeout_secs: parse_env::<u64>(ENV_TIMEOUT_SECS, get(ENV_TIMEOUT_SECS))
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.request_timeout_secs),
            temperature: parse_env::<f32>(ENV_TEMPERATURE, get(ENV_TEMPERATURE))
                .filter(|t| t.is_finite() && *t >= 0.0),
            attach_image: parse_flag(ENV_ATTACH_IMAGE, get(ENV_ATTACH_IMAGE))
                .unwrap_or(defaults.attach_image),
            enforce_completeness: parse_flag(
                ENV_ENFORCE_COMPLETENESS,
                get(ENV_ENFORCE_COMPLETENESS),
            )
            .unwrap_or(defaults.enforce_completeness),
            tessdata_dir: get(ENV_TESSDATA).map(PathBuf::from),
        };

        if !config.has_api_key() {
            tracing::warn!(
                "{ENV_API_KEY} not set; every analysis will report a configuration error"
            );
        }
        config
    }

    /// The API key, treating a blank value as missing.
    pub fn api_key(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }
}

fn parse_env<T: FromStr>(name: &str, value: Option<&str>) -> Option<T> {
    let value = value?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(var = name, "Ignoring malformed value; using default");
            None
        }
    }
}

fn parse_flag(name: &str, value: Option<&str>) -> Option<bool> {
    let value = value?;
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(var = name, "Ignoring malformed flag; using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_env_gives_defaults() {
        let config = AnalyzerConfig::from_env_map(&HashMap::new());
        assert_eq!(config.api_key(), None);
        assert_eq!(config.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.api_base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.temperature, None);
        assert!(!config.attach_image);
        assert!(config.enforce_completeness);
        assert_eq!(config.tessdata_dir, None);
    }

    #[test]
    fn reads_every_variable() {
        let config = AnalyzerConfig::from_env_map(&env(&[
            (ENV_API_KEY, "secret-key"),
            (ENV_MODEL, "gemini-2.5-pro"),
            (ENV_BASE_URL, "http://localhost:8080/"),
            (ENV_TIMEOUT_SECS, "15"),
            (ENV_TEMPERATURE, "0.2"),
            (ENV_ATTACH_IMAGE, "true"),
            (ENV_ENFORCE_COMPLETENESS, "off"),
            (ENV_TESSDATA, "/usr/share/tessdata"),
        ]));
        assert_eq!(config.api_key(), Some("secret-key"));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.temperature, Some(0.2));
        assert!(config.attach_image);
        assert!(!config.enforce_completeness);
        assert_eq!(config.tessdata_dir, Some(PathBuf::from("/usr/share/tessdata")));
    }

    #[test]
    fn malformed_values_fall_back() {
        let config = AnalyzerConfig::from_env_map(&env(&[
            (ENV_TIMEOUT_SECS, "soon"),
            (ENV_TEMPERATURE, "-1"),
            (ENV_ATTACH_IMAGE, "maybe"),
            (ENV_ENFORCE_COMPLETENESS, "2"),
        ]));
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.temperature, None);
        assert!(!config.attach_image);
        assert!(config.enforce_completeness);
    }

    #[test]
    fn zero_timeout_falls_back() {
        let config = AnalyzerConfig::from_env_map(&env(&[(ENV_TIMEOUT_SECS, "0")]));
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = AnalyzerConfig::default().with_api_key("   ");
        assert!(!config.has_api_key());

        let config = AnalyzerConfig::from_env_map(&env(&[(ENV_API_KEY, "")]));
        assert!(!config.has_api_key());
    }

    #[test]
    fn debug_redacts_key() {
        let config = AnalyzerConfig::default().with_api_key("AIzaSy-very-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
