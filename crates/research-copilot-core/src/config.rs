use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Language codes as understood by the backend (ISO 639-1)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Persisted client cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Persist the document list between runs
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache directory (defaults to $XDG_CACHE_HOME/research-copilot)
    pub path: Option<PathBuf>,
}

const fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Timing of the simulated processing indicator shown during uploads.
///
/// Offsets are measured from the start of the upload. They only pace the
/// indicator; the backend reports no real progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_extracting_after_ms")]
    pub extracting_after_ms: u64,
    #[serde(default = "default_summarizing_after_ms")]
    pub summarizing_after_ms: u64,
    #[serde(default = "default_indexing_after_ms")]
    pub indexing_after_ms: u64,
    #[serde(default = "default_finalizing_after_ms")]
    pub finalizing_after_ms: u64,
    /// How often the indicator is re-evaluated while a request is in flight
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

const fn default_extracting_after_ms() -> u64 {
    1_500
}

const fn default_summarizing_after_ms() -> u64 {
    4_000
}

const fn default_indexing_after_ms() -> u64 {
    8_000
}

const fn default_finalizing_after_ms() -> u64 {
    12_000
}

const fn default_tick_ms() -> u64 {
    250
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            extracting_after_ms: default_extracting_after_ms(),
            summarizing_after_ms: default_summarizing_after_ms(),
            indexing_after_ms: default_indexing_after_ms(),
            finalizing_after_ms: default_finalizing_after_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend origin, fixed for the lifetime of the process
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Upload timeout in seconds (processing happens inside the request)
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,

    /// Delay before the authoritative list refresh that follows an upload
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,

    /// Persisted client cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Simulated upload progress timing
    #[serde(default)]
    pub progress: ProgressConfig,
}

fn default_api_base() -> String {
    "http://localhost:8000".to_string()
}

const fn default_upload_timeout_secs() -> u64 {
    300
}

const fn default_refresh_delay_ms() -> u64 {
    2_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            upload_timeout_secs: default_upload_timeout_secs(),
            refresh_delay_ms: default_refresh_delay_ms(),
            cache: CacheConfig::default(),
            progress: ProgressConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/research-copilot/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("research-copilot").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(Error::ConfigInvalid {
                field: "api_base".to_string(),
                reason: format!("expected an http(s) origin, got '{}'", self.api_base),
            });
        }
        if self.progress.tick_ms == 0 {
            return Err(Error::ConfigInvalid {
                field: "progress.tick_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub const fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }

    pub const fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

/// A language option for language pickers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageOption {
    /// ISO language code sent to the backend
    pub code: &'static str,
    /// Display name
    pub name: &'static str,
}

impl LanguageOption {
    pub fn lang(&self) -> Lang {
        Lang::new(self.code)
    }
}

/// Languages offered for inline summary translation in the analysis view.
pub fn summary_languages() -> Vec<LanguageOption> {
    vec![
        LanguageOption { code: "es", name: "Spanish" },
        LanguageOption { code: "fr", name: "French" },
        LanguageOption { code: "de", name: "German" },
        LanguageOption { code: "ru", name: "Russian" },
        LanguageOption { code: "ja", name: "Japanese" },
    ]
}

/// Languages offered for downloadable document translations.
///
/// Maintained separately from [`summary_languages`]; the backend accepts
/// different sets for the two renditions.
pub fn download_languages() -> Vec<LanguageOption> {
    vec![
        LanguageOption { code: "es", name: "Spanish" },
        LanguageOption { code: "fr", name: "French" },
        LanguageOption { code: "de", name: "German" },
        LanguageOption { code: "it", name: "Italian" },
        LanguageOption { code: "pt", name: "Portuguese" },
        LanguageOption { code: "zh", name: "Chinese" },
    ]
}

/// Default download target, first entry of [`download_languages`]
pub const DEFAULT_DOWNLOAD_LANG: &str = "es";

/// Look up `code` in a language set.
pub fn find_language(options: &[LanguageOption], code: &str) -> Option<LanguageOption> {
    options.iter().find(|opt| opt.code == code).cloned()
}

/// Look up `code` in a language set, failing with
/// [`Error::UnsupportedLanguage`] when it is not offered.
pub fn require_language(options: &[LanguageOption], code: &str) -> Result<LanguageOption, Error> {
    find_language(options, code).ok_or_else(|| Error::UnsupportedLanguage(code.to_string()))
}
