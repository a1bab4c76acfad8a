//! Configuration loading and validation for FaithLoop.
//!
//! Loads configuration from `~/.faithloop/config.toml` with environment
//! variable overrides. Every key is optional; a missing file yields the
//! defaults, which match a stock local Ollama install.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.faithloop/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text model used for routing, code generation, and synthesis
    #[serde(default = "default_fast_model")]
    pub fast_model: String,

    /// Image-capable model used for vision reads and critique
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// Base URL of the Ollama server
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Enable the critique/revision phase for image queries
    #[serde(default)]
    pub deep_check: bool,

    /// Rephrase raw logic results into a natural-language sentence
    #[serde(default)]
    pub beautify_logic: bool,

    /// Web search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Numeric engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logic-script runner settings
    #[serde(default)]
    pub script: ScriptConfig,
}

fn default_fast_model() -> String {
    "llama3.2".into()
}
fn default_vision_model() -> String {
    "llava-phi3".into()
}
fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Endpoint receiving the `q` form field
    #[serde(default = "default_search_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    /// How many result blocks to keep
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_search_url() -> String {
    "https://html.duckduckgo.com/html/".into()
}
fn default_search_timeout() -> u64 {
    10
}
fn default_max_results() -> usize {
    3
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            timeout_secs: default_search_timeout(),
            max_results: default_max_results(),
        }
    }
}

/// Numeric engine settings.
///
/// The engine is any interpreter that reads commands from stdin and writes
/// results to stdout. `echo_command` is the line template (with a `{marker}`
/// placeholder) the adapter appends after each script to know where one
/// script's output ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interpreter binary
    #[serde(default = "default_engine_command")]
    pub command: String,

    /// Arguments passed to the interpreter
    #[serde(default = "default_engine_args")]
    pub args: Vec<String>,

    /// Line template that makes the engine print the sync marker
    #[serde(default = "default_echo_command")]
    pub echo_command: String,

    /// Fence tag the code-generation prompt asks for
    #[serde(default = "default_engine_fence")]
    pub fence_tag: String,
}

fn default_engine_command() -> String {
    "octave".into()
}
fn default_engine_args() -> Vec<String> {
    vec!["--no-gui".into(), "--quiet".into()]
}
fn default_echo_command() -> String {
    r#"disp("{marker}")"#.into()
}
fn default_engine_fence() -> String {
    "matlab".into()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            args: default_engine_args(),
            echo_command: default_echo_command(),
            fence_tag: default_engine_fence(),
        }
    }
}

/// Logic-script runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Interpreter binary
    #[serde(default = "default_script_command")]
    pub command: String,

    /// Arguments passed to the interpreter (the script arrives on stdin)
    #[serde(default = "default_script_args")]
    pub args: Vec<String>,

    /// Wall-clock limit per run in seconds
    #[serde(default = "default_script_timeout")]
    pub timeout_secs: u64,

    /// Fence tag the code-generation prompt asks for
    #[serde(default = "default_script_fence")]
    pub fence_tag: String,
}

fn default_script_command() -> String {
    "python3".into()
}
fn default_script_args() -> Vec<String> {
    vec!["-I".into(), "-".into()]
}
fn default_script_timeout() -> u64 {
    10
}
fn default_script_fence() -> String {
    "python".into()
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            command: default_script_command(),
            args: default_script_args(),
            timeout_secs: default_script_timeout(),
            fence_tag: default_script_fence(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.faithloop/config.toml).
    ///
    /// Environment variables take priority over the file:
    /// - `FAITHLOOP_FAST_MODEL`
    /// - `FAITHLOOP_VISION_MODEL`
    /// - `FAITHLOOP_OLLAMA_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(model) = std::env::var("FAITHLOOP_FAST_MODEL") {
            config.fast_model = model;
        }
        if let Ok(model) = std::env::var("FAITHLOOP_VISION_MODEL") {
            config.vision_model = model;
        }
        if let Ok(url) = std::env::var("FAITHLOOP_OLLAMA_URL") {
            config.ollama_url = url;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".faithloop")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_model.is_empty() || self.vision_model.is_empty() {
            return Err(ConfigError::ValidationError(
                "fast_model and vision_model must be non-empty".into(),
            ));
        }

        if self.search.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "search.max_results must be at least 1".into(),
            ));
        }

        if self.search.timeout_secs == 0 || self.script.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least 1 second".into(),
            ));
        }

        if !self.engine.echo_command.contains("{marker}") {
            return Err(ConfigError::ValidationError(
                "engine.echo_command must contain the {marker} placeholder".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fast_model: default_fast_model(),
            vision_model: default_vision_model(),
            ollama_url: default_ollama_url(),
            deep_check: false,
            beautify_logic: false,
            search: SearchConfig::default(),
            engine: EngineConfig::default(),
            script: ScriptConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fast_model, "llama3.2");
        assert_eq!(config.vision_model, "llava-phi3");
        assert_eq!(config.search.max_results, 3);
        assert!(!config.deep_check);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.fast_model, config.fast_model);
        assert_eq!(parsed.engine.command, config.engine.command);
        assert_eq!(parsed.script.timeout_secs, config.script.timeout_secs);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().ollama_url, "http://localhost:11434");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let toml_str = r#"
fast_model = "qwen2.5"

[search]
max_results = 5
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.fast_model, "qwen2.5");
        assert_eq!(config.vision_model, "llava-phi3");
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.search.timeout_secs, 10);
    }

    #[test]
    fn zero_max_results_rejected() {
        let config = AppConfig {
            search: SearchConfig {
                max_results: 0,
                ..SearchConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn echo_command_without_marker_rejected() {
        let config = AppConfig {
            engine: EngineConfig {
                echo_command: "disp('sync')".into(),
                ..EngineConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_reads_real_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "deep_check = true").unwrap();
        writeln!(file, "[engine]").unwrap();
        writeln!(file, "command = \"matlab\"").unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert!(config.deep_check);
        assert_eq!(config.engine.command, "matlab");
        assert_eq!(config.engine.fence_tag, "matlab");
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fast_model = [not, valid").unwrap();

        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("llama3.2"));
        assert!(toml_str.contains("duckduckgo"));
        assert!(toml_str.contains("octave"));
    }
}
