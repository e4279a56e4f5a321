//! Configuration loading from file and environment variables.

use avatar_jobs::{ReplyBudget, StageTimeouts};
use avatar_voice::{MediaConfig, SynthesisConfig, ToolsConfig};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Remote speech synthesis settings.
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// External tool locations and output format.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Artifact directories and URL prefix.
    #[serde(default)]
    pub media: MediaConfig,

    /// Stage deadlines, polling, and text budgets.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Voice job pipeline settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_synthesis_timeout_seconds")]
    pub synthesis_timeout_seconds: u64,

    #[serde(default = "default_transcode_timeout_seconds")]
    pub transcode_timeout_seconds: u64,

    #[serde(default = "default_extract_timeout_seconds")]
    pub extract_timeout_seconds: u64,

    /// Interval between status polls while waiting for a job.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Reply and spoken-text character bounds.
    #[serde(flatten)]
    pub reply: ReplyBudget,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "avatar_jobs=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_synthesis_timeout_seconds() -> u64 {
    60
}

fn default_transcode_timeout_seconds() -> u64 {
    60
}

fn default_extract_timeout_seconds() -> u64 {
    120
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            synthesis_timeout_seconds: default_synthesis_timeout_seconds(),
            transcode_timeout_seconds: default_transcode_timeout_seconds(),
            extract_timeout_seconds: default_extract_timeout_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
            reply: ReplyBudget::default(),
        }
    }
}

impl PipelineConfig {
    pub fn stage_timeouts(&self) -> StageTimeouts {
        StageTimeouts {
            synthesis: Duration::from_secs(self.synthesis_timeout_seconds),
            transcode: Duration::from_secs(self.transcode_timeout_seconds),
            extract: Duration::from_secs(self.extract_timeout_seconds),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `ELEVENLABS_API_KEY` overrides `synthesis.api_key`
/// - `ELEVENLABS_VOICE_ID` overrides `synthesis.voice_id`
/// - `ELEVENLABS_MODEL_ID` overrides `synthesis.model_id`
/// - `AVATAR_FFMPEG_PATH` overrides `tools.ffmpeg_path`
/// - `AVATAR_RHUBARB_PATH` overrides `tools.rhubarb_path`
/// - `AVATAR_MEDIA_ROOT` overrides `media.root`
/// - `AVATAR_LOG_LEVEL` overrides `logging.level`
/// - `AVATAR_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(api_key) = non_empty("ELEVENLABS_API_KEY") {
        config.synthesis.api_key = api_key;
    }
    if let Some(voice_id) = non_empty("ELEVENLABS_VOICE_ID") {
        config.synthesis.voice_id = voice_id;
    }
    if let Some(model_id) = non_empty("ELEVENLABS_MODEL_ID") {
        config.synthesis.model_id = model_id;
    }
    if let Some(path) = non_empty("AVATAR_FFMPEG_PATH") {
        config.tools.ffmpeg_path = PathBuf::from(path);
    }
    if let Some(path) = non_empty("AVATAR_RHUBARB_PATH") {
        config.tools.rhubarb_path = PathBuf::from(path);
    }
    if let Some(root) = non_empty("AVATAR_MEDIA_ROOT") {
        config.media.root = PathBuf::from(root);
    }
    if let Some(level) = non_empty("AVATAR_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = non_empty("AVATAR_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
