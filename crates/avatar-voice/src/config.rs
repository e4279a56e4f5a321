use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::VoiceError;

pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";

fn default_base_url() -> String {
    DEFAULT_ELEVENLABS_BASE_URL.to_string()
}

fn default_model_id() -> String {
    DEFAULT_ELEVENLABS_MODEL.to_string()
}

fn default_stability() -> f32 {
    0.8
}

fn default_similarity_boost() -> f32 {
    0.6
}

fn default_style() -> f32 {
    0.2
}

fn default_use_speaker_boost() -> bool {
    true
}

fn default_request_timeout_seconds() -> u64 {
    30
}

/// Remote speech synthesis settings (ElevenLabs).
#[derive(Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Provider credential. Required at synthesis time.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Voice selector. Required at synthesis time.
    #[serde(default)]
    pub voice_id: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_stability")]
    pub stability: f32,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
    #[serde(default = "default_style")]
    pub style: f32,
    #[serde(default = "default_use_speaker_boost")]
    pub use_speaker_boost: bool,
    /// HTTP request timeout in seconds. Default: 30.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice_id: String::new(),
            model_id: default_model_id(),
            base_url: default_base_url(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: default_style(),
            use_speaker_boost: default_use_speaker_boost(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl fmt::Debug for SynthesisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisConfig")
            .field("api_key", &"[REDACTED]")
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .field("base_url", &self.base_url)
            .field("stability", &self.stability)
            .field("similarity_boost", &self.similarity_boost)
            .field("style", &self.style)
            .field("use_speaker_boost", &self.use_speaker_boost)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl SynthesisConfig {
    pub fn new(api_key: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            ..Self::default()
        }
    }

    /// Returns `(api_key, voice_id)`, or a configuration error naming the
    /// first missing value.
    pub fn credentials(&self) -> Result<(&str, &str), VoiceError> {
        let voice_id = self.voice_id.trim();
        if voice_id.is_empty() {
            return Err(VoiceError::Configuration(
                "ElevenLabs voice id is missing (set synthesis.voice_id or ELEVENLABS_VOICE_ID)"
                    .to_string(),
            ));
        }
        let api_key = self.api_key.trim();
        if api_key.is_empty() {
            return Err(VoiceError::Configuration(
                "ElevenLabs API key is missing (set synthesis.api_key or ELEVENLABS_API_KEY)"
                    .to_string(),
            ));
        }
        Ok((api_key, voice_id))
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_rhubarb_path() -> PathBuf {
    PathBuf::from("rhubarb")
}

fn default_sample_rate() -> u32 {
    48_000
}

fn default_channels() -> u16 {
    1
}

fn default_recognizer() -> String {
    "phonetic".to_string()
}

/// External executable settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the ffmpeg binary (or a name resolved through `PATH`).
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    /// Path to the Rhubarb Lip Sync binary.
    #[serde(default = "default_rhubarb_path")]
    pub rhubarb_path: PathBuf,
    /// Sample rate of the intermediate WAV handed to the extractor.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Channel count of the intermediate WAV.
    #[serde(default = "default_channels")]
    pub channels: u16,
    /// Rhubarb recognizer (`phonetic` or `pocketSphinx`).
    #[serde(default = "default_recognizer")]
    pub recognizer: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            rhubarb_path: default_rhubarb_path(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            recognizer: default_recognizer(),
        }
    }
}

fn default_media_root() -> PathBuf {
    PathBuf::from("public/media")
}

fn default_tts_dir() -> String {
    "tts".to_string()
}

fn default_lipsync_dir() -> String {
    "lipsync".to_string()
}

fn default_url_prefix() -> String {
    "/media".to_string()
}

/// Where artifacts are written and how they are exposed as URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Public static-serving root on disk.
    #[serde(default = "default_media_root")]
    pub root: PathBuf,
    /// Subdirectory for synthesized audio and intermediate WAVs.
    #[serde(default = "default_tts_dir")]
    pub tts_dir: String,
    /// Subdirectory for lip-sync JSON artifacts.
    #[serde(default = "default_lipsync_dir")]
    pub lipsync_dir: String,
    /// URL path under which `root` is served.
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            tts_dir: default_tts_dir(),
            lipsync_dir: default_lipsync_dir(),
            url_prefix: default_url_prefix(),
        }
    }
}
