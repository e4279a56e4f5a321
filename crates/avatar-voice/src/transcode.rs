use crate::config::ToolsConfig;
use crate::error::VoiceError;
use crate::process::run_tool;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Converts synthesized audio into the format the viseme extractor expects.
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    async fn transcode(&self, source: &Path, target: &Path) -> Result<(), VoiceError>;
}

/// ffmpeg-backed transcoder producing a resampled WAV.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    sample_rate: u32,
    channels: u16,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>, sample_rate: u32, channels: u16) -> Self {
        Self {
            binary: binary.into(),
            sample_rate,
            channels,
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(&config.ffmpeg_path, config.sample_rate, config.channels)
    }

    fn arguments(&self, source: &Path, target: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-i".into(),
            source.into(),
            "-ar".into(),
            self.sample_rate.to_string().into(),
            "-ac".into(),
            self.channels.to_string().into(),
            target.into(),
        ]
    }
}

#[async_trait]
impl AudioTranscoder for FfmpegTranscoder {
    async fn transcode(&self, source: &Path, target: &Path) -> Result<(), VoiceError> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VoiceError::io(parent, e))?;
        }
        run_tool("ffmpeg", &self.binary, self.arguments(source, target)).await
    }
}
