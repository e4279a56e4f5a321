//! Command-line driver for the avatar voice pipeline.
//!
//! Wires the configured adapters into a [`VoicePipeline`] and either runs a
//! full background job (create, spawn, poll until terminal) or renders text
//! straight to a fixed artifact key, such as a kiosk greeting.

pub mod config;

use avatar_jobs::{JobStore, VoiceJobs, VoicePipeline};
use avatar_types::{JobStatusView, Lipsync};
use avatar_voice::{
    ArtifactLayout, ElevenLabsSynthesizer, FfmpegTranscoder, RhubarbExtractor, VoiceError,
};
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use config::{Config, LoggingConfig};
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Synthesizes text and extracts its lip-sync track.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "avatar-voice")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<String>,

    /// Session id recorded on the job
    #[arg(short = 's', long = "session", value_name = "ID")]
    pub session: Option<String>,

    /// Render directly to this artifact key instead of starting a job
    #[arg(short = 'k', long = "key", value_name = "KEY")]
    pub key: Option<String>,

    /// Text to speak
    #[arg(required = true, value_name = "TEXT", value_parser = NonEmptyStringValueParser::new())]
    pub text: Vec<String>,
}

impl Cli {
    /// The positional words joined into one utterance.
    pub fn joined_text(&self) -> String {
        self.text.join(" ").trim().to_string()
    }
}

/// Picks the configuration path: CLI flag, then `AVATAR_CONFIG_PATH`, then
/// `config.toml`. Returns the path and where it came from.
pub fn resolve_config_path(cli: Option<&str>) -> (String, &'static str) {
    if let Some(path) = cli.filter(|p| !p.trim().is_empty()) {
        return (path.to_string(), "cli-arg");
    }

    if let Ok(path) = std::env::var("AVATAR_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (path, "env-var");
        }
    }

    ("config.toml".to_string(), "default")
}

/// Installs the global tracing subscriber. Later calls are no-ops.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Builds the production pipeline (ElevenLabs, ffmpeg, Rhubarb) from config.
pub fn build_pipeline(config: &Config) -> Result<VoicePipeline, VoiceError> {
    let layout = ArtifactLayout::new(&config.media);
    let synthesizer = ElevenLabsSynthesizer::new(config.synthesis.clone(), layout.clone())?;
    let transcoder = FfmpegTranscoder::from_config(&config.tools);
    let extractor = RhubarbExtractor::from_config(&config.tools, layout.clone());

    Ok(VoicePipeline::new(
        JobStore::new(),
        Arc::new(synthesizer),
        Arc::new(transcoder),
        Arc::new(extractor),
        layout,
    )
    .with_timeouts(config.pipeline.stage_timeouts()))
}

/// Result of rendering straight to an artifact key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    pub key: String,
    pub audio_url: String,
    pub lipsync_url: String,
    pub lipsync: Lipsync,
}

/// Renders `text` under a fixed artifact key, bypassing the job store.
pub async fn render_to_key(
    pipeline: &VoicePipeline,
    key: &str,
    text: &str,
) -> Result<RenderOutput, VoiceError> {
    tracing::info!(key, "rendering voice artifact");
    let rendered = pipeline.render(key, text).await?;
    Ok(RenderOutput {
        key: key.to_string(),
        audio_url: rendered.audio_url,
        lipsync_url: pipeline.layout().lipsync_url(key),
        lipsync: rendered.lipsync,
    })
}

/// Starts a background job for `text` and polls it to a terminal state.
pub async fn run_job(
    jobs: &VoiceJobs,
    session_id: &str,
    text: &str,
    config: &Config,
) -> Option<JobStatusView> {
    let spoken = config.pipeline.reply.spoken_text(text);
    let job = jobs.start(session_id, spoken);
    tracing::info!(job_id = %job.id, session_id, "voice job queued");
    jobs.wait(&job.id, config.pipeline.poll_interval()).await
}
