use crate::artifacts::ArtifactLayout;
use crate::config::SynthesisConfig;
use crate::error::VoiceError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

const PROVIDER: &str = "ElevenLabs";

/// Upper bound on a provider error body carried into an error message.
const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

/// Synthesized speech persisted under an artifact key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    /// Absolute or root-relative location of the audio file on disk.
    pub path: PathBuf,
    /// Relative URL the file is served under.
    pub url: String,
}

/// Turns text into a speech audio file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, key: &str) -> Result<SynthesizedAudio, VoiceError>;
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// ElevenLabs text-to-speech client writing MP3 artifacts.
#[derive(Debug, Clone)]
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    config: SynthesisConfig,
    layout: ArtifactLayout,
}

impl ElevenLabsSynthesizer {
    pub fn new(config: SynthesisConfig, layout: ArtifactLayout) -> Result<Self, VoiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| VoiceError::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            config,
            layout,
        })
    }

    fn endpoint(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            voice_id
        )
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, key: &str) -> Result<SynthesizedAudio, VoiceError> {
        let (api_key, voice_id) = self.config.credentials()?;

        let path = self.layout.audio_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| VoiceError::io(parent, e))?;
        }

        let body = SpeechRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
                style: self.config.style,
                use_speaker_boost: self.config.use_speaker_boost,
            },
        };

        let response = self
            .client
            .post(self.endpoint(voice_id))
            .header("xi-api-key", api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::RemoteService {
                provider: PROVIDER,
                status: e.status().map(|s| s.as_u16()),
                body: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY_BYTES {
                let mut cut = MAX_ERROR_BODY_BYTES;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(VoiceError::RemoteService {
                provider: PROVIDER,
                status: Some(status.as_u16()),
                body,
            });
        }

        let audio = response.bytes().await.map_err(|e| VoiceError::RemoteService {
            provider: PROVIDER,
            status: Some(status.as_u16()),
            body: format!("failed to read audio body: {}", e),
        })?;
        if audio.is_empty() {
            return Err(VoiceError::RemoteService {
                provider: PROVIDER,
                status: Some(status.as_u16()),
                body: "empty audio payload".to_string(),
            });
        }

        tokio::fs::write(&path, &audio)
            .await
            .map_err(|e| VoiceError::io(&path, e))?;

        tracing::debug!(key, bytes = audio.len(), path = %path.display(), "synthesized speech");

        Ok(SynthesizedAudio {
            path,
            url: self.layout.audio_url(key),
        })
    }
}
