//! On-disk layout of per-job artifacts.
//!
//! Every file a job produces is named after its artifact key, so concurrent
//! jobs never touch the same path:
//!
//! | Artifact | Path | URL |
//! |----------|------|-----|
//! | synthesized audio | `<root>/<tts_dir>/<key>.mp3` | `<prefix>/<tts_dir>/<key>.mp3` |
//! | intermediate WAV | `<root>/<tts_dir>/<key>.wav` | not exposed |
//! | lip-sync track | `<root>/<lipsync_dir>/<key>.json` | `<prefix>/<lipsync_dir>/<key>.json` |

use crate::config::MediaConfig;
use crate::error::VoiceError;
use std::path::{Path, PathBuf};

/// Maximum artifact key length. Job ids are 32 characters.
const MAX_KEY_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
    tts_dir: String,
    lipsync_dir: String,
    url_prefix: String,
}

impl ArtifactLayout {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            tts_dir: config.tts_dir.trim_matches('/').to_string(),
            lipsync_dir: config.lipsync_dir.trim_matches('/').to_string(),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Layout rooted at `root` with default subdirectories and URL prefix.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self::new(&MediaConfig {
            root: root.into(),
            ..MediaConfig::default()
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root.join(&self.tts_dir)
    }

    pub fn lipsync_dir(&self) -> PathBuf {
        self.root.join(&self.lipsync_dir)
    }

    pub fn audio_path(&self, key: &str) -> PathBuf {
        self.audio_dir().join(format!("{}.mp3", key))
    }

    /// Transcoded audio consumed by the extractor and deleted afterwards.
    pub fn intermediate_path(&self, key: &str) -> PathBuf {
        self.audio_dir().join(format!("{}.wav", key))
    }

    pub fn lipsync_path(&self, key: &str) -> PathBuf {
        self.lipsync_dir().join(format!("{}.json", key))
    }

    pub fn audio_url(&self, key: &str) -> String {
        format!("{}/{}/{}.mp3", self.url_prefix, self.tts_dir, key)
    }

    pub fn lipsync_url(&self, key: &str) -> String {
        format!("{}/{}/{}.json", self.url_prefix, self.lipsync_dir, key)
    }

    /// Creates the audio and lip-sync directories if they do not exist.
    pub async fn ensure_dirs(&self) -> Result<(), VoiceError> {
        for dir in [self.audio_dir(), self.lipsync_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| VoiceError::io(&dir, e))?;
        }
        Ok(())
    }
}

/// Rejects keys that could escape the artifact directories or collide with
/// file extensions.
pub fn validate_key(key: &str) -> Result<(), VoiceError> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(VoiceError::Configuration(format!(
            "artifact key must be 1-{} characters, got {}",
            MAX_KEY_LEN,
            key.len()
        )));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(VoiceError::Configuration(format!(
            "artifact key {:?} may only contain ASCII letters, digits, '-' and '_'",
            key
        )));
    }
    Ok(())
}
