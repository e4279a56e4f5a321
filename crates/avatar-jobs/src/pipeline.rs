//! Drives a voice job through synthesis, transcoding, and viseme extraction.

use crate::store::JobStore;
use avatar_types::{JobId, JobStatus, JobUpdate, Lipsync};
use avatar_voice::{
    validate_key, ArtifactLayout, AudioTranscoder, SpeechSynthesizer, VisemeExtractor, VoiceError,
};
use futures_util::FutureExt;
use std::future::Future;
use std::io::ErrorKind;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Per-stage deadlines. Expiry is treated exactly like a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub synthesis: Duration,
    pub transcode: Duration,
    pub extract: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            synthesis: Duration::from_secs(60),
            transcode: Duration::from_secs(60),
            extract: Duration::from_secs(120),
        }
    }
}

/// Output of a successful render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVoice {
    pub audio_url: String,
    pub lipsync: Lipsync,
}

/// The voice job orchestrator.
///
/// Cheap to clone; every clone shares the same store and adapters.
#[derive(Clone)]
pub struct VoicePipeline {
    store: JobStore,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    transcoder: Arc<dyn AudioTranscoder>,
    extractor: Arc<dyn VisemeExtractor>,
    layout: ArtifactLayout,
    timeouts: StageTimeouts,
}

impl VoicePipeline {
    pub fn new(
        store: JobStore,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        transcoder: Arc<dyn AudioTranscoder>,
        extractor: Arc<dyn VisemeExtractor>,
        layout: ArtifactLayout,
    ) -> Self {
        Self {
            store,
            synthesizer,
            transcoder,
            extractor,
            layout,
            timeouts: StageTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Runs the job on its own task and returns immediately.
    ///
    /// The handle may be dropped. Every outcome, including a panic inside the
    /// task, ends up in the job store and nowhere else.
    pub fn spawn(&self, job_id: JobId, text: String) -> JoinHandle<()> {
        let pipeline = self.clone();
        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(pipeline.run(job_id.clone(), text))
                .catch_unwind()
                .await;
            if outcome.is_err() {
                tracing::error!(job_id = %job_id, "voice job task panicked");
                // The unwind skipped the cleanup in `render`.
                let key = job_id.as_str();
                remove_intermediate(key, &pipeline.layout.intermediate_path(key)).await;
                pipeline
                    .store
                    .update(&job_id, JobUpdate::failed("voice job panicked"));
            }
        })
    }

    /// Runs the job to completion on the current task.
    ///
    /// Jobs that are unknown or no longer queued are left alone.
    pub async fn run(&self, job_id: JobId, text: String) {
        match self.store.update(&job_id, JobUpdate::working()) {
            None => {
                tracing::warn!(job_id = %job_id, "voice job not found, nothing to run");
                return;
            }
            Some(job) if job.status != JobStatus::Working => {
                tracing::warn!(job_id = %job_id, status = %job.status, "voice job is not runnable");
                return;
            }
            Some(job) => {
                tracing::info!(
                    job_id = %job_id,
                    session_id = %job.session_id,
                    chars = text.chars().count(),
                    "voice job started"
                );
            }
        }

        let started = Instant::now();
        match self.render(job_id.as_str(), &text).await {
            Ok(rendered) => {
                tracing::info!(
                    job_id = %job_id,
                    cues = rendered.lipsync.cues.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "voice job done"
                );
                self.store.update(
                    &job_id,
                    JobUpdate::done(rendered.audio_url, rendered.lipsync),
                );
            }
            Err(e) => {
                tracing::error!(
                    job_id = %job_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "voice job failed: {}",
                    e
                );
                self.store.update(&job_id, JobUpdate::failed(e.to_string()));
            }
        }
    }

    /// Synthesizes `text` and extracts its lip-sync track under `key`,
    /// without touching the job store.
    ///
    /// The intermediate WAV is removed whether or not the later stages succeed.
    pub async fn render(&self, key: &str, text: &str) -> Result<RenderedVoice, VoiceError> {
        validate_key(key)?;

        let audio = stage(
            "synthesis",
            self.timeouts.synthesis,
            self.synthesizer.synthesize(text, key),
        )
        .await?;

        let wav = self.layout.intermediate_path(key);
        let lipsync = async {
            stage(
                "transcode",
                self.timeouts.transcode,
                self.transcoder.transcode(&audio.path, &wav),
            )
            .await?;
            stage(
                "extract",
                self.timeouts.extract,
                self.extractor.extract(&wav, key),
            )
            .await
        }
        .await;

        remove_intermediate(key, &wav).await;

        Ok(RenderedVoice {
            audio_url: audio.url,
            lipsync: lipsync?,
        })
    }
}

async fn stage<T, F>(name: &'static str, limit: Duration, work: F) -> Result<T, VoiceError>
where
    F: Future<Output = Result<T, VoiceError>>,
{
    let started = Instant::now();
    let result = tokio::time::timeout(limit, work)
        .await
        .map_err(|_| VoiceError::Timeout { stage: name, limit })?;
    tracing::debug!(
        stage = name,
        ok = result.is_ok(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "pipeline stage finished"
    );
    result
}

async fn remove_intermediate(key: &str, path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(key, path = %path.display(), "failed to remove intermediate audio: {}", e);
        }
    }
}
