//! Stub adapters shared by the pipeline integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use avatar_jobs::{JobStore, StageTimeouts, VoiceJobs, VoicePipeline};
use avatar_types::{JobId, JobStatus, Lipsync, MouthCue, MouthShape};
use avatar_voice::{
    ArtifactLayout, AudioTranscoder, SpeechSynthesizer, SynthesizedAudio, VisemeExtractor,
    VoiceError,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn stub_lipsync() -> Lipsync {
    Lipsync::new(vec![
        MouthCue::new(0.0, 0.4, MouthShape::A),
        MouthCue::new(0.4, 0.9, MouthShape::X),
    ])
}

#[derive(Clone, Copy)]
pub enum SynthMode {
    Succeed,
    MissingVoiceId,
}

/// Writes `audio:<key>` to the layout's audio path.
pub struct StubSynthesizer {
    pub layout: ArtifactLayout,
    pub mode: SynthMode,
    pub calls: AtomicUsize,
    /// Job statuses observed in the store at call time.
    pub observed: Mutex<Vec<JobStatus>>,
    pub store: JobStore,
}

#[async_trait]
impl SpeechSynthesizer for StubSynthesizer {
    async fn synthesize(&self, _text: &str, key: &str) -> Result<SynthesizedAudio, VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(job) = self.store.get(&JobId::from(key)) {
            self.observed.lock().unwrap().push(job.status);
        }
        match self.mode {
            SynthMode::MissingVoiceId => Err(VoiceError::Configuration(
                "ElevenLabs voice id is missing".to_string(),
            )),
            SynthMode::Succeed => {
                let path = self.layout.audio_path(key);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(&path, format!("audio:{}", key)).unwrap();
                Ok(SynthesizedAudio {
                    path,
                    url: self.layout.audio_url(key),
                })
            }
        }
    }
}

#[derive(Clone, Copy)]
pub enum TranscodeMode {
    /// Copies the source to the target.
    Copy,
    /// Fails the way ffmpeg does on an unreadable input.
    BadCodec,
    /// Leaves a directory where the WAV should be, so cleanup cannot remove it.
    DirectoryTarget,
}

pub struct StubTranscoder {
    pub mode: TranscodeMode,
    pub calls: AtomicUsize,
}

#[async_trait]
impl AudioTranscoder for StubTranscoder {
    async fn transcode(&self, source: &Path, target: &Path) -> Result<(), VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            TranscodeMode::Copy => {
                std::fs::copy(source, target).map_err(|e| VoiceError::io(target, e))?;
                Ok(())
            }
            TranscodeMode::BadCodec => Err(VoiceError::ExternalTool {
                tool: "ffmpeg".to_string(),
                code: Some(1),
                stderr: "bad codec".to_string(),
            }),
            TranscodeMode::DirectoryTarget => {
                std::fs::create_dir_all(target).map_err(|e| VoiceError::io(target, e))?;
                Ok(())
            }
        }
    }
}

#[derive(Clone, Copy)]
pub enum ExtractMode {
    Succeed,
    Hang,
    Panic,
    Malformed,
}

/// Returns [`stub_lipsync`] and records the WAV content it was handed.
pub struct StubExtractor {
    pub mode: ExtractMode,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<(String, Option<String>)>>,
}

#[async_trait]
impl VisemeExtractor for StubExtractor {
    async fn extract(&self, audio: &Path, key: &str) -> Result<Lipsync, VoiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = std::fs::read_to_string(audio).ok();
        self.seen.lock().unwrap().push((key.to_string(), content));
        match self.mode {
            ExtractMode::Succeed => Ok(stub_lipsync()),
            ExtractMode::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(stub_lipsync())
            }
            ExtractMode::Panic => panic!("extractor exploded"),
            ExtractMode::Malformed => Err(VoiceError::parse(
                "rhubarb output",
                "expected value at line 1 column 1",
            )),
        }
    }
}

pub struct Harness {
    pub jobs: VoiceJobs,
    pub layout: ArtifactLayout,
    pub synthesizer: Arc<StubSynthesizer>,
    pub transcoder: Arc<StubTranscoder>,
    pub extractor: Arc<StubExtractor>,
    _temp: tempfile::TempDir,
}

impl Harness {
    pub fn new(synth: SynthMode, transcode: TranscodeMode, extract: ExtractMode) -> Self {
        Self::with_timeouts(synth, transcode, extract, StageTimeouts::default())
    }

    pub fn with_timeouts(
        synth: SynthMode,
        transcode: TranscodeMode,
        extract: ExtractMode,
        timeouts: StageTimeouts,
    ) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let layout = ArtifactLayout::rooted_at(temp.path().join("media"));
        let store = JobStore::new();

        let synthesizer = Arc::new(StubSynthesizer {
            layout: layout.clone(),
            mode: synth,
            calls: AtomicUsize::new(0),
            observed: Mutex::new(Vec::new()),
            store: store.clone(),
        });
        let transcoder = Arc::new(StubTranscoder {
            mode: transcode,
            calls: AtomicUsize::new(0),
        });
        let extractor = Arc::new(StubExtractor {
            mode: extract,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        });

        let pipeline = VoicePipeline::new(
            store,
            synthesizer.clone(),
            transcoder.clone(),
            extractor.clone(),
            layout.clone(),
        )
        .with_timeouts(timeouts);

        Self {
            jobs: VoiceJobs::new(pipeline),
            layout,
            synthesizer,
            transcoder,
            extractor,
            _temp: temp,
        }
    }
}

pub const POLL: Duration = Duration::from_millis(5);
