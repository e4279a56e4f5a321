//! Speech and lip-sync adapters for the avatar voice pipeline.
//!
//! Three narrow async traits separate the pipeline from the tools that do the
//! work:
//!
//! - [`SpeechSynthesizer`]: text to speech audio. The shipped implementation
//!   calls the ElevenLabs text-to-speech API and stores the MP3.
//! - [`AudioTranscoder`]: speech audio to the WAV format the extractor needs.
//!   The shipped implementation runs `ffmpeg`.
//! - [`VisemeExtractor`]: WAV to a time-aligned mouth-shape track. The shipped
//!   implementation runs Rhubarb Lip Sync.
//!
//! None of the adapters retry. Every failure is reported as a [`VoiceError`]
//! and the caller decides whether it is fatal.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod lipsync;
pub mod process;
pub mod synth;
pub mod transcode;

pub use artifacts::{validate_key, ArtifactLayout};
pub use config::{MediaConfig, SynthesisConfig, ToolsConfig};
pub use error::VoiceError;
pub use lipsync::{parse_rhubarb_json, RhubarbExtractor, VisemeExtractor, COVERAGE_TOLERANCE};
pub use synth::{ElevenLabsSynthesizer, SpeechSynthesizer, SynthesizedAudio};
pub use transcode::{AudioTranscoder, FfmpegTranscoder};
