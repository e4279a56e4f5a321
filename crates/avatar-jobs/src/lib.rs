//! Asynchronous voice job pipeline.
//!
//! A caller registers a job with [`VoiceJobs::start`] and gets its id back
//! immediately. The job then runs on its own tokio task:
//!
//! ```text
//! queued -> working -> synthesize -> transcode -> extract -> cleanup -> done
//!                          \______________\____________\-----------> error
//! ```
//!
//! Pollers read the [`JobStore`] through [`VoiceJobs::status`]. Failures never
//! propagate to the caller that started the job; they are recorded as the
//! job's `error` and nothing is retried. One job is one attempt.
//!
//! Jobs are held in memory only and are lost on restart.

pub mod pipeline;
pub mod reply;
pub mod service;
pub mod store;

pub use pipeline::{RenderedVoice, StageTimeouts, VoicePipeline};
pub use reply::{truncate_chars, ReplyBudget};
pub use service::VoiceJobs;
pub use store::JobStore;
