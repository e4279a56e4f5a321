//! Shared types for the avatar voice pipeline.
//!
//! This crate holds the data model that every other crate in the workspace
//! speaks: voice jobs and their state machine, the public status view handed
//! to pollers, and the mouth-shape cue sequences produced by lip-sync
//! extraction.
//!
//! Nothing here performs I/O. The job state machine is enforced by
//! [`VoiceJob::apply`], so any store built on these types inherits the
//! terminal-state and result-exclusivity rules for free.

pub mod job;
pub mod lipsync;

pub use job::{JobId, JobStatus, JobStatusView, JobTransitionError, JobUpdate, VoiceJob};
pub use lipsync::{Lipsync, LipsyncError, MouthCue, MouthShape, ParseMouthShapeError};
