//! Voice job model and state machine.
//!
//! A job moves strictly `queued -> working -> (done | error)`. The two final
//! states are terminal. Results are exclusive: a `done` job carries an audio
//! URL and a lip-sync track, an `error` job carries only a message, and a job
//! that is still in flight carries neither.

use crate::lipsync::Lipsync;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message recorded when a job fails without a usable cause.
pub const DEFAULT_FAILURE_MESSAGE: &str = "voice job failed";

/// Opaque job identifier.
///
/// Also used as the filename stem of every artifact the job produces, so it is
/// restricted to lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle state of a voice job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Working,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Working => "working",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// Returns `true` for `done` and `error`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Returns `true` if a job may move from `self` to `next`.
    ///
    /// Staying in the same non-terminal state is allowed.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Queued)
                | (Self::Queued, Self::Working)
                | (Self::Working, Self::Working)
                | (Self::Working, Self::Done)
                | (Self::Working, Self::Error)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a [`JobUpdate`] cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobTransitionError {
    #[error("job is already {0} and cannot change")]
    Terminal(JobStatus),

    #[error("invalid transition from {from} to {to}")]
    Invalid { from: JobStatus, to: JobStatus },

    #[error("a done job requires both an audio URL and a lip-sync track")]
    MissingResult,

    #[error("results may only be attached together with a terminal status")]
    PrematureResult,
}

/// A partial update merged into a job by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub audio_url: Option<String>,
    pub lipsync: Option<Lipsync>,
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn working() -> Self {
        Self {
            status: Some(JobStatus::Working),
            ..Self::default()
        }
    }

    pub fn done(audio_url: impl Into<String>, lipsync: Lipsync) -> Self {
        Self {
            status: Some(JobStatus::Done),
            audio_url: Some(audio_url.into()),
            lipsync: Some(lipsync),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Error),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    fn carries_result(&self) -> bool {
        self.audio_url.is_some() || self.lipsync.is_some() || self.error.is_some()
    }
}

/// One request to synthesize speech and lip-sync data for a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceJob {
    pub id: JobId,
    pub status: JobStatus,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lipsync: Option<Lipsync>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VoiceJob {
    /// Creates a queued job with a freshly generated id.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::generate(),
            status: JobStatus::Queued,
            session_id: session_id.into(),
            created_at: now,
            updated_at: now,
            audio_url: None,
            lipsync: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merges `update` into this job, stamping `updated_at` with `now`.
    ///
    /// The job is left untouched when the update is rejected.
    pub fn apply(&mut self, update: JobUpdate, now: DateTime<Utc>) -> Result<(), JobTransitionError> {
        if self.status.is_terminal() {
            return Err(JobTransitionError::Terminal(self.status));
        }

        let next = update.status.unwrap_or(self.status);
        if !self.status.can_transition_to(next) {
            return Err(JobTransitionError::Invalid {
                from: self.status,
                to: next,
            });
        }

        match next {
            JobStatus::Queued | JobStatus::Working => {
                if update.carries_result() {
                    return Err(JobTransitionError::PrematureResult);
                }
            }
            JobStatus::Done => {
                let has_audio = update.audio_url.as_deref().is_some_and(|url| !url.is_empty());
                let has_lipsync = update.lipsync.as_ref().is_some_and(|l| !l.is_empty());
                if !has_audio || !has_lipsync {
                    return Err(JobTransitionError::MissingResult);
                }
                self.audio_url = update.audio_url;
                self.lipsync = update.lipsync;
                self.error = None;
            }
            JobStatus::Error => {
                let message = update
                    .error
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                self.audio_url = None;
                self.lipsync = None;
                self.error = Some(message);
            }
        }

        self.status = next;
        self.updated_at = now.max(self.created_at);
        Ok(())
    }
}

/// The poll-facing projection of a job: `{id, status, audioUrl?, lipsync?, error?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lipsync: Option<Lipsync>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&VoiceJob> for JobStatusView {
    fn from(job: &VoiceJob) -> Self {
        Self {
            id: job.id.clone(),
            status: job.status,
            audio_url: job.audio_url.clone(),
            lipsync: job.lipsync.clone(),
            error: job.error.clone(),
        }
    }
}

impl From<VoiceJob> for JobStatusView {
    fn from(job: VoiceJob) -> Self {
        Self {
            id: job.id,
            status: job.status,
            audio_url: job.audio_url,
            lipsync: job.lipsync,
            error: job.error,
        }
    }
}
