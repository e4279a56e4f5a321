//! In-memory voice job registry.
//!
//! The store is the only state shared between job tasks and pollers. Entries
//! live for the lifetime of the process; nothing is persisted and nothing is
//! evicted.

use avatar_types::{JobId, JobUpdate, VoiceJob};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared, clonable handle to the job registry.
///
/// Uses `std::sync::RwLock`: every critical section is a single map operation
/// that never spans an `.await`, so pollers and job tasks only ever wait for
/// one short merge.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<JobId, VoiceJob>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new queued job for `session_id` and returns a copy of it.
    pub fn create(&self, session_id: &str) -> VoiceJob {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let mut job = VoiceJob::new(session_id);
        while jobs.contains_key(&job.id) {
            job = VoiceJob::new(session_id);
        }
        jobs.insert(job.id.clone(), job.clone());
        tracing::debug!(job_id = %job.id, session_id, "voice job created");
        job
    }

    /// Returns a copy of the job, or `None` if the id is unknown.
    pub fn get(&self, id: &JobId) -> Option<VoiceJob> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        jobs.get(id).cloned()
    }

    /// Merges `update` into the job and returns the resulting copy.
    ///
    /// Returns `None` for an unknown id. An update the job's state machine
    /// refuses (for example, anything after a terminal state) is dropped with a
    /// warning and the unchanged job is returned.
    pub fn update(&self, id: &JobId, update: JobUpdate) -> Option<VoiceJob> {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let job = jobs.get_mut(id)?;
        if let Err(e) = job.apply(update, Utc::now()) {
            tracing::warn!(job_id = %id, status = %job.status, "rejected job update: {}", e);
        }
        Some(job.clone())
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
