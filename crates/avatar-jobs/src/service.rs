use crate::pipeline::VoicePipeline;
use crate::store::JobStore;
use avatar_types::{JobId, JobStatusView, VoiceJob};
use std::time::Duration;

/// Entry point used by the chat-reply flow: start a job, poll its status.
#[derive(Clone)]
pub struct VoiceJobs {
    pipeline: VoicePipeline,
}

impl VoiceJobs {
    pub fn new(pipeline: VoicePipeline) -> Self {
        Self { pipeline }
    }

    pub fn store(&self) -> &JobStore {
        self.pipeline.store()
    }

    pub fn pipeline(&self) -> &VoicePipeline {
        &self.pipeline
    }

    /// Creates a queued job and starts its pipeline in the background.
    ///
    /// Returns as soon as the job is registered. Must be called from within a
    /// tokio runtime.
    pub fn start(&self, session_id: &str, text: impl Into<String>) -> VoiceJob {
        let job = self.store().create(session_id);
        // Detached: the outcome is observed through the store.
        drop(self.pipeline.spawn(job.id.clone(), text.into()));
        job
    }

    /// Status lookup for pollers. `None` means the id is unknown.
    pub fn status(&self, id: &JobId) -> Option<JobStatusView> {
        self.store().get(id).map(JobStatusView::from)
    }

    /// Polls until the job reaches a terminal state.
    ///
    /// Returns `None` if the id is unknown.
    pub async fn wait(&self, id: &JobId, poll_interval: Duration) -> Option<JobStatusView> {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            let view = self.status(id)?;
            if view.status.is_terminal() {
                return Some(view);
            }
        }
    }
}
