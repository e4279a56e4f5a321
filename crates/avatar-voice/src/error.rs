use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    /// Credentials, voice selection, or another required setting is missing.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The remote synthesis provider rejected or failed the request.
    #[error("{provider} request failed ({}): {body}", status_label(.status))]
    RemoteService {
        provider: &'static str,
        status: Option<u16>,
        body: String,
    },

    /// An external executable could not be spawned or exited unsuccessfully.
    #[error("{tool} failed ({}): {stderr}", exit_label(.code))]
    ExternalTool {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Tool output could not be decoded into the expected shape.
    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A pipeline stage exceeded its deadline.
    #[error("{stage} stage timed out after {:?}", .limit)]
    Timeout {
        stage: &'static str,
        limit: std::time::Duration,
    },
}

impl VoiceError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no response".to_string(),
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit {}", code),
        None => "did not run to completion".to_string(),
    }
}
