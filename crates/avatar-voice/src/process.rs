//! Subprocess invocation shared by the external-tool adapters.

use crate::error::VoiceError;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Upper bound on captured stderr carried into an error message.
const MAX_DIAGNOSTIC_BYTES: usize = 8 * 1024;

/// Runs `program` with `args` and waits for it to exit.
///
/// stdin is closed, stdout is discarded, and stderr is captured for failure
/// reporting. The child is killed if the returned future is dropped, so a
/// caller-side timeout also terminates the process.
pub async fn run_tool<I, S>(tool: &str, program: &Path, args: I) -> Result<(), VoiceError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(tool, program = %program.display(), "spawning external tool");

    let child = command.spawn().map_err(|e| VoiceError::ExternalTool {
        tool: tool.to_string(),
        code: None,
        stderr: format!("failed to spawn {}: {}", program.display(), e),
    })?;

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| VoiceError::ExternalTool {
            tool: tool.to_string(),
            code: None,
            stderr: format!("failed to wait for {}: {}", program.display(), e),
        })?;

    if !output.status.success() {
        return Err(VoiceError::ExternalTool {
            tool: tool.to_string(),
            code: output.status.code(),
            stderr: diagnostic_tail(&output.stderr),
        });
    }

    Ok(())
}

/// Keeps the last `MAX_DIAGNOSTIC_BYTES` of stderr, where tools print the
/// actual failure reason.
fn diagnostic_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(MAX_DIAGNOSTIC_BYTES);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_tail_keeps_end_of_long_output() {
        let mut stderr = vec![b'a'; MAX_DIAGNOSTIC_BYTES];
        stderr.extend_from_slice(b"\nbad codec\n");
        let tail = diagnostic_tail(&stderr);
        assert!(tail.ends_with("bad codec"));
        assert!(tail.len() <= MAX_DIAGNOSTIC_BYTES);
    }

    #[tokio::test]
    async fn missing_binary_is_an_external_tool_error() {
        let result = run_tool(
            "ffmpeg",
            Path::new("/nonexistent/definitely-not-ffmpeg"),
            ["-version"],
        )
        .await;
        match result {
            Err(VoiceError::ExternalTool { tool, code, stderr }) => {
                assert_eq!(tool, "ffmpeg");
                assert_eq!(code, None);
                assert!(stderr.contains("failed to spawn"));
            }
            other => panic!("expected ExternalTool error, got {:?}", other),
        }
    }
}
