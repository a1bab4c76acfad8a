//! Per-run script execution for the logic branch.
//!
//! Every run spawns a fresh interpreter (`python3 -I -` by default), feeds
//! the generated script on stdin, and enforces a wall-clock limit. Nothing
//! is shared between runs and nothing survives them. The interpreter's
//! isolated mode keeps the user's site-packages and environment out of the
//! process, but this is still arbitrary model-generated code; callers must
//! not point it at an interpreter with broader reach than they accept.

use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use faithloop_config::ScriptConfig;
use faithloop_core::ToolError;

/// Runs generated logic scripts, one process per run.
pub struct ScriptRunner {
    config: ScriptConfig,
}

impl ScriptRunner {
    pub fn new(config: ScriptConfig) -> Self {
        Self { config }
    }

    /// Execute a script and return its trimmed stdout.
    ///
    /// A script that prints nothing and exits cleanly yields an empty
    /// string. A non-zero exit or a timeout is an error.
    pub async fn run(&self, code: &str) -> Result<String, ToolError> {
        debug!(bytes = code.len(), "Running logic script");

        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "script".into(),
                reason: format!("{}: {}", self.config.command, e),
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| ToolError::ExecutionFailed {
            tool_name: "script".into(),
            reason: "stdin unavailable".into(),
        })?;

        stdin
            .write_all(code.as_bytes())
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "script".into(),
                reason: e.to_string(),
            })?;

        // Close stdin so the interpreter sees end-of-script.
        drop(stdin);

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| ToolError::ExecutionFailed {
                tool_name: "script".into(),
                reason: e.to_string(),
            })?,
            Err(_) => {
                // Dropping the wait future kills the child via kill_on_drop.
                warn!(timeout_secs = self.config.timeout_secs, "Logic script timed out");
                return Err(ToolError::Timeout {
                    tool_name: "script".into(),
                    timeout_secs: self.config.timeout_secs,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            Ok(stdout.trim().to_string())
        } else {
            let reason = if stderr.trim().is_empty() {
                format!("exit code {}", output.status.code().unwrap_or(-1))
            } else {
                stderr.trim().to_string()
            };
            warn!(reason = %reason, "Logic script failed");
            Err(ToolError::ExecutionFailed {
                tool_name: "script".into(),
                reason,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `sh` reading a script from stdin mirrors how the configured
    /// interpreter is driven, without assuming python is installed.
    fn sh_runner(timeout_secs: u64) -> ScriptRunner {
        ScriptRunner::new(ScriptConfig {
            command: "sh".into(),
            args: vec![],
            timeout_secs,
            fence_tag: "sh".into(),
        })
    }

    #[tokio::test]
    async fn captures_printed_answer() {
        let runner = sh_runner(5);
        let out = runner.run("echo 4").await.unwrap();
        assert_eq!(out, "4");
    }

    #[tokio::test]
    async fn silent_script_yields_empty_string() {
        let runner = sh_runner(5);
        let out = runner.run("true").await.unwrap();
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn failing_script_reports_stderr() {
        let runner = sh_runner(5);
        let err = runner.run("echo broken >&2; exit 1").await.unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn failure_without_stderr_reports_exit_code() {
        let runner = sh_runner(5);
        let err = runner.run("exit 3").await.unwrap_err();
        assert!(err.to_string().contains("exit code 3"));
    }

    #[tokio::test]
    async fn hung_script_times_out() {
        let runner = sh_runner(1);
        let err = runner.run("sleep 10").await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    #[tokio::test]
    async fn runs_are_independent() {
        let runner = sh_runner(5);
        runner.run("ANSWER=42").await.unwrap();
        let out = runner.run("echo ${ANSWER:-unset}").await.unwrap();
        assert_eq!(out, "unset");
    }

    #[tokio::test]
    async fn missing_interpreter_is_an_error() {
        let runner = ScriptRunner::new(ScriptConfig {
            command: "faithloop-no-such-binary".into(),
            args: vec![],
            timeout_secs: 5,
            fence_tag: "sh".into(),
        });
        let err = runner.run("echo hi").await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}
