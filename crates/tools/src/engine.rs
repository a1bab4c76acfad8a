//! Persistent numeric engine adapter.
//!
//! Owns one long-lived interpreter process (GNU Octave by default) shared by
//! every numeric request. The process is spawned on first use; a spawn
//! failure is cached, and every later call reports the same unavailable
//! state instead of retrying.
//!
//! Scripts are written to the engine's stdin followed by an echo command
//! that prints a per-call sync marker. Everything the engine writes to
//! stdout before the marker line is that script's output.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use faithloop_config::EngineConfig;
use faithloop_core::EngineError;

/// Returned when a script produces no output on either stream.
const DONE_MARKER: &str = "[Done]";

/// How long to wait for stderr after the stdout marker arrived.
const STDERR_GRACE_MS: u64 = 100;

/// Reported engine state, for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    NotStarted,
    Running,
    Failed(String),
}

impl std::fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineStatus::NotStarted => write!(f, "not started"),
            EngineStatus::Running => write!(f, "running"),
            EngineStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

enum EngineState {
    Idle,
    Ready(EngineProcess),
    Failed(String),
}

struct EngineProcess {
    // Held so the child is killed when the adapter is dropped.
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr_rx: mpsc::UnboundedReceiver<String>,
}

/// Adapter around the single shared engine process.
///
/// The whole execute path runs under one lock, so concurrent callers are
/// serialized and never interleave scripts on the engine's stdin.
pub struct NumericEngine {
    config: EngineConfig,
    state: Mutex<EngineState>,
    call_seq: AtomicU64,
}

impl NumericEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: Mutex::new(EngineState::Idle),
            call_seq: AtomicU64::new(0),
        }
    }

    /// Current engine state without touching the process.
    pub async fn status(&self) -> EngineStatus {
        match &*self.state.lock().await {
            EngineState::Idle => EngineStatus::NotStarted,
            EngineState::Ready(_) => EngineStatus::Running,
            EngineState::Failed(reason) => EngineStatus::Failed(reason.clone()),
        }
    }

    /// Run a script in the engine and capture its output.
    ///
    /// Returns trimmed stdout, else trimmed stderr, else `"[Done]"`.
    pub async fn execute(&self, script: &str) -> Result<String, EngineError> {
        let mut state = self.state.lock().await;

        if matches!(&*state, EngineState::Idle) {
            match spawn_engine(&self.config) {
                Ok(process) => {
                    info!(command = %self.config.command, "Numeric engine started");
                    *state = EngineState::Ready(process);
                }
                Err(reason) => {
                    warn!(reason = %reason, "Numeric engine failed to start");
                    *state = EngineState::Failed(reason);
                }
            }
        }

        let process = match &mut *state {
            EngineState::Ready(process) => process,
            EngineState::Failed(reason) => {
                return Err(EngineError::Unavailable {
                    reason: reason.clone(),
                });
            }
            EngineState::Idle => {
                return Err(EngineError::Unavailable {
                    reason: "engine not started".to_string(),
                });
            }
        };

        let seq = self.call_seq.fetch_add(1, Ordering::Relaxed);
        let marker = format!("__FAITHLOOP_DONE_{seq}__");

        debug!(bytes = script.len(), seq = seq, "Executing engine script");

        match run_script(process, &self.config, script, &marker).await {
            Ok(text) => Ok(text),
            Err(e) => {
                // The stdin/stdout pipes are no longer trustworthy.
                warn!(error = %e, "Engine stream fault, marking engine failed");
                *state = EngineState::Failed(e.to_string());
                Err(e)
            }
        }
    }
}

fn spawn_engine(config: &EngineConfig) -> Result<EngineProcess, String> {
    let mut child = Command::new(&config.command)
        .args(&config.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("{}: {}", config.command, e))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| "engine stdin unavailable".to_string())?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "engine stdout unavailable".to_string())?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| "engine stderr unavailable".to_string())?;

    // Drain stderr continuously so the engine never blocks on a full pipe.
    let (tx, rx) = mpsc::unbounded_channel();
    let mut stderr_lines = BufReader::new(stderr).lines();
    tokio::spawn(async move {
        while let Ok(Some(line)) = stderr_lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    Ok(EngineProcess {
        _child: child,
        stdin,
        stdout: BufReader::new(stdout).lines(),
        stderr_rx: rx,
    })
}

async fn run_script(
    process: &mut EngineProcess,
    config: &EngineConfig,
    script: &str,
    marker: &str,
) -> Result<String, EngineError> {
    // Stderr still queued from an earlier call belongs to that call.
    while process.stderr_rx.try_recv().is_ok() {}

    let echo = config.echo_command.replace("{marker}", marker);
    let payload = format!("{script}\n{echo}\n");

    process
        .stdin
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| EngineError::Stream(e.to_string()))?;
    process
        .stdin
        .flush()
        .await
        .map_err(|e| EngineError::Stream(e.to_string()))?;

    let mut captured = String::new();
    loop {
        match process
            .stdout
            .next_line()
            .await
            .map_err(|e| EngineError::Stream(e.to_string()))?
        {
            Some(line) if line.contains(marker) => break,
            Some(line) => {
                captured.push_str(&line);
                captured.push('\n');
            }
            None => {
                return Err(EngineError::Stream(
                    "engine closed its output stream".to_string(),
                ));
            }
        }
    }

    let stdout_text = captured.trim().to_string();
    if !stdout_text.is_empty() {
        return Ok(stdout_text);
    }

    // Stderr can lag the stdout marker; wait briefly before giving up on it.
    let mut stderr_lines = Vec::new();
    if let Ok(Some(first)) = tokio::time::timeout(
        Duration::from_millis(STDERR_GRACE_MS),
        process.stderr_rx.recv(),
    )
    .await
    {
        stderr_lines.push(first);
        while let Ok(line) = process.stderr_rx.try_recv() {
            stderr_lines.push(line);
        }
    }

    let stderr_text = stderr_lines.join("\n").trim().to_string();
    if !stderr_text.is_empty() {
        return Ok(stderr_text);
    }

    Ok(DONE_MARKER.to_string())
}
