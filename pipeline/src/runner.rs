//! Generation Stage Runner.
//!
//! Invokes one external generation stage as a subprocess, streams its output
//! line-by-line into the log as it arrives, and reports a terminal outcome.
//! The call blocks (awaits) until the process exits; the only cancellation
//! path is killing the running child via the request's cancellation token.

use crate::backend::{BackendSpec, PromptStyle};
use crate::error::{PipelineError, Result};
use common::RequestId;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Duration (seconds) substituted for every segment when the supplied
/// durations do not match the number of motion segments.
pub const DEFAULT_SEGMENT_DURATION: f64 = 2.0;

/// Duration assumed when no durations are supplied at all.
pub const FALLBACK_DURATION: f64 = 5.0;

/// Terminal outcome of one stage invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    Succeeded,
    Failed {
        reason: String,
        exit_code: Option<i32>,
    },
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Transient description of one external-process execution.
#[derive(Debug, Clone)]
pub struct StageInvocation {
    pub stage: String,
    pub program: PathBuf,
    pub work_dir: PathBuf,
    pub args: Vec<String>,
}

/// Splits a motion description into its comma-separated segments.
pub fn motion_segments(description: &str) -> Vec<String> {
    description.split(',').map(|s| s.trim().to_string()).collect()
}

/// Reconciles supplied durations with the parsed segment count.
///
/// No durations at all means the single fallback duration. A count mismatch
/// substitutes the fixed default for every segment and logs it; it never
/// rejects the request.
pub fn reconcile_durations(stage: &str, segments: &[String], durations: &[f64]) -> Vec<f64> {
    let durations = if durations.is_empty() {
        vec![FALLBACK_DURATION]
    } else {
        durations.to_vec()
    };

    if durations.len() != segments.len() {
        warn!(
            "[{} subprocess] {} durations supplied for {} motion segments, \
             using default duration {}s for all segments",
            stage,
            durations.len(),
            segments.len(),
            DEFAULT_SEGMENT_DURATION
        );
        return vec![DEFAULT_SEGMENT_DURATION; segments.len()];
    }

    durations
}

/// Builds the stage invocation for a backend from the motion description and
/// per-segment durations, following the backend's argument contract.
pub fn build_invocation(
    backend: &BackendSpec,
    request_id: &RequestId,
    stage_dir: &Path,
    description: &str,
    durations: &[f64],
) -> StageInvocation {
    let output_dir = stage_dir.join(format!("{}_{}", backend.name, request_id));
    let mut args = vec![backend.script.clone()];

    if let Some(checkpoint) = &backend.checkpoint {
        args.push(format!("folder={checkpoint}"));
    }

    match backend.prompt_style {
        PromptStyle::Segmented => {
            let segments = motion_segments(description);
            let durs = reconcile_durations(&backend.name, &segments, durations);
            info!(
                "[{} subprocess] using motion description: [{}]",
                backend.name,
                segments.join(", ")
            );
            info!("[{} subprocess] using durations: {:?}", backend.name, durs);

            args.push(format!("output={}", output_dir.display()));
            args.push(format!("texts=[{}]", segments.join(", ")));
            let rendered: Vec<String> = durs.iter().map(|d| d.to_string()).collect();
            args.push(format!("durs=[{}]", rendered.join(", ")));
        }
        PromptStyle::SinglePrompt => {
            // Separating segments with "then" gives better single-prompt results.
            let prompt = description.replace(',', " then ");
            info!(
                "[{} subprocess] using motion description: {}",
                backend.name, prompt
            );
            args.push(prompt);
            args.push(output_dir.display().to_string());
        }
    }

    StageInvocation {
        stage: backend.name.clone(),
        program: backend.program.clone(),
        work_dir: backend.work_dir.clone(),
        args,
    }
}

/// Dependent render step, if the backend declares one.
pub fn render_invocation(backend: &BackendSpec, stage_dir: &Path) -> Option<StageInvocation> {
    let script = backend.render_script.as_ref()?;
    Some(StageInvocation {
        stage: backend.name.clone(),
        program: backend.program.clone(),
        work_dir: backend.work_dir.clone(),
        args: vec![
            script.clone(),
            "--filedir".to_string(),
            stage_dir.display().to_string(),
            "--motion-list".to_string(),
            "1".to_string(),
        ],
    })
}

/// Runs the full stage for a backend: the primary generation step and, when
/// declared, the dependent render step. A render failure fails the stage.
pub async fn run_stage(
    backend: &BackendSpec,
    request_id: &RequestId,
    stage_dir: &Path,
    description: &str,
    durations: &[f64],
    cancel: &CancellationToken,
) -> Result<StageOutcome> {
    let invocation = build_invocation(backend, request_id, stage_dir, description, durations);
    let outcome = run_process(&invocation, cancel).await?;
    if !outcome.is_success() {
        return Ok(outcome);
    }

    if let Some(render) = render_invocation(backend, stage_dir) {
        info!("[{} subprocess] starting final rendering...", backend.name);
        let render_outcome = run_process(&render, cancel).await?;
        if !render_outcome.is_success() {
            return Ok(render_outcome);
        }
        info!("[{} subprocess] finished rendering.", backend.name);
    }

    Ok(StageOutcome::Succeeded)
}

/// Runs one invocation to completion, forwarding every output line to the
/// log as it arrives. Returns a failed outcome on non-zero exit or when the
/// cancellation token fires while the process is running.
pub async fn run_process(
    invocation: &StageInvocation,
    cancel: &CancellationToken,
) -> Result<StageOutcome> {
    info!("[{} subprocess] starting...", invocation.stage);

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .current_dir(&invocation.work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| PipelineError::Spawn {
            stage: invocation.stage.clone(),
            source: e,
        })?;

    let stdout = child.stdout.take().map(|s| BufReader::new(s).lines());
    let stderr = child.stderr.take().map(|s| BufReader::new(s).lines());

    let status = drain_and_wait(&invocation.stage, &mut child, stdout, stderr, cancel).await?;

    match status {
        None => Ok(StageOutcome::Failed {
            reason: "cancelled".to_string(),
            exit_code: None,
        }),
        Some(status) if status.success() => {
            info!("[{} subprocess] finished successfully.", invocation.stage);
            Ok(StageOutcome::Succeeded)
        }
        Some(status) => {
            let exit_code = status.code();
            warn!(
                "[{} subprocess] exited with code {:?}",
                invocation.stage, exit_code
            );
            let reason = match exit_code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            };
            Ok(StageOutcome::Failed { reason, exit_code })
        }
    }
}

async fn next_line<R>(lines: &mut Option<Lines<R>>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match lines.as_mut() {
        // A read error ends the stream like EOF; the exit status carries the failure.
        Some(lines) => lines.next_line().await.unwrap_or(None),
        None => None,
    }
}

/// Drains stdout and stderr line-by-line until both close, then reaps the
/// child. Lines are forwarded in arrival order; neither stream is reordered.
/// Returns `None` when the token fired and the child was killed.
async fn drain_and_wait(
    stage: &str,
    child: &mut Child,
    mut stdout: Option<Lines<BufReader<ChildStdout>>>,
    mut stderr: Option<Lines<BufReader<ChildStderr>>>,
    cancel: &CancellationToken,
) -> Result<Option<ExitStatus>> {
    let mut out_open = stdout.is_some();
    let mut err_open = stderr.is_some();

    while out_open || err_open {
        tokio::select! {
            line = next_line(&mut stdout), if out_open => match line {
                Some(line) => info!("[{stage}] {line}"),
                None => out_open = false,
            },
            line = next_line(&mut stderr), if err_open => match line {
                Some(line) => info!("[{stage}] {line}"),
                None => err_open = false,
            },
            _ = cancel.cancelled() => {
                warn!("[{stage} subprocess] interrupted. Terminating.");
                child.kill().await?;
                return Ok(None);
            }
        }
    }

    let status = child.wait().await?;
    Ok(Some(status))
}
